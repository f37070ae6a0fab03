use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    category::{Category, CreateCategory, UpdateCategory},
    defaults,
};
use utils_core::response::ApiResponse;

use crate::{
    AppState, error::ApiError, http::identity::AuthUser, middleware::load_category_middleware,
};

pub async fn get_categories(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = Category::find_all(&state.db().conn, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(categories)))
}

pub async fn get_category(
    Extension(category): Extension<Category>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(category)))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    let category = Category::create(&state.db().conn, user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<Category>,
    Json(payload): Json<UpdateCategory>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    let category = Category::update(&state.db().conn, user_id, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<Category>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Category::delete(&state.db().conn, user_id, existing.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn initialize_default_categories(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = defaults::initialize_default_categories(&state.db().conn, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(categories)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let category_id_router = Router::new()
        .route(
            "/",
            get(get_category).put(update_category).delete(delete_category),
        )
        .layer(from_fn_with_state(state.clone(), load_category_middleware));

    let categories_router = Router::new()
        .route("/", get(get_categories).post(create_category))
        .route("/defaults", post(initialize_default_categories))
        .nest("/{id}", category_id_router);

    Router::new().nest("/categories", categories_router)
}
