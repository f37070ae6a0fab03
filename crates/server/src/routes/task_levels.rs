use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    defaults,
    task_level::{CreateTaskLevel, TaskLevel, UpdateTaskLevel},
};
use utils_core::response::ApiResponse;

use crate::{
    AppState, error::ApiError, http::identity::AuthUser, middleware::load_task_level_middleware,
};

pub async fn get_task_levels(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskLevel>>>, ApiError> {
    let levels = TaskLevel::find_all(&state.db().conn, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(levels)))
}

pub async fn get_task_level(
    Extension(level): Extension<TaskLevel>,
) -> Result<ResponseJson<ApiResponse<TaskLevel>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(level)))
}

pub async fn create_task_level(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateTaskLevel>,
) -> Result<ResponseJson<ApiResponse<TaskLevel>>, ApiError> {
    let level = TaskLevel::create(&state.db().conn, user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(level)))
}

pub async fn update_task_level(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<TaskLevel>,
    Json(payload): Json<UpdateTaskLevel>,
) -> Result<ResponseJson<ApiResponse<TaskLevel>>, ApiError> {
    let level = TaskLevel::update(&state.db().conn, user_id, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(level)))
}

pub async fn delete_task_level(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<TaskLevel>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    TaskLevel::delete(&state.db().conn, user_id, existing.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn initialize_default_levels(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskLevel>>>, ApiError> {
    let levels = defaults::initialize_default_levels(&state.db().conn, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(levels)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let level_id_router = Router::new()
        .route(
            "/",
            get(get_task_level)
                .put(update_task_level)
                .delete(delete_task_level),
        )
        .layer(from_fn_with_state(state.clone(), load_task_level_middleware));

    let levels_router = Router::new()
        .route("/", get(get_task_levels).post(create_task_level))
        .route("/defaults", post(initialize_default_levels))
        .nest("/{id}", level_id_router);

    Router::new().nest("/task-levels", levels_router)
}
