use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    defaults,
    task_status::{CreateTaskStatus, ReorderEntry, TaskStatus, UpdateTaskStatus},
};
use serde::Deserialize;
use ts_rs::TS;
use utils_core::response::ApiResponse;

use crate::{
    AppState, error::ApiError, http::identity::AuthUser, middleware::load_task_status_middleware,
};

#[derive(Debug, Deserialize, TS)]
pub struct ReorderRequest {
    pub statuses: Vec<ReorderEntry>,
}

pub async fn get_task_statuses(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskStatus>>>, ApiError> {
    let statuses = TaskStatus::find_all(&state.db().conn, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(statuses)))
}

pub async fn get_task_status(
    Extension(status): Extension<TaskStatus>,
) -> Result<ResponseJson<ApiResponse<TaskStatus>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(status)))
}

pub async fn create_task_status(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateTaskStatus>,
) -> Result<ResponseJson<ApiResponse<TaskStatus>>, ApiError> {
    let status = TaskStatus::create(&state.db().conn, user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(status)))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<TaskStatus>,
    Json(payload): Json<UpdateTaskStatus>,
) -> Result<ResponseJson<ApiResponse<TaskStatus>>, ApiError> {
    let status = TaskStatus::update(&state.db().conn, user_id, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(status)))
}

pub async fn delete_task_status(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<TaskStatus>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    TaskStatus::delete(&state.db().conn, user_id, existing.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Applies the given ordering and returns the refreshed list.
pub async fn reorder_task_statuses(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<ReorderRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskStatus>>>, ApiError> {
    let updated = TaskStatus::reorder(&state.db().conn, user_id, &payload.statuses).await?;
    tracing::debug!(updated, "Reordered task statuses");
    let statuses = TaskStatus::find_all(&state.db().conn, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(statuses)))
}

pub async fn initialize_default_statuses(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskStatus>>>, ApiError> {
    let statuses = defaults::initialize_default_statuses(&state.db().conn, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(statuses)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let status_id_router = Router::new()
        .route(
            "/",
            get(get_task_status)
                .put(update_task_status)
                .delete(delete_task_status),
        )
        .layer(from_fn_with_state(
            state.clone(),
            load_task_status_middleware,
        ));

    let statuses_router = Router::new()
        .route("/", get(get_task_statuses).post(create_task_status))
        .route("/defaults", post(initialize_default_statuses))
        .route("/reorder", put(reorder_task_statuses))
        .nest("/{id}", status_id_router);

    Router::new().nest("/task-statuses", statuses_router)
}
