use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::task::{CreateTask, Task, TaskFilter, TaskPage, TaskStats, UpdateTask};
use utils_core::response::ApiResponse;

use crate::{
    AppState, error::ApiError, http::identity::AuthUser, middleware::load_task_middleware,
};

pub async fn get_tasks(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(filter): Query<TaskFilter>,
) -> Result<ResponseJson<ApiResponse<TaskPage>>, ApiError> {
    let page = Task::find_for_user(&state.db().conn, user_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    tracing::debug!("Creating task '{}'", payload.title);
    let task = Task::create(&state.db().conn, user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<Task>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::update(&state.db().conn, user_id, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Task::delete(&state.db().conn, user_id, existing.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_task_stats(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<TaskStats>>, ApiError> {
    let stats = Task::stats(&state.db().conn, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let tasks_router = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .route("/stats", get(get_task_stats))
        .nest("/{id}", task_id_router);

    Router::new().nest("/tasks", tasks_router)
}
