use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::workflow::{CreateWorkflow, UpdateWorkflow, Workflow, WorkflowWithStatuses};
use utils_core::response::ApiResponse;

use crate::{
    AppState, error::ApiError, http::identity::AuthUser, middleware::load_workflow_middleware,
};

pub async fn get_workflows(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<ResponseJson<ApiResponse<Vec<Workflow>>>, ApiError> {
    let workflows = Workflow::find_all(&state.db().conn, user_id).await?;
    Ok(ResponseJson(ApiResponse::success(workflows)))
}

pub async fn get_workflow(
    Extension(workflow): Extension<Workflow>,
) -> Result<ResponseJson<ApiResponse<Workflow>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(workflow)))
}

pub async fn get_workflow_statuses(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<Workflow>,
) -> Result<ResponseJson<ApiResponse<WorkflowWithStatuses>>, ApiError> {
    let resolved = Workflow::with_statuses(&state.db().conn, user_id, existing.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Workflow not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(resolved)))
}

pub async fn create_workflow(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<CreateWorkflow>,
) -> Result<ResponseJson<ApiResponse<Workflow>>, ApiError> {
    let workflow = Workflow::create(&state.db().conn, user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(workflow)))
}

pub async fn update_workflow(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<Workflow>,
    Json(payload): Json<UpdateWorkflow>,
) -> Result<ResponseJson<ApiResponse<Workflow>>, ApiError> {
    let workflow = Workflow::update(&state.db().conn, user_id, existing.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(workflow)))
}

pub async fn delete_workflow(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Extension(existing): Extension<Workflow>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Workflow::delete(&state.db().conn, user_id, existing.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let workflow_id_router = Router::new()
        .route(
            "/",
            get(get_workflow).put(update_workflow).delete(delete_workflow),
        )
        .route("/statuses", get(get_workflow_statuses))
        .layer(from_fn_with_state(state.clone(), load_workflow_middleware));

    let workflows_router = Router::new()
        .route("/", get(get_workflows).post(create_workflow))
        .nest("/{id}", workflow_id_router);

    Router::new().nest("/workflows", workflows_router)
}
