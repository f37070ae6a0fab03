use axum::{Router, middleware::from_fn, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{AppState, routes};

pub mod identity;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::categories::router(&state))
        .merge(routes::task_statuses::router(&state))
        .merge(routes::task_levels::router(&state))
        .merge(routes::workflows::router(&state))
        .merge(routes::tasks::router(&state))
        .layer(from_fn(identity::require_user_identity));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
