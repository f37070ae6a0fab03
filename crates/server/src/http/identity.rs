use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the caller's identity. Authentication happens upstream;
/// this layer only requires the header to be present and well-formed.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

pub async fn require_user_identity(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or(ApiError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}
