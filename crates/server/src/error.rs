use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{
    DbErr,
    models::{guard::TaxonomyError, task::TaskError},
};
use thiserror::Error;
use utils_core::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Taxonomy(err) => match err {
                TaxonomyError::DuplicateName { .. }
                | TaxonomyError::DuplicateRank { .. }
                | TaxonomyError::ReferencedEntry { .. }
                | TaxonomyError::AlreadyInitialized(_) => (StatusCode::CONFLICT, "TaxonomyError"),
                TaxonomyError::NotFound(_) => (StatusCode::NOT_FOUND, "TaxonomyError"),
                TaxonomyError::ProtectedDefault(_) => (StatusCode::FORBIDDEN, "TaxonomyError"),
                TaxonomyError::Validation(_) => (StatusCode::BAD_REQUEST, "TaxonomyError"),
                TaxonomyError::Database(db_err) => match db_err {
                    DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
                },
            },
            ApiError::Task(err) => match err {
                TaskError::NotFound => (StatusCode::NOT_FOUND, "TaskError"),
                TaskError::Validation(_) => (StatusCode::BAD_REQUEST, "TaskError"),
                TaskError::Database(db_err) => match db_err {
                    DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
                },
            },
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IoError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        };

        let error_message = match &self {
            ApiError::Taxonomy(err) if !status_code.is_server_error() => err.to_string(),
            ApiError::Task(err) if !status_code.is_server_error() => err.to_string(),
            ApiError::Unauthorized => {
                "Unauthorized. Provide a valid X-User-Id header.".to_string()
            }
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::Internal(msg) => msg.clone(),
            ApiError::BadRequest(msg) => msg.clone(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::guard::TaxonomyKind;

    #[test]
    fn api_error_maps_to_expected_http_statuses() {
        assert_eq!(
            ApiError::BadRequest("bad".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("missing".to_string())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Internal("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn taxonomy_errors_map_to_expected_http_statuses() {
        assert_eq!(
            ApiError::from(TaxonomyError::DuplicateName {
                kind: TaxonomyKind::Category,
                name: "Work".to_string(),
            })
            .into_response()
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TaxonomyError::DuplicateRank { level: 3 })
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TaxonomyError::ProtectedDefault(TaxonomyKind::TaskStatus))
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(TaxonomyError::ReferencedEntry {
                kind: TaxonomyKind::Category,
                count: 2,
            })
            .into_response()
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TaxonomyError::AlreadyInitialized(TaxonomyKind::TaskLevel))
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TaxonomyError::NotFound(TaxonomyKind::Workflow))
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TaxonomyError::Validation("bad".to_string()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn task_errors_map_to_expected_http_statuses() {
        assert_eq!(
            ApiError::from(TaskError::NotFound).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TaskError::Validation("bad".to_string()))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
