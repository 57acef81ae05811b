//! Error types for the API layer.
//!
//! The full failure taxonomy surfaces to HTTP clients as a status code plus
//! a JSON body `{ "error": <class>, "message": <human readable> }`. No
//! retries anywhere; multi-write operations are atomic, so partial success
//! is never reported as success.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use givehub_core::CoreError;
use givehub_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidState(_) => StatusCode::CONFLICT,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn class(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::InvalidState(_) => "invalid_state",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Internal(_) | ApiError::Unavailable(_)) {
            error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.class(),
            "message": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CoreError::Unauthenticated => ApiError::Unauthenticated(err.to_string()),
            CoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            CoreError::InvalidState { .. } => ApiError::InvalidState(err.to_string()),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            CoreError::Validation(v) => ApiError::Validation(v.to_string()),
            CoreError::Unavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}

impl From<givehub_core::ValidationError> for ApiError {
    fn from(err: givehub_core::ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::Conflict(err.to_string()),
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                ApiError::Unavailable(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::Unauthenticated.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err: ApiError = CoreError::Forbidden("nope".into()).into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err: ApiError = CoreError::invalid_state("Donation", "pending", "request").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.class(), "invalid_state");
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Item", "i-1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::duplicate("email", "a@b.com").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
