//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quiz_core::{ImportError, QuizError};
use serde::Serialize;
use thiserror::Error;

use crate::services::cache::CacheError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::InvalidRequest(message) => ApiError::BadRequest(message),
            QuizError::ItemLookupFailure { id } => {
                tracing::error!(item_id = id, "vocabulary item vanished during quiz generation");
                ApiError::Internal(format!("vocabulary item {} could not be resolved", id))
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::Parse(err.to_string())
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for ApiError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        ApiError::Migration(err.to_string())
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Parse(_) => (StatusCode::BAD_REQUEST, "parse_error"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_status() {
        let error = ApiError::Unauthorized("invalid token".to_string());
        assert_eq!(error.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_status() {
        let error = ApiError::Forbidden("superuser only".to_string());
        assert_eq!(error.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_conflict_status() {
        let error = ApiError::Conflict("user name taken".to_string());
        assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_parse_error_status() {
        let error = ApiError::Parse("line 3".to_string());
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_migration_error_status() {
        let error = ApiError::Migration("checksum mismatch".to_string());
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let error: ApiError = QuizError::InvalidRequest("pool too small".to_string()).into();
        assert!(matches!(error, ApiError::BadRequest(_)));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_lookup_failure_maps_to_internal() {
        let error: ApiError = QuizError::ItemLookupFailure { id: 42 }.into();
        assert_eq!(
            error.to_string(),
            "Internal error: vocabulary item 42 could not be resolved"
        );
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_import_error_maps_to_parse() {
        let error: ApiError = ImportError::MissingGrade { line: 7 }.into();
        assert!(matches!(error, ApiError::Parse(_)));
    }

    #[test]
    fn test_error_display_not_found() {
        let error = ApiError::NotFound("Quiz 123".to_string());
        assert_eq!(error.to_string(), "Not found: Quiz 123");
    }

    #[test]
    fn test_error_display_bad_request() {
        let error = ApiError::BadRequest("missing field".to_string());
        assert_eq!(error.to_string(), "Bad request: missing field");
    }
}
