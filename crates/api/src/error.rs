//! API error types
//!
//! Structured error responses with flat `{"error": ...}` bodies, the
//! shape existing dashboard clients parse. Auth failures deliberately
//! carry no detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use cityflow_storage::StorageError;

/// Result type for API handlers
pub type Result<T> = std::result::Result<T, ApiError>;

/// API errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request parameters
    #[error("{0}")]
    BadRequest(String),

    /// Login/registration credentials rejected
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token missing, malformed, or expired
    #[error("invalid or expired token")]
    InvalidToken,

    /// WebSocket upgrade without a token parameter
    #[error("missing token query parameter")]
    MissingToken,

    /// Registration with an email that already exists
    #[error("email already registered")]
    EmailTaken,

    /// Internal failure; the message stays opaque
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::InvalidToken | Self::MissingToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateEmail => Self::EmailTaken,
            StorageError::Database(err) => {
                tracing::error!(error = %err, "database query failed");
                Self::Internal("database query failed")
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::InvalidToken.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::EmailTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_email_maps_to_conflict() {
        let err: ApiError = StorageError::DuplicateEmail.into();
        assert!(matches!(err, ApiError::EmailTaken));
    }

    #[test]
    fn test_auth_errors_carry_no_detail() {
        assert_eq!(ApiError::InvalidCredentials.to_string(), "invalid credentials");
        assert_eq!(
            ApiError::InvalidToken.to_string(),
            "invalid or expired token"
        );
    }
}
