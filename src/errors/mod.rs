//! Error handling module for the release notes backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Webhook secret did not validate
    Unauthorized(String),
    /// Payload parsed but carried missing or mistyped fields
    Validation(String),
    /// Bad request
    BadRequest(String),
    /// Release source could not be reached after retrying
    Upstream(String),
    /// Database error
    Database(String),
    /// Blob storage error
    Storage(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::Upstream(_) => codes::UPSTREAM_ERROR,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Storage(_) => codes::STORAGE_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Validation(msg)
            | AppError::BadRequest(msg)
            | AppError::Upstream(msg)
            | AppError::Database(msg)
            | AppError::Storage(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("Blob storage I/O error: {:?}", err);
        AppError::Storage(format!("Blob storage I/O error: {}", err))
    }
}

impl From<s3::error::S3Error> for AppError {
    fn from(err: s3::error::S3Error) -> Self {
        tracing::error!("S3 error: {:?}", err);
        AppError::Storage(format!("S3 error: {}", err))
    }
}

/// A single entry of the `errors` array in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorDetails {
    pub code: String,
    pub internal_message: String,
    pub user_message: String,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub errors: Vec<ApiErrorDetails>,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let status = error.status_code();
        Self {
            code: status.as_u16(),
            status: status.canonical_reason().unwrap_or_default().to_string(),
            errors: vec![ApiErrorDetails {
                code: error.error_code().to_string(),
                internal_message: error.to_string(),
                user_message: error.message(),
            }],
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_for_validation_error() {
        let err = AppError::Validation("release.tag_name is missing".to_string());
        let body = ErrorResponse::new(&err);

        assert_eq!(body.code, 400);
        assert_eq!(body.status, "Bad Request");
        assert_eq!(body.errors.len(), 1);
        assert_eq!(body.errors[0].code, codes::VALIDATION_ERROR);
        assert_eq!(body.errors[0].user_message, "release.tag_name is missing");
    }

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let err = AppError::Upstream("exhausted retries".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "UPSTREAM_ERROR: exhausted retries");
    }
}
