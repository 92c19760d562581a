//! REST API module.
//!
//! Every JSON response is wrapped in the `{code, status, result | errors}` envelope.

mod metadata;
mod releases;
mod webhook;

pub use metadata::*;
pub use releases::*;
pub use webhook::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub status: String,
    pub result: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(result: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            status: StatusCode::OK
                .canonical_reason()
                .unwrap_or_default()
                .to_string(),
            result,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(result: T) -> ApiResult<T> {
    Ok(ApiResponse::new(result))
}
