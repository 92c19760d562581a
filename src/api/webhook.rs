//! Release webhook endpoint.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::AppState;

/// Only release events are mirrored.
pub const EVENT_TYPE_RELEASE: &str = "release";

/// POST /webhook/:secret - Receive a release event.
pub async fn release_webhook(
    State(state): State<AppState>,
    Path(secret): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<bool> {
    tracing::info!("Release webhook received");

    if !state.validator.validate(&headers, Some(secret.as_str()), &body) {
        tracing::error!("Webhook signature mismatch");
        return Err(AppError::Unauthorized("Signature mismatch".to_string()));
    }

    let event_type = headers
        .get(state.config.github.event_type_header.as_str())
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if event_type != EVENT_TYPE_RELEASE {
        tracing::error!("Event type not supported: {:?}", event_type);
        return Err(AppError::BadRequest(format!(
            "Unsupported event type: {:?}",
            event_type
        )));
    }

    let updated = state.releases.update_releases(&body).await?;
    success(updated)
}
