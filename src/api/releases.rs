//! Release API endpoints.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{paginate, Release};
use crate::AppState;

/// Pagination query parameters, kept as strings so bad numbers get our envelope.
#[derive(Debug, Deserialize)]
pub struct ReleasesQuery {
    #[serde(default)]
    pub offset: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

fn parse_param(name: &str, value: Option<&str>) -> Result<usize, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::BadRequest(format!("invalid {}: {}", name, raw))),
    }
}

/// GET /releases - Newest-first releases, optionally paginated.
pub async fn get_releases(
    State(state): State<AppState>,
    Query(query): Query<ReleasesQuery>,
) -> ApiResult<Vec<Release>> {
    let offset = parse_param("offset", query.offset.as_deref())?;
    let size = parse_param("size", query.size.as_deref())?;

    let releases = state.releases.get_releases().await?;
    success(paginate(&releases, offset, size))
}
