//! Release source backed by the GitHub releases API.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, StatusCode};
use serde::Deserialize;

use crate::config::GithubConfig;
use crate::errors::AppError;
use crate::models::Release;

/// Number of attempts made by [`fetch_with_retry`] before giving up.
pub const MAX_FETCH_ATTEMPTS: usize = 3;

const USER_AGENT: &str = concat!("release-notes-backend/", env!("CARGO_PKG_VERSION"));

/// Why a single listing call failed.
#[derive(Debug)]
pub enum SourceError {
    /// The repository (or its releases) does not exist upstream
    NotFound(String),
    /// Any other non-success HTTP status
    Status(u16, String),
    /// Connection-level failure
    Transport(String),
    /// Response body was not the expected JSON
    Decode(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound(msg) => write!(f, "not found: {}", msg),
            SourceError::Status(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            SourceError::Transport(msg) => write!(f, "transport error: {}", msg),
            SourceError::Decode(msg) => write!(f, "decode error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Anything that can list the releases of the tracked repository, newest first.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn list_releases(&self) -> Result<Vec<Release>, SourceError>;
}

/// Call the source up to [`MAX_FETCH_ATTEMPTS`] times, stopping at the first success.
///
/// A `NotFound` answer means the repository has no releases yet: it yields an
/// empty list straight away instead of burning the remaining attempts.
pub async fn fetch_with_retry(source: &dyn ReleaseSource) -> Result<Vec<Release>, AppError> {
    for attempt in 1..=MAX_FETCH_ATTEMPTS {
        match source.list_releases().await {
            Ok(releases) => {
                tracing::debug!("Fetched {} releases on attempt {}", releases.len(), attempt);
                return Ok(releases);
            }
            Err(SourceError::NotFound(msg)) => {
                tracing::warn!("No releases found upstream, treating as empty: {}", msg);
                return Ok(Vec::new());
            }
            Err(e) => {
                tracing::warn!(
                    "Fetching releases failed (attempt {}/{}): {}",
                    attempt,
                    MAX_FETCH_ATTEMPTS,
                    e
                );
            }
        }
    }

    Err(AppError::Upstream(format!(
        "Failed to fetch releases, attempted {} times",
        MAX_FETCH_ATTEMPTS
    )))
}

/// Raw release item as returned by `GET /repos/{org}/{repo}/releases`.
#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: Option<String>,
    name: Option<String>,
    body: Option<String>,
    created_at: Option<DateTime<Utc>>,
    published_at: Option<DateTime<Utc>>,
}

/// GitHub REST client for a single repository's release feed.
pub struct GithubReleaseSource {
    client: reqwest::Client,
    api_url: String,
    org: String,
    repo: String,
    token: Option<String>,
    tag_link_base: String,
}

impl GithubReleaseSource {
    pub fn new(config: &GithubConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            org: config.org.clone(),
            repo: config.repo.clone(),
            token: config.token.clone(),
            tag_link_base: config.tag_link_base.clone(),
        }
    }

    fn releases_url(&self) -> String {
        format!("{}/repos/{}/{}/releases", self.api_url, self.org, self.repo)
    }
}

#[async_trait]
impl ReleaseSource for GithubReleaseSource {
    // TODO: follow the `Link: rel="next"` header to read pages beyond the first.
    async fn list_releases(&self) -> Result<Vec<Release>, SourceError> {
        let url = self.releases_url();

        let mut request = self
            .client
            .get(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SourceError::Status(status.as_u16(), text));
        }

        let items: Vec<Option<GithubRelease>> = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        let releases = items
            .into_iter()
            .filter_map(|item| {
                if item.is_none() {
                    tracing::warn!("Skipping empty release item from {}", url);
                }
                item
            })
            .map(|item| {
                Release::new(
                    item.tag_name.unwrap_or_default(),
                    item.name.unwrap_or_default(),
                    item.body.unwrap_or_default(),
                    item.created_at,
                    item.published_at,
                    &self.tag_link_base,
                )
            })
            .collect();

        Ok(releases)
    }
}
