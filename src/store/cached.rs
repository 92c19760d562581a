//! In-process release cache validated against a latest-tag marker in blob storage.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use super::ReleaseStore;
use crate::blob::BlobStorage;
use crate::errors::AppError;
use crate::models::{merge_release, reconcile_releases, Release};

/// Object holding the newest tag name.
pub const LATEST_TAG_KEY: &str = "latest.txt";

pub struct CachedReleaseStore {
    releases: RwLock<Arc<Vec<Release>>>,
    write_lock: Mutex<()>,
    blob: Arc<dyn BlobStorage>,
}

impl CachedReleaseStore {
    pub fn new(blob: Arc<dyn BlobStorage>) -> Self {
        Self {
            releases: RwLock::new(Arc::new(Vec::new())),
            write_lock: Mutex::new(()),
            blob,
        }
    }

    async fn latest_tag(&self) -> Result<Option<String>, AppError> {
        let marker = self.blob.download(LATEST_TAG_KEY).await?;
        Ok(marker.map(|tag| tag.replace(['\n', '\r'], "")))
    }

    async fn snapshot(&self) -> Arc<Vec<Release>> {
        self.releases.read().await.clone()
    }

    /// Publish `releases` as the new list. The marker goes first so a failed
    /// upload leaves both the marker and the list as they were.
    async fn publish(&self, releases: Vec<Release>) -> Result<(), AppError> {
        if let Some(latest) = releases.first() {
            self.blob.upload(LATEST_TAG_KEY, &latest.tag_name).await?;
        }
        *self.releases.write().await = Arc::new(releases);
        Ok(())
    }
}

#[async_trait]
impl ReleaseStore for CachedReleaseStore {
    fn backend(&self) -> &'static str {
        "cache"
    }

    async fn current(&self) -> Result<Option<Vec<Release>>, AppError> {
        let latest_tag = self.latest_tag().await?;
        let cached = self.snapshot().await;

        match (cached.first(), latest_tag) {
            (Some(newest), Some(tag)) if newest.tag_name == tag => Ok(Some(cached.to_vec())),
            (newest, tag) => {
                tracing::debug!(
                    "Release cache stale (cached: {:?}, marker: {:?})",
                    newest.map(|r| r.tag_name.as_str()),
                    tag
                );
                Ok(None)
            }
        }
    }

    async fn refresh(&self, fetched: Vec<Release>) -> Result<Vec<Release>, AppError> {
        let _guard = self.write_lock.lock().await;

        let stored = self.snapshot().await.to_vec();
        if fetched.is_empty() {
            return Ok(stored);
        }
        let releases = reconcile_releases(stored, fetched);
        self.publish(releases.clone()).await?;
        Ok(releases)
    }

    async fn merge(&self, release: Release) -> Result<Vec<Release>, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut releases = self.snapshot().await.to_vec();
        merge_release(&mut releases, release);
        self.publish(releases.clone()).await?;
        Ok(releases)
    }
}
