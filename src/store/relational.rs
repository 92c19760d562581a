//! Release store persisted as active-row snapshots in SQLite.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::ReleaseStore;
use crate::db::ReleaseNoteRepository;
use crate::errors::AppError;
use crate::models::{merge_release, reconcile_releases, Release};

pub struct SqlReleaseStore {
    repo: ReleaseNoteRepository,
    // Serializes read-modify-write transactions within this process.
    write_lock: Mutex<()>,
}

impl SqlReleaseStore {
    pub fn new(repo: ReleaseNoteRepository) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub fn repository(&self) -> &ReleaseNoteRepository {
        &self.repo
    }
}

#[async_trait]
impl ReleaseStore for SqlReleaseStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn current(&self) -> Result<Option<Vec<Release>>, AppError> {
        let active = self.repo.find_active().await?;
        Ok(active
            .map(|record| record.release_note)
            .filter(|releases| !releases.is_empty()))
    }

    async fn refresh(&self, fetched: Vec<Release>) -> Result<Vec<Release>, AppError> {
        let _guard = self.write_lock.lock().await;

        if fetched.is_empty() {
            let active = self.repo.find_active().await?;
            return Ok(active.map(|record| record.release_note).unwrap_or_default());
        }

        let record = self
            .repo
            .update_active(|stored| reconcile_releases(stored, fetched))
            .await?;
        tracing::info!(
            "Stored release note snapshot {} with {} releases",
            record.id,
            record.release_note.len()
        );
        Ok(record.release_note)
    }

    async fn merge(&self, release: Release) -> Result<Vec<Release>, AppError> {
        let _guard = self.write_lock.lock().await;
        let record = self
            .repo
            .update_active(|mut releases| {
                merge_release(&mut releases, release);
                releases
            })
            .await?;
        Ok(record.release_note)
    }
}
