//! Release stores.
//!
//! A store owns the authoritative release list and its own write boundary.
//! Two implementations exist and one is chosen at startup:
//! - [`CachedReleaseStore`]: in-process list plus a latest-tag marker in blob storage
//! - [`SqlReleaseStore`]: active-row snapshots in SQLite

mod cached;
mod relational;

pub use cached::*;
pub use relational::*;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::Release;

#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// The current list, or `None` when the store is cold or stale and has to
    /// be refilled from the release source.
    async fn current(&self) -> Result<Option<Vec<Release>>, AppError>;

    /// Reconcile a freshly fetched list with the stored one inside the write
    /// boundary and return the result. Fetched entries win by tag; stored-only
    /// entries survive. An empty fetch writes nothing.
    async fn refresh(&self, fetched: Vec<Release>) -> Result<Vec<Release>, AppError>;

    /// Merge one release into the list under exclusive access and return the result.
    async fn merge(&self, release: Release) -> Result<Vec<Release>, AppError>;
}
