//! Release note orchestration: cold-read refresh, webhook merges and startup seeding.

use std::sync::Arc;

use crate::errors::AppError;
use crate::github::{fetch_with_retry, ReleaseSource};
use crate::models::{Release, ReleaseWebhookPayload};
use crate::store::ReleaseStore;

pub struct ReleaseNoteService {
    source: Arc<dyn ReleaseSource>,
    store: Arc<dyn ReleaseStore>,
    tag_link_base: String,
}

impl ReleaseNoteService {
    pub fn new(
        source: Arc<dyn ReleaseSource>,
        store: Arc<dyn ReleaseStore>,
        tag_link_base: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            tag_link_base: tag_link_base.into(),
        }
    }

    /// Serve the current list, refilling the store from the source when it is
    /// cold or stale. The fetched list is reconciled with whatever the store
    /// holds by then, so webhooks merged during the fetch survive.
    pub async fn get_releases(&self) -> Result<Vec<Release>, AppError> {
        if let Some(releases) = self.store.current().await? {
            return Ok(releases);
        }

        tracing::info!(
            "Release store ({}) is cold or stale, fetching from source",
            self.store.backend()
        );
        let fetched = fetch_with_retry(self.source.as_ref()).await?;
        self.store.refresh(fetched).await
    }

    /// Apply a release webhook. Returns `Ok(false)` for actions other than
    /// `published` and `edited`, which leave the store untouched.
    pub async fn update_releases(&self, body: &[u8]) -> Result<bool, AppError> {
        let payload = ReleaseWebhookPayload::parse(body)?;
        if !payload.is_release_update() {
            tracing::warn!(
                "Handling only published and edited actions, ignored action: {}",
                payload.action
            );
            return Ok(false);
        }

        let event = payload.release_event()?;
        let release = Release::new(
            event.tag_name,
            event.name,
            event.body,
            event.created_at,
            event.published_at,
            &self.tag_link_base,
        );
        let tag_name = release.tag_name.clone();

        let releases = self.store.merge(release).await?;
        tracing::info!(
            "Merged release {} via webhook, {} releases stored",
            tag_name,
            releases.len()
        );
        Ok(true)
    }

    /// Seed the store at startup by merging the fetched list into it. Failures
    /// are logged; the service keeps serving whatever the store holds.
    pub async fn get_releases_on_initialization(&self) {
        let releases = match fetch_with_retry(self.source.as_ref()).await {
            Ok(releases) => releases,
            Err(e) => {
                tracing::error!("Error getting releases from source on initialization: {}", e);
                return;
            }
        };

        match self.store.refresh(releases).await {
            Ok(stored) => tracing::info!(
                "Seeded {} store, {} releases stored",
                self.store.backend(),
                stored.len()
            ),
            Err(e) => tracing::error!("Error seeding release store on initialization: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    use crate::blob::FilesystemBlobStorage;
    use crate::db::{init_database, ReleaseNoteRepository};
    use crate::github::{SourceError, MAX_FETCH_ATTEMPTS};
    use crate::store::{CachedReleaseStore, SqlReleaseStore};

    const TAG_LINK: &str = "https://github.com/acme/app/releases/tag";

    /// Serves a fixed list, or fails every call when `releases` is `None`.
    struct StaticSource {
        releases: Mutex<Option<Vec<Release>>>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        fn new(releases: Option<Vec<Release>>) -> Arc<Self> {
            Arc::new(Self {
                releases: Mutex::new(releases),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReleaseSource for StaticSource {
        async fn list_releases(&self) -> Result<Vec<Release>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.releases
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| SourceError::Status(500, "boom".to_string()))
        }
    }

    /// Blocks every listing until `gate` is opened; `entered` fires once the
    /// call is in flight.
    struct GatedSource {
        releases: Vec<Release>,
        entered: Notify,
        gate: Notify,
    }

    impl GatedSource {
        fn new(releases: Vec<Release>) -> Arc<Self> {
            Arc::new(Self {
                releases,
                entered: Notify::new(),
                gate: Notify::new(),
            })
        }
    }

    #[async_trait]
    impl ReleaseSource for GatedSource {
        async fn list_releases(&self) -> Result<Vec<Release>, SourceError> {
            self.entered.notify_one();
            self.gate.notified().await;
            Ok(self.releases.clone())
        }
    }

    fn release(tag: &str) -> Release {
        Release::new(tag.to_string(), tag.to_string(), String::new(), None, None, TAG_LINK)
    }

    fn webhook(action: &str, tag: &str, name: &str, body: &str) -> Vec<u8> {
        json!({
            "action": action,
            "release": {
                "name": name,
                "tag_name": tag,
                "created_at": "2024-03-01T10:20:30Z",
                "published_at": "2024-03-01T10:25:00Z",
                "body": body
            }
        })
        .to_string()
        .into_bytes()
    }

    async fn sql_service(
        source: Arc<dyn ReleaseSource>,
    ) -> (ReleaseNoteService, Arc<SqlReleaseStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("test.sqlite")).await.unwrap();
        let store = Arc::new(SqlReleaseStore::new(ReleaseNoteRepository::new(pool)));
        let service = ReleaseNoteService::new(source, store.clone(), TAG_LINK);
        (service, store, dir)
    }

    fn cached_service(source: Arc<dyn ReleaseSource>, dir: &TempDir) -> ReleaseNoteService {
        let blob = Arc::new(FilesystemBlobStorage::new(dir.path()));
        let store = Arc::new(CachedReleaseStore::new(blob));
        ReleaseNoteService::new(source, store, TAG_LINK)
    }

    #[tokio::test]
    async fn test_cold_read_fetches_and_persists() {
        let source = StaticSource::new(Some(vec![release("v2"), release("v1")]));
        let (service, store, _dir) = sql_service(source.clone()).await;

        let releases = service.get_releases().await.unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(source.calls(), 1);

        // Served from the active row afterwards
        service.get_releases().await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(store.repository().count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cold_read_surfaces_exhausted_retries() {
        let source = StaticSource::new(None);
        let (service, _store, _dir) = sql_service(source.clone()).await;

        let err = service.get_releases().await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(source.calls(), MAX_FETCH_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_same_tag_twice_keeps_one_entry_with_latest_fields() {
        let source = StaticSource::new(Some(Vec::new()));
        let (service, _store, _dir) = sql_service(source).await;

        assert!(service
            .update_releases(&webhook("published", "v1.0.0", "first", "body one"))
            .await
            .unwrap());
        assert!(service
            .update_releases(&webhook("edited", "v1.0.0", "second", "body two"))
            .await
            .unwrap());

        let releases = service.get_releases().await.unwrap();
        let matching: Vec<_> = releases.iter().filter(|r| r.tag_name == "v1.0.0").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].release_name, "second");
        assert_eq!(matching[0].body, "body two");
    }

    #[tokio::test]
    async fn test_ignored_action_leaves_store_unchanged() {
        let source = StaticSource::new(Some(vec![release("v1")]));
        let (service, store, _dir) = sql_service(source).await;
        service.get_releases().await.unwrap();

        let updated = service
            .update_releases(&webhook("deleted", "v1", "gone", ""))
            .await
            .unwrap();

        assert!(!updated);
        assert_eq!(store.repository().count_all().await.unwrap(), 1);
        let releases = service.get_releases().await.unwrap();
        assert_eq!(releases[0].release_name, "v1");
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected_without_writing() {
        let source = StaticSource::new(Some(Vec::new()));
        let (service, store, _dir) = sql_service(source).await;

        let err = service
            .update_releases(br#"{"action":"published","release":{"name":"x"}}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service.update_releases(b"not json").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(store.repository().count_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_webhook_extracts_prerequisites() {
        let source = StaticSource::new(Some(Vec::new()));
        let (service, _store, _dir) = sql_service(source).await;

        let body = "intro <!--upgrade-prerequisites-required-->do X<!--upgrade-prerequisites-required-->outro";
        service
            .update_releases(&webhook("published", "v3", "v3", body))
            .await
            .unwrap();

        let releases = service.get_releases().await.unwrap();
        assert!(releases[0].prerequisite);
        assert_eq!(releases[0].prerequisite_message, "do X");
        assert_eq!(releases[0].tag_link, format!("{TAG_LINK}/v3"));
    }

    #[tokio::test]
    async fn test_initialization_failure_is_swallowed() {
        let source = StaticSource::new(None);
        let dir = TempDir::new().unwrap();
        let service = cached_service(source.clone(), &dir);

        service.get_releases_on_initialization().await;
        assert_eq!(source.calls(), MAX_FETCH_ATTEMPTS);

        // Webhooks still work on an unseeded store.
        assert!(service
            .update_releases(&webhook("published", "v1", "v1", ""))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_cached_store_refetches_when_marker_moves() {
        let source = StaticSource::new(Some(vec![release("v1")]));
        let dir = TempDir::new().unwrap();
        let service = cached_service(source.clone(), &dir);

        service.get_releases_on_initialization().await;
        service.get_releases().await.unwrap();
        assert_eq!(source.calls(), 1);

        // Another replica saw v2 published.
        *source.releases.lock().unwrap() = Some(vec![release("v2"), release("v1")]);
        std::fs::write(dir.path().join("latest.txt"), "v2").unwrap();

        let releases = service.get_releases().await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(releases[0].tag_name, "v2");
    }

    fn stored_tags(releases: &[Release]) -> Vec<&str> {
        releases.iter().map(|r| r.tag_name.as_str()).collect()
    }

    async fn webhook_during_cold_fetch(
        service: Arc<ReleaseNoteService>,
        source: Arc<GatedSource>,
    ) -> Vec<Release> {
        let reader = tokio::spawn({
            let service = service.clone();
            async move { service.get_releases().await }
        });

        source.entered.notified().await;
        assert!(service
            .update_releases(&webhook("published", "v2", "v2", ""))
            .await
            .unwrap());
        source.gate.notify_one();

        reader.await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_webhook_merged_during_cold_fetch_survives_sql() {
        let source = GatedSource::new(vec![release("v1")]);
        let (service, store, _dir) = sql_service(source.clone()).await;

        let served = webhook_during_cold_fetch(Arc::new(service), source).await;
        assert_eq!(stored_tags(&served), vec!["v2", "v1"]);

        let stored = store.current().await.unwrap().unwrap();
        assert_eq!(stored_tags(&stored), vec!["v2", "v1"]);
        assert_eq!(store.repository().count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_webhook_merged_during_cold_fetch_survives_cached() {
        let source = GatedSource::new(vec![release("v1")]);
        let dir = TempDir::new().unwrap();
        let service = Arc::new(cached_service(source.clone(), &dir));

        let served = webhook_during_cold_fetch(service.clone(), source).await;
        assert_eq!(stored_tags(&served), vec!["v2", "v1"]);

        // Marker follows the newest merged tag, so the cache stays fresh.
        let releases = service.get_releases().await.unwrap();
        assert_eq!(stored_tags(&releases), vec!["v2", "v1"]);
    }

    #[tokio::test]
    async fn test_initialization_merges_into_stored_releases() {
        let source = StaticSource::new(Some(vec![release("v1")]));
        let (service, store, _dir) = sql_service(source.clone()).await;

        service.get_releases().await.unwrap();
        service
            .update_releases(&webhook("published", "v0-hotfix-old", "hotfix", ""))
            .await
            .unwrap();

        // Restart: GitHub now reports a renamed v1 but no longer lists the hotfix.
        let mut renamed = release("v1");
        renamed.release_name = "v1 (final)".to_string();
        *source.releases.lock().unwrap() = Some(vec![renamed]);
        service.get_releases_on_initialization().await;

        let stored = store.current().await.unwrap().unwrap();
        assert_eq!(stored_tags(&stored), vec!["v0-hotfix-old", "v1"]);
        assert_eq!(stored[1].release_name, "v1 (final)");
        assert_eq!(store.repository().count_active().await.unwrap(), 1);
    }
}
