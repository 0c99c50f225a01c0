//! The catalog as currently served.
//!
//! [`LiveCatalog`] owns the latest [`CatalogSnapshot`] and routes every write
//! through the [`CatalogStore`]. Successful writes are applied locally right
//! away; store notifications trigger a full re-list that replaces whatever
//! is held, so a local change can be overwritten by a re-list that raced it.

use std::sync::{Arc, Weak};

use tokio::sync::{Notify, RwLock};

use super::store::{CatalogStore, ChangeHandler, StoreError, Subscription};
use super::{CatalogSnapshot, NewVideo, VideoChanges, VideoRecord};
use crate::config::StoreMode;

struct LiveInner {
    store: Arc<dyn CatalogStore>,
    snapshot: RwLock<CatalogSnapshot>,
    last_error: RwLock<Option<String>>,
}

#[derive(Clone)]
pub struct LiveCatalog {
    inner: Arc<LiveInner>,
}

/// Change feed plus the task that re-lists on each notification.
#[derive(Debug)]
pub struct CatalogWatch {
    _feed: Subscription,
    _refresher: Subscription,
}

impl LiveCatalog {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            inner: Arc::new(LiveInner {
                store,
                snapshot: RwLock::new(CatalogSnapshot::default()),
                last_error: RwLock::new(None),
            }),
        }
    }

    /// Builds the catalog and performs the first list. A failed first list
    /// leaves an empty snapshot and records the error.
    pub async fn load(store: Arc<dyn CatalogStore>) -> Self {
        let catalog = Self::new(store);
        if let Err(e) = catalog.refresh().await {
            tracing::error!("Initial catalog load failed: {}", e);
        }
        catalog
    }

    pub fn mode(&self) -> StoreMode {
        self.inner.store.mode()
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.inner.snapshot.read().await.clone()
    }

    /// Message of the most recent failed re-list, cleared by the next success.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.last_error.read().await.clone()
    }

    /// Full re-list from the store. On failure the previous snapshot stays.
    #[tracing::instrument(name = "Refresh catalog", skip(self))]
    pub async fn refresh(&self) -> Result<CatalogSnapshot, StoreError> {
        match self.inner.store.list().await {
            Ok(records) => {
                let mut snapshot = self.inner.snapshot.write().await;
                *snapshot = snapshot.succeed(records);
                *self.inner.last_error.write().await = None;
                tracing::info!(
                    "Catalog refreshed to version {} with {} videos",
                    snapshot.version(),
                    snapshot.len()
                );
                Ok(snapshot.clone())
            }
            Err(e) => {
                tracing::error!("Failed to refresh catalog: {}", e);
                *self.inner.last_error.write().await = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn create(&self, video: NewVideo) -> Result<VideoRecord, StoreError> {
        let record = self.inner.store.create(video).await?;
        self.apply_locally(|records| records.insert(0, record.clone()))
            .await;
        Ok(record)
    }

    pub async fn update(&self, id: &str, changes: VideoChanges) -> Result<VideoRecord, StoreError> {
        let record = self.inner.store.update(id, changes).await?;
        self.apply_locally(|records| {
            if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
                *existing = record.clone();
            }
        })
        .await;
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.store.delete(id).await?;
        self.apply_locally(|records| records.retain(|r| r.id != id))
            .await;
        Ok(())
    }

    async fn apply_locally<F>(&self, change: F)
    where
        F: FnOnce(&mut Vec<VideoRecord>),
    {
        let mut snapshot = self.inner.snapshot.write().await;
        let mut records = snapshot.records().to_vec();
        change(&mut records);
        *snapshot = snapshot.succeed(records);
        tracing::debug!("Applied local change, catalog now at version {}", snapshot.version());
    }

    /// Subscribes to the store and re-lists on every notification. Bursts of
    /// notifications collapse into a single pending re-list.
    #[tracing::instrument(name = "Watch catalog changes", skip(self))]
    pub async fn watch(&self) -> Result<CatalogWatch, StoreError> {
        let pending = Arc::new(Notify::new());

        let signal = pending.clone();
        let on_change: ChangeHandler = Arc::new(move |kind| {
            tracing::debug!("Store reported {:?}, scheduling re-list", kind);
            signal.notify_one();
        });
        let feed = self.inner.store.subscribe(on_change).await?;

        let weak: Weak<LiveInner> = Arc::downgrade(&self.inner);
        let refresher = tokio::spawn(async move {
            loop {
                pending.notified().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let _ = LiveCatalog { inner }.refresh().await;
            }
        });

        Ok(CatalogWatch {
            _feed: feed,
            _refresher: Subscription::from_task(refresher),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::seed::demo_records;
    use crate::catalog::store::{ChangeKind, FallbackStore};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Store whose rows and notifications are driven by the test.
    #[derive(Default)]
    struct ScriptedStore {
        records: Mutex<Vec<VideoRecord>>,
        handler: Mutex<Option<ChangeHandler>>,
        fail_list: Mutex<bool>,
    }

    impl ScriptedStore {
        fn notify(&self, kind: ChangeKind) {
            let handler = self.handler.lock().unwrap().clone();
            if let Some(handler) = handler {
                handler(kind);
            }
        }
    }

    #[async_trait]
    impl CatalogStore for ScriptedStore {
        async fn list(&self) -> Result<Vec<VideoRecord>, StoreError> {
            if *self.fail_list.lock().unwrap() {
                return Err(StoreError::Connection("offline".into()));
            }
            Ok(self.records.lock().unwrap().clone())
        }

        async fn create(&self, _video: NewVideo) -> Result<VideoRecord, StoreError> {
            Err(StoreError::Capability)
        }

        async fn update(&self, _id: &str, _c: VideoChanges) -> Result<VideoRecord, StoreError> {
            Err(StoreError::Capability)
        }

        async fn delete(&self, _id: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn subscribe(&self, on_change: ChangeHandler) -> Result<Subscription, StoreError> {
            *self.handler.lock().unwrap() = Some(on_change);
            Ok(Subscription::inert())
        }

        fn mode(&self) -> StoreMode {
            StoreMode::Remote
        }
    }

    async fn wait_for_version(catalog: &LiveCatalog, version: u64) -> CatalogSnapshot {
        for _ in 0..100 {
            let snapshot = catalog.snapshot().await;
            if snapshot.version() >= version {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("catalog never reached version {version}");
    }

    #[tokio::test]
    async fn load_lists_the_store() {
        let catalog = LiveCatalog::load(Arc::new(FallbackStore::seeded())).await;
        let snapshot = catalog.snapshot().await;
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.len(), 7);
        assert_eq!(catalog.mode(), StoreMode::Fallback);
    }

    #[tokio::test]
    async fn delete_is_applied_locally_and_bumps_version() {
        let catalog = LiveCatalog::load(Arc::new(FallbackStore::seeded())).await;

        catalog.delete("demo-2").await.unwrap();

        let snapshot = catalog.snapshot().await;
        assert_eq!(snapshot.version(), 2);
        assert!(snapshot.get("demo-2").is_none());
        assert_eq!(snapshot.len(), 6);
    }

    #[tokio::test]
    async fn rejected_writes_leave_the_snapshot_alone() {
        let catalog = LiveCatalog::load(Arc::new(FallbackStore::seeded())).await;
        let record = demo_records().remove(0);
        let changes = VideoChanges {
            external_id: record.external_id.clone(),
            source_url: record.source_url.clone(),
            title: "Edited".into(),
            channel_name: record.channel_name.clone(),
            description: record.description.clone(),
            thumbnail_url: record.thumbnail_url.clone(),
            published_at: record.published_at,
            tags: record.tags.clone(),
            added_by_admin: true,
        };

        let err = catalog.update(&record.id, changes).await.unwrap_err();
        assert!(matches!(err, StoreError::Capability));
        assert_eq!(catalog.snapshot().await.version(), 1);
    }

    #[tokio::test]
    async fn notifications_trigger_a_full_relist() {
        let store = Arc::new(ScriptedStore::default());
        let catalog = LiveCatalog::load(store.clone()).await;
        assert!(catalog.snapshot().await.is_empty());

        let _watch = catalog.watch().await.unwrap();

        *store.records.lock().unwrap() = demo_records();
        store.notify(ChangeKind::Insert);

        let snapshot = wait_for_version(&catalog, 2).await;
        assert_eq!(snapshot.len(), 7);
    }

    #[tokio::test]
    async fn failed_relist_keeps_previous_snapshot() {
        let store = Arc::new(ScriptedStore::default());
        *store.records.lock().unwrap() = demo_records();
        let catalog = LiveCatalog::load(store.clone()).await;

        *store.fail_list.lock().unwrap() = true;
        assert!(catalog.refresh().await.is_err());

        let snapshot = catalog.snapshot().await;
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.len(), 7);
        assert!(catalog.last_error().await.unwrap().contains("offline"));

        *store.fail_list.lock().unwrap() = false;
        catalog.refresh().await.unwrap();
        assert!(catalog.last_error().await.is_none());
    }
}
