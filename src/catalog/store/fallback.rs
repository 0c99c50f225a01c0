//! In-process catalog used when no store is configured.
//!
//! Lives for the lifetime of the process and resets on restart. Creation and
//! editing are refused with [`StoreError::Capability`]; deletion works so the
//! admin panel can still be exercised.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{seed, CatalogStore, ChangeHandler, StoreError, Subscription};
use crate::catalog::{NewVideo, VideoChanges, VideoRecord};
use crate::config::StoreMode;

pub struct FallbackStore {
    records: RwLock<Vec<VideoRecord>>,
}

impl FallbackStore {
    pub fn new(records: Vec<VideoRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed::demo_records())
    }
}

impl Default for FallbackStore {
    fn default() -> Self {
        Self::seeded()
    }
}

#[async_trait]
impl CatalogStore for FallbackStore {
    async fn list(&self) -> Result<Vec<VideoRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn create(&self, video: NewVideo) -> Result<VideoRecord, StoreError> {
        tracing::warn!("Refusing to create {} in demo mode", video.external_id);
        Err(StoreError::Capability)
    }

    async fn update(&self, id: &str, _changes: VideoChanges) -> Result<VideoRecord, StoreError> {
        tracing::warn!("Refusing to update {} in demo mode", id);
        Err(StoreError::Capability)
    }

    #[tracing::instrument(name = "Delete demo video", skip(self))]
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.id != id);

        if records.len() == before {
            tracing::warn!("No demo video with id {}", id);
            return Err(StoreError::NotFound(id.to_string()));
        }

        tracing::info!("Deleted demo video {}, {} remain", id, records.len());
        Ok(())
    }

    async fn subscribe(&self, _on_change: ChangeHandler) -> Result<Subscription, StoreError> {
        Ok(Subscription::inert())
    }

    fn mode(&self) -> StoreMode {
        StoreMode::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ExternalId;
    use chrono::Utc;
    use std::sync::Arc;

    fn changes() -> VideoChanges {
        let external_id = ExternalId::parse("dQw4w9WgXcQ").unwrap();
        VideoChanges {
            source_url: crate::catalog::watch_url_for(&external_id),
            thumbnail_url: crate::catalog::thumbnail_url_for(&external_id),
            external_id,
            title: "t".into(),
            channel_name: "c".into(),
            description: String::new(),
            published_at: Utc::now(),
            tags: vec![],
            added_by_admin: true,
        }
    }

    #[tokio::test]
    async fn create_and_update_are_capability_errors() {
        let store = FallbackStore::seeded();
        let c = changes();
        let new_video = NewVideo {
            external_id: c.external_id.clone(),
            source_url: c.source_url.clone(),
            title: c.title.clone(),
            channel_name: c.channel_name.clone(),
            description: c.description.clone(),
            thumbnail_url: c.thumbnail_url.clone(),
            published_at: c.published_at,
            tags: c.tags.clone(),
            added_by_admin: true,
        };

        assert!(matches!(store.create(new_video).await, Err(StoreError::Capability)));
        assert!(matches!(store.update("demo-1", c).await, Err(StoreError::Capability)));
        assert_eq!(store.list().await.unwrap().len(), 7);
    }

    #[tokio::test]
    async fn delete_removes_from_later_lists() {
        let store = FallbackStore::seeded();

        store.delete("demo-3").await.unwrap();

        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 6);
        assert!(records.iter().all(|r| r.id != "demo-3"));
        assert!(matches!(
            store.delete("demo-3").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn subscribe_is_inert() {
        let store = FallbackStore::seeded();
        let subscription = store.subscribe(Arc::new(|_| {})).await.unwrap();
        assert!(!subscription.is_active());
        assert_eq!(store.mode(), StoreMode::Fallback);
    }
}
