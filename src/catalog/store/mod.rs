//! Catalog persistence
//!
//! [`CatalogStore`] is the capability set every backend satisfies:
//! `list`, `create`, `update`, `delete` and `subscribe`. The backend is chosen
//! once by [`crate::startup::build_state`] and never switched afterwards.
//!
//! | Backend | When | Mutations | Change feed |
//! |---------|------|-----------|-------------|
//! | [`RemoteStore`] | well-formed store credentials | all | `LISTEN videos_changed` |
//! | [`FallbackStore`] | anything else | `delete` only | none |

pub mod fallback;
pub mod remote;
pub mod seed;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::catalog::{NewVideo, VideoChanges, VideoRecord};
use crate::config::StoreMode;

pub use fallback::FallbackStore;
pub use remote::RemoteStore;

pub const DEMO_MODE_MESSAGE: &str = "operation unsupported without a configured store";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store authorization error: {0}")]
    Auth(String),

    #[error("Store validation error: {0}")]
    Validation(String),

    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Demo mode: {}", DEMO_MODE_MESSAGE)]
    Capability,
}

/// What happened on the store side. Consumers re-list on any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// The feed reconnected; events may have been missed.
    Resync,
}

impl ChangeKind {
    pub fn from_operation(op: &str) -> Self {
        match op.to_ascii_uppercase().as_str() {
            "INSERT" => ChangeKind::Insert,
            "UPDATE" => ChangeKind::Update,
            "DELETE" => ChangeKind::Delete,
            _ => ChangeKind::Resync,
        }
    }
}

pub type ChangeHandler = Arc<dyn Fn(ChangeKind) + Send + Sync>;

/// Keeps a change feed alive; dropping it stops notifications.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// A subscription that will never fire.
    pub fn inert() -> Self {
        Self { task: None }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All records, newest `created_at` first.
    async fn list(&self) -> Result<Vec<VideoRecord>, StoreError>;

    /// Persists a new record; the store assigns `id` and `created_at`.
    async fn create(&self, video: NewVideo) -> Result<VideoRecord, StoreError>;

    /// Replaces every mutable field of record `id` at once.
    async fn update(&self, id: &str, changes: VideoChanges) -> Result<VideoRecord, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Registers `on_change` for insert/update/delete events from any client.
    async fn subscribe(&self, on_change: ChangeHandler) -> Result<Subscription, StoreError>;

    fn mode(&self) -> StoreMode;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_map_to_change_kinds() {
        assert_eq!(ChangeKind::from_operation("INSERT"), ChangeKind::Insert);
        assert_eq!(ChangeKind::from_operation("update"), ChangeKind::Update);
        assert_eq!(ChangeKind::from_operation("DELETE"), ChangeKind::Delete);
        assert_eq!(ChangeKind::from_operation("TRUNCATE"), ChangeKind::Resync);
    }

    #[test]
    fn capability_error_names_demo_mode() {
        let message = StoreError::Capability.to_string();
        assert!(message.starts_with("Demo mode"));
        assert!(message.contains(DEMO_MODE_MESSAGE));
    }

    #[tokio::test]
    async fn dropping_a_subscription_stops_its_task() {
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        let subscription = Subscription::from_task(task);
        assert!(subscription.is_active());
        drop(subscription);
        assert!(!Subscription::inert().is_active());
    }
}
