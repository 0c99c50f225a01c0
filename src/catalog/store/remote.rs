use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgListener;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{CatalogStore, ChangeHandler, ChangeKind, StoreError, Subscription};
use crate::catalog::{ExternalId, NewVideo, VideoChanges, VideoRecord};
use crate::config::StoreMode;

pub const CHANGE_CHANNEL: &str = "videos_changed";

const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(5);

const RETURNING_COLUMNS: &str = "id, youtube_id, youtube_url, title, channel, thumbnail_url, \
     description, published_at, tags, added_by_admin, created_at";

#[derive(Debug, FromRow, Clone)]
struct VideoRow {
    id: String,
    youtube_id: String,
    youtube_url: String,
    title: String,
    channel: String,
    thumbnail_url: String,
    description: String,
    published_at: DateTime<Utc>,
    tags: Vec<String>,
    added_by_admin: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<VideoRow> for VideoRecord {
    type Error = StoreError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let external_id = ExternalId::parse(&row.youtube_id).map_err(|e| {
            StoreError::Validation(format!("row {} has an invalid youtube_id: {}", row.id, e))
        })?;

        Ok(VideoRecord {
            id: row.id,
            external_id,
            source_url: row.youtube_url,
            title: row.title,
            channel_name: row.channel,
            description: row.description,
            thumbnail_url: row.thumbnail_url,
            published_at: row.published_at,
            tags: row.tags,
            added_by_admin: row.added_by_admin,
            created_at: row.created_at,
        })
    }
}

/// Maps a driver error onto the store taxonomy.
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound("no matching row".to_string()),
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            let message = db_err.message().to_string();
            match code.as_str() {
                "28000" | "28P01" | "42501" => StoreError::Auth(message),
                c if c.starts_with("08") || c.starts_with("57") || c.starts_with("53") => {
                    StoreError::Connection(message)
                }
                _ => StoreError::Validation(message),
            }
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Validation(err.to_string()),
        other => StoreError::Connection(other.to_string()),
    }
}

/// Postgres-backed catalog. Row changes from any client are announced on
/// [`CHANGE_CHANNEL`] by a trigger installed with the migrations.
#[derive(Clone, Debug)]
pub struct RemoteStore {
    db: PgPool,
}

impl RemoteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogStore for RemoteStore {
    #[tracing::instrument(name = "List videos", skip(self))]
    async fn list(&self) -> Result<Vec<VideoRecord>, StoreError> {
        let rows = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {} FROM videos ORDER BY created_at DESC",
            RETURNING_COLUMNS
        ))
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            tracing::error!("Database error while listing videos: {:?}", e);
            classify(e)
        })?;

        tracing::debug!("Fetched {} video rows", rows.len());

        let records = rows
            .into_iter()
            .filter_map(|row| match VideoRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable video row: {}", e);
                    None
                }
            })
            .collect();

        Ok(records)
    }

    #[tracing::instrument(name = "Create video", skip(self, video), fields(external_id = %video.external_id))]
    async fn create(&self, video: NewVideo) -> Result<VideoRecord, StoreError> {
        let id = Uuid::new_v4().to_string();
        tracing::debug!("Generated id {} for new video", id);

        let row = sqlx::query_as::<_, VideoRow>(&format!(
            r#"INSERT INTO videos
               (id, youtube_id, youtube_url, title, channel, thumbnail_url,
                description, published_at, tags, added_by_admin)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING {}"#,
            RETURNING_COLUMNS
        ))
        .bind(&id)
        .bind(video.external_id.as_str())
        .bind(&video.source_url)
        .bind(&video.title)
        .bind(&video.channel_name)
        .bind(&video.thumbnail_url)
        .bind(&video.description)
        .bind(video.published_at)
        .bind(&video.tags)
        .bind(video.added_by_admin)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            tracing::error!("Database error while creating video: {:?}", e);
            classify(e)
        })?;

        tracing::info!("Created video {}", id);
        VideoRecord::try_from(row)
    }

    #[tracing::instrument(name = "Update video", skip(self, changes))]
    async fn update(&self, id: &str, changes: VideoChanges) -> Result<VideoRecord, StoreError> {
        let row = sqlx::query_as::<_, VideoRow>(&format!(
            r#"UPDATE videos
               SET youtube_id = $2,
                   youtube_url = $3,
                   title = $4,
                   channel = $5,
                   thumbnail_url = $6,
                   description = $7,
                   published_at = $8,
                   tags = $9,
                   added_by_admin = $10,
                   updated_at = CURRENT_TIMESTAMP
               WHERE id = $1
               RETURNING {}"#,
            RETURNING_COLUMNS
        ))
        .bind(id)
        .bind(changes.external_id.as_str())
        .bind(&changes.source_url)
        .bind(&changes.title)
        .bind(&changes.channel_name)
        .bind(&changes.thumbnail_url)
        .bind(&changes.description)
        .bind(changes.published_at)
        .bind(&changes.tags)
        .bind(changes.added_by_admin)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            tracing::error!("Database error while updating video {}: {:?}", id, e);
            classify(e)
        })?;

        match row {
            Some(row) => {
                tracing::info!("Updated video {}", id);
                VideoRecord::try_from(row)
            }
            None => {
                tracing::warn!("No video to update with id {}", id);
                Err(StoreError::NotFound(id.to_string()))
            }
        }
    }

    #[tracing::instrument(name = "Delete video", skip(self))]
    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Database error while deleting video {}: {:?}", id, e);
                classify(e)
            })?;

        if result.rows_affected() == 0 {
            tracing::warn!("No video to delete with id {}", id);
            return Err(StoreError::NotFound(id.to_string()));
        }

        tracing::info!("Deleted video {}", id);
        Ok(())
    }

    #[tracing::instrument(name = "Subscribe to video changes", skip(self, on_change))]
    async fn subscribe(&self, on_change: ChangeHandler) -> Result<Subscription, StoreError> {
        let mut listener = PgListener::connect_with(&self.db).await.map_err(classify)?;
        listener.listen(CHANGE_CHANNEL).await.map_err(classify)?;
        tracing::info!("Listening for notifications on {}", CHANGE_CHANNEL);

        let task = tokio::spawn(async move {
            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => {
                        tracing::debug!("Change notification: {}", notification.payload());
                        on_change(ChangeKind::from_operation(notification.payload()));
                    }
                    Ok(None) => {
                        tracing::warn!("Change feed connection lost, reconnecting");
                        on_change(ChangeKind::Resync);
                    }
                    Err(e) => {
                        tracing::error!("Change feed error: {:?}", e);
                        tokio::time::sleep(LISTENER_RETRY_DELAY).await;
                    }
                }
            }
        });

        Ok(Subscription::from_task(task))
    }

    fn mode(&self) -> StoreMode {
        StoreMode::Remote
    }
}
