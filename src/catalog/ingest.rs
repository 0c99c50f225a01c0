//! Admin upload and edit flows.
//!
//! A raw URL is normalized first, so an unusable URL is rejected before the
//! resolver or the store is touched. Admin-supplied fields win over resolved
//! metadata when they are not blank.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::live::LiveCatalog;
use super::resolver::MetadataResolver;
use super::store::StoreError;
use super::{
    parse_video_url, thumbnail_url_for, ExternalId, InvalidUrl, NewVideo, VideoChanges, VideoMetadata,
    VideoRecord,
};

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrl),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Tags arrive either as a list or as one comma separated string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    CommaSeparated(String),
}

impl Default for TagsInput {
    fn default() -> Self {
        TagsInput::List(Vec::new())
    }
}

impl TagsInput {
    pub fn into_tags(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            TagsInput::List(tags) => tags,
            TagsInput::CommaSeparated(joined) => joined.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "channel")]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: TagsInput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub url: String,
    pub title: String,
    #[serde(alias = "channel")]
    pub channel_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: TagsInput,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub added_by_admin: Option<bool>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Combines resolved metadata with the admin's overrides.
pub fn assemble(external_id: ExternalId, request: IngestRequest, metadata: VideoMetadata) -> NewVideo {
    NewVideo {
        external_id,
        source_url: request.url.trim().to_string(),
        title: non_blank(request.title).unwrap_or(metadata.title),
        channel_name: non_blank(request.channel_name).unwrap_or(metadata.channel_name),
        description: non_blank(request.description).unwrap_or_default(),
        thumbnail_url: metadata.thumbnail_url,
        published_at: metadata.published_at,
        tags: request.tags.into_tags(),
        added_by_admin: true,
    }
}

/// normalize → resolve → assemble → create.
#[tracing::instrument(name = "Ingest video URL", skip(catalog, resolver, request), fields(url = %request.url))]
pub async fn ingest_url(
    catalog: &LiveCatalog,
    resolver: &MetadataResolver,
    request: IngestRequest,
) -> Result<VideoRecord, IngestError> {
    let external_id = parse_video_url(&request.url).map_err(|e| {
        tracing::warn!("Rejected URL before any lookup: {}", e);
        e
    })?;
    tracing::debug!("Normalized {} to {}", request.url, external_id);

    let metadata = resolver.resolve(&external_id, &request.url).await;
    let video = assemble(external_id, request, metadata);

    let record = catalog.create(video).await?;
    tracing::info!("Ingested video {} as {}", record.external_id, record.id);
    Ok(record)
}

/// Validates an edit and turns it into a full field replacement.
/// `current` supplies values the request leaves out.
pub fn prepare_changes(
    request: EditRequest,
    current: Option<&VideoRecord>,
) -> Result<VideoChanges, InvalidUrl> {
    let external_id = parse_video_url(&request.url)?;

    let thumbnail_url = non_blank(request.thumbnail_url).unwrap_or_else(|| {
        match current {
            Some(record) if record.external_id == external_id => record.thumbnail_url.clone(),
            _ => thumbnail_url_for(&external_id),
        }
    });

    let published_at = request
        .published_at
        .or_else(|| current.map(|record| record.published_at))
        .unwrap_or_else(Utc::now);

    let added_by_admin = request
        .added_by_admin
        .or_else(|| current.map(|record| record.added_by_admin))
        .unwrap_or(true);

    Ok(VideoChanges {
        external_id,
        source_url: request.url.trim().to_string(),
        title: request.title.trim().to_string(),
        channel_name: request.channel_name.trim().to_string(),
        description: request.description,
        thumbnail_url,
        published_at,
        tags: request.tags.into_tags(),
        added_by_admin,
    })
}
