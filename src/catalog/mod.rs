//! Video catalog engine
//!
//! Everything that turns a raw video-sharing URL into a stored record and
//! serves filtered, paginated views of the stored records lives here.

pub mod ingest;
pub mod live;
pub mod normalizer;
pub mod query;
pub mod resolver;
pub mod store;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use normalizer::{parse_video_url, InvalidUrl};

/// Convention used whenever the metadata provider gives no thumbnail.
pub fn thumbnail_url_for(external_id: &ExternalId) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", external_id)
}

pub fn watch_url_for(external_id: &ExternalId) -> String {
    format!("https://www.youtube.com/watch?v={}", external_id)
}

pub fn embed_url_for(external_id: &ExternalId) -> String {
    format!("https://www.youtube.com/embed/{}?autoplay=1", external_id)
}

/// Canonical 11-character platform video identifier.
///
/// Only constructed through [`ExternalId::parse`], so holding one means the
/// charset and length have already been checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    pub const LEN: usize = 11;

    pub fn parse(candidate: &str) -> Result<Self, InvalidUrl> {
        if candidate.len() != Self::LEN {
            return Err(InvalidUrl::BadIdentifier(candidate.to_string()));
        }
        if !candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(InvalidUrl::BadIdentifier(candidate.to_string()));
        }
        Ok(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ExternalId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ExternalId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Display metadata produced by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub title: String,
    pub channel_name: String,
    pub thumbnail_url: String,
    pub published_at: DateTime<Utc>,
}

/// The single domain entity of the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub external_id: ExternalId,
    pub source_url: String,
    pub title: String,
    pub channel_name: String,
    pub description: String,
    pub thumbnail_url: String,
    pub published_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub added_by_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn watch_url(&self) -> String {
        watch_url_for(&self.external_id)
    }

    pub fn embed_url(&self) -> String {
        embed_url_for(&self.external_id)
    }

    /// Case-insensitive tag membership by substring.
    pub fn has_tag_containing(&self, needle_lower: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle_lower))
    }
}

/// A record that has not been persisted yet; the store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub external_id: ExternalId,
    pub source_url: String,
    pub title: String,
    pub channel_name: String,
    pub description: String,
    pub thumbnail_url: String,
    pub published_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub added_by_admin: bool,
}

/// Full replacement of a record's mutable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoChanges {
    pub external_id: ExternalId,
    pub source_url: String,
    pub title: String,
    pub channel_name: String,
    pub description: String,
    pub thumbnail_url: String,
    pub published_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub added_by_admin: bool,
}

/// Immutable, versioned view of the catalog handed to the query engine.
///
/// Records keep the store's order (newest `created_at` first for the
/// remote store). Cloning only bumps a reference count.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    version: u64,
    records: Arc<[VideoRecord]>,
}

impl CatalogSnapshot {
    pub fn new(version: u64, records: Vec<VideoRecord>) -> Self {
        Self {
            version,
            records: records.into(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&VideoRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Next version holding `records`.
    pub fn succeed(&self, records: Vec<VideoRecord>) -> Self {
        Self::new(self.version + 1, records)
    }
}
