//! Metadata resolution against an oEmbed-style provider.
//!
//! [`MetadataResolver::resolve`] never fails: any provider problem is logged
//! and answered with locally synthesized metadata so ingestion always has
//! something to store.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{thumbnail_url_for, watch_url_for, ExternalId, VideoMetadata};

pub const DEFAULT_METADATA_ENDPOINT: &str = "https://www.youtube.com/oembed";

pub const FALLBACK_CHANNEL_NAME: &str = "Unknown Channel";

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
    upload_date: Option<String>,
}

/// Why a lookup fell back; logged, never returned.
#[derive(thiserror::Error, Debug)]
enum ResolutionFailure {
    #[error("metadata request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("metadata provider answered HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("metadata payload is missing a title")]
    MissingTitle,
}

#[derive(Clone, Debug)]
pub struct MetadataResolver {
    http_client: Client,
    endpoint: String,
}

impl MetadataResolver {
    pub fn new(endpoint: String) -> Self {
        Self {
            http_client: Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Single lookup, no retries. Falls back on any failure.
    #[tracing::instrument(name = "Resolve video metadata", skip(self, external_id), fields(external_id = %external_id))]
    pub async fn resolve(&self, external_id: &ExternalId, source_url: &str) -> VideoMetadata {
        tracing::debug!("Looking up metadata at {}", self.endpoint);

        match self.lookup(external_id).await {
            Ok(metadata) => {
                tracing::info!("Resolved metadata for {}: {}", external_id, metadata.title);
                metadata
            }
            Err(failure) => {
                tracing::warn!(
                    error = %failure,
                    source_url = %source_url,
                    "Metadata lookup failed, using fallback metadata"
                );
                fallback_metadata(external_id)
            }
        }
    }

    async fn lookup(&self, external_id: &ExternalId) -> Result<VideoMetadata, ResolutionFailure> {
        let watch_url = watch_url_for(external_id);

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ResolutionFailure::Status(response.status()));
        }

        let payload: OEmbedResponse = response.json().await?;
        map_payload(external_id, payload)
    }
}

fn map_payload(
    external_id: &ExternalId,
    payload: OEmbedResponse,
) -> Result<VideoMetadata, ResolutionFailure> {
    let title = payload
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or(ResolutionFailure::MissingTitle)?;

    let channel_name = payload
        .author_name
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_CHANNEL_NAME.to_string());

    let thumbnail_url = payload
        .thumbnail_url
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| thumbnail_url_for(external_id));

    let published_at = payload
        .upload_date
        .as_deref()
        .and_then(parse_upload_date)
        .unwrap_or_else(Utc::now);

    Ok(VideoMetadata {
        title,
        channel_name,
        thumbnail_url,
        published_at,
    })
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DD`, and `YYYYMMDD`.
fn parse_upload_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn fallback_metadata(external_id: &ExternalId) -> VideoMetadata {
    VideoMetadata {
        title: format!("Video {}", external_id),
        channel_name: FALLBACK_CHANNEL_NAME.to_string(),
        thumbnail_url: thumbnail_url_for(external_id),
        published_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    async fn spawn_provider(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/oembed", addr)
    }

    fn id() -> ExternalId {
        ExternalId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn maps_provider_fields_on_success() {
        let app = Router::new().route(
            "/oembed",
            get(|| async {
                Json(json!({
                    "title": "Never Gonna Give You Up",
                    "author_name": "Rick Astley",
                    "thumbnail_url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg",
                    "upload_date": "2009-10-25"
                }))
            }),
        );
        let resolver = MetadataResolver::new(spawn_provider(app).await);

        let metadata = resolver.resolve(&id(), "https://youtu.be/dQw4w9WgXcQ").await;

        assert_eq!(metadata.title, "Never Gonna Give You Up");
        assert_eq!(metadata.channel_name, "Rick Astley");
        assert_eq!(
            metadata.thumbnail_url,
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
        assert_eq!(metadata.published_at.date_naive().to_string(), "2009-10-25");
    }

    #[tokio::test]
    async fn non_success_status_falls_back() {
        let app = Router::new().route("/oembed", get(|| async { StatusCode::NOT_FOUND }));
        let resolver = MetadataResolver::new(spawn_provider(app).await);

        let metadata = resolver.resolve(&id(), "https://youtu.be/dQw4w9WgXcQ").await;

        assert!(metadata.title.contains("dQw4w9WgXcQ"));
        assert_eq!(metadata.channel_name, FALLBACK_CHANNEL_NAME);
        assert_eq!(
            metadata.thumbnail_url,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
    }

    #[tokio::test]
    async fn malformed_payload_falls_back() {
        let app = Router::new().route("/oembed", get(|| async { "<html>not json</html>" }));
        let resolver = MetadataResolver::new(spawn_provider(app).await);

        let metadata = resolver.resolve(&id(), "https://youtu.be/dQw4w9WgXcQ").await;

        assert_eq!(metadata.title, "Video dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let resolver = MetadataResolver::new(format!("http://{}/oembed", addr));

        let metadata = resolver.resolve(&id(), "https://youtu.be/dQw4w9WgXcQ").await;

        assert_eq!(metadata.title, "Video dQw4w9WgXcQ");
        assert_eq!(
            metadata.thumbnail_url,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
    }

    #[test]
    fn missing_optional_fields_use_conventions() {
        let payload = OEmbedResponse {
            title: Some("Clip".into()),
            author_name: None,
            thumbnail_url: None,
            upload_date: None,
        };
        let metadata = map_payload(&id(), payload).unwrap();
        assert_eq!(metadata.channel_name, FALLBACK_CHANNEL_NAME);
        assert_eq!(metadata.thumbnail_url, thumbnail_url_for(&id()));
    }

    #[test]
    fn upload_dates_in_several_shapes() {
        assert!(parse_upload_date("2021-04-01T10:00:00Z").is_some());
        assert!(parse_upload_date("20210401").is_some());
        assert!(parse_upload_date("2021-04-01").is_some());
        assert!(parse_upload_date("last tuesday").is_none());
    }
}
