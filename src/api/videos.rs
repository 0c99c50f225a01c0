use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::common::ApiResponse;
use crate::catalog::query::{self, CatalogQuery, ALL_CATEGORIES, CATEGORIES};
use crate::catalog::VideoRecord;
use crate::config::StoreMode;
use crate::errors::AppError;
use crate::InnerState;

/// A record as served to clients, with its player links.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    #[serde(flatten)]
    pub record: VideoRecord,
    pub watch_url: String,
    pub embed_url: String,
}

impl From<VideoRecord> for VideoView {
    fn from(record: VideoRecord) -> Self {
        Self {
            watch_url: record.watch_url(),
            embed_url: record.embed_url(),
            record,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl ListParams {
    fn into_query(self, default_page_size: usize) -> CatalogQuery {
        CatalogQuery {
            search_text: self.search.unwrap_or_default(),
            category: self.category.unwrap_or_else(|| ALL_CATEGORIES.to_string()),
            page: self.page.unwrap_or(1),
            page_size: match self.page_size {
                Some(size) if size > 0 => size,
                _ => default_page_size,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub items: Vec<VideoView>,
    pub total_pages: usize,
    pub total_items: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_prev: bool,
    pub version: u64,
    pub mode: StoreMode,
    /// Set while the catalog could not be re-listed; the items are the last
    /// good snapshot.
    pub last_error: Option<String>,
}

#[tracing::instrument(name = "List videos", skip(inner))]
pub async fn list_videos(
    State(inner): State<InnerState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<VideoPage>>, AppError> {
    let catalog_query = params.into_query(inner.settings.page_size);
    let snapshot = inner.catalog.snapshot().await;

    let page = query::query(&snapshot, &catalog_query);
    tracing::debug!(
        "Query matched {} of {} videos at version {}",
        page.total_items,
        snapshot.len(),
        page.version
    );

    Ok(Json(ApiResponse::success(VideoPage {
        items: page.items.into_iter().map(VideoView::from).collect(),
        total_pages: page.total_pages,
        total_items: page.total_items,
        page: page.page,
        page_size: page.page_size,
        has_next: page.has_next,
        has_prev: page.has_prev,
        version: page.version,
        mode: inner.catalog.mode(),
        last_error: inner.catalog.last_error().await,
    })))
}

#[tracing::instrument(name = "Get video", skip(inner))]
pub async fn get_video(
    State(inner): State<InnerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<VideoView>>, AppError> {
    let snapshot = inner.catalog.snapshot().await;
    let record = snapshot
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("video {id}")))?;

    Ok(Json(ApiResponse::success(record.into())))
}

pub async fn categories() -> Json<ApiResponse<&'static [&'static str]>> {
    Json(ApiResponse::success(CATEGORIES))
}
