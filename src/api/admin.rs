use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::common::ApiResponse;
use crate::api::videos::VideoView;
use crate::auth::Claims;
use crate::catalog::ingest::{ingest_url, prepare_changes, EditRequest, IngestRequest};
use crate::errors::AppError;
use crate::InnerState;

#[tracing::instrument(name = "Admin create video", skip(inner, claims, request), fields(admin = %claims.sub))]
pub async fn create_video(
    State(inner): State<InnerState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VideoView>>), AppError> {
    let record = ingest_url(&inner.catalog, &inner.resolver, request).await?;
    tracing::info!("Video {} added", record.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(record.into(), "Video added")),
    ))
}

#[tracing::instrument(name = "Admin update video", skip(inner, claims, request), fields(admin = %claims.sub))]
pub async fn update_video(
    State(inner): State<InnerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(request): Json<EditRequest>,
) -> Result<Json<ApiResponse<VideoView>>, AppError> {
    let current = inner.catalog.snapshot().await.get(&id).cloned();
    let changes = prepare_changes(request, current.as_ref())?;

    let record = inner.catalog.update(&id, changes).await?;
    tracing::info!("Video {} updated", record.id);

    Ok(Json(ApiResponse::with_message(record.into(), "Video updated")))
}

#[tracing::instrument(name = "Admin delete video", skip(inner, claims), fields(admin = %claims.sub))]
pub async fn delete_video(
    State(inner): State<InnerState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, AppError> {
    inner.catalog.delete(&id).await?;
    tracing::info!("Video {} deleted", id);

    Ok(Json(ApiResponse::with_message(id, "Video deleted")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub version: u64,
    pub total_items: usize,
}

#[tracing::instrument(name = "Admin refresh catalog", skip(inner, claims), fields(admin = %claims.sub))]
pub async fn refresh_catalog(
    State(inner): State<InnerState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<RefreshSummary>>, AppError> {
    let snapshot = inner.catalog.refresh().await?;

    Ok(Json(ApiResponse::success(RefreshSummary {
        version: snapshot.version(),
        total_items: snapshot.len(),
    })))
}
