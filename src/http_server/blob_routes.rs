//! Blob HTTP Routes
//!
//! Serves blobs to holders of a URL issued by the blob store, and exposes
//! the orphan sweep.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::blob_store::BlobBackend;
use crate::record_store::RecordStore;
use crate::service::{PostError, SweepReport};

use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct SweepQuery {
    #[serde(default)]
    pub dry_run: bool,
}

/// Create blob routes
pub fn blob_routes<R, B>(state: Arc<AppState<R, B>>) -> Router
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    Router::new()
        .route("/maintenance/sweep", post(sweep_handler::<R, B>))
        .route("/blobs/*path", get(download_handler::<R, B>))
        .with_state(state)
}

async fn download_handler<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
    Path(path): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<([(header::HeaderName, &'static str); 1], Vec<u8>), PostError>
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    let service = state.service.lock().await;
    let data = service.blobs().read_verified(&path, &query.token)?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&path))], data))
}

async fn sweep_handler<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
    Query(query): Query<SweepQuery>,
) -> Result<Json<SweepReport>, PostError>
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    let service = state.service.lock().await;
    let report = service.sweep_orphaned_blobs(query.dry_run)?;
    Ok(Json(report))
}

fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        "mp4" => "video/mp4",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
