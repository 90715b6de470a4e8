use axum::{
    extract::{DefaultBodyLimit, Query, State},
    routing::post,
    Router,
    Json,
};
use bytes::Bytes;
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    models::{PreviewRequest, PreviewResponse, RawPreviewQuery},
    services::{
        file_loader::{self, check_size},
        render_preview,
    },
};

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/files/preview", post(preview_file))
        .route(
            "/files/preview/raw",
            post(preview_raw).layer(DefaultBodyLimit::max(max_file_size)),
        )
}

async fn preview_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let download_start = std::time::Instant::now();
    let file_data = file_loader::load_file_from_url(
        &state.http,
        &request.signed_url,
        state.config.max_file_size,
    )
    .await?;
    tracing::info!(
        "Fetched {} ({}KB) in {:?}",
        request.object_key,
        file_data.len() / 1024,
        download_start.elapsed()
    );

    run_preview(request.object_key, request.declared_file_type, file_data)
        .await
        .map(Json)
}

async fn preview_raw(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RawPreviewQuery>,
    body: Bytes,
) -> Result<Json<PreviewResponse>, AppError> {
    check_size(body.len(), state.config.max_file_size)?;
    run_preview(query.object_key, query.declared_file_type, body)
        .await
        .map(Json)
}

/// Decoding is CPU-bound, so it runs on the blocking pool.
async fn run_preview(
    object_key: String,
    declared_file_type: Option<String>,
    file_data: Bytes,
) -> Result<PreviewResponse, AppError> {
    tokio::task::spawn_blocking(move || {
        render_preview(&object_key, declared_file_type.as_deref(), file_data)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Preview task failed: {}", e)))?
}
