use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Multipart, State};

use crate::error::ApiError;
use crate::models::ExtractResponse;
use crate::state::AppState;
use crate::upload;

/// `POST /extract`: validate the upload, then run the extractor on the
/// blocking pool.
pub async fn extract(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, ApiError> {
    let file = upload::parse_upload(multipart, state.max_upload_mb()).await?;
    let filename = file.filename.clone();
    tracing::info!(file = %filename, bytes = file.data.len(), "extracting upload");

    let started = Instant::now();
    let text = tokio::task::spawn_blocking(move || {
        scribe_ingest::extract_bytes(&file.filename, file.data, &state.extractor)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("extraction task failed: {e}")))??;

    tracing::info!(
        file = %filename,
        chars = text.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "extraction finished"
    );
    Ok(Json(ExtractResponse { text }))
}
