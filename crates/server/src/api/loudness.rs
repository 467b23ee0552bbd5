//! Upload endpoints: `/analyze` and `/normalize`.

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use loudnorm_core::{AnalysisOutcome, Upload};

use super::error::ApiError;
use crate::metrics::UPLOADED_FILES_TOTAL;
use crate::state::AppState;

/// Multipart field carrying the audio files.
pub const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub results: Vec<AnalysisOutcome>,
}

/// Collects every `files` part of the form, in order. Other fields are ignored.
async fn read_uploads(endpoint: &str, mut multipart: Multipart) -> Result<Vec<Upload>, ApiError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await?;
        uploads.push(Upload::new(filename, content));
    }

    UPLOADED_FILES_TOTAL
        .with_label_values(&[endpoint])
        .inc_by(uploads.len() as u64);
    Ok(uploads)
}

/// POST /analyze
///
/// Measures each uploaded file. Per-file failures are reported inline.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let uploads = read_uploads("analyze", multipart).await?;
    info!(files = uploads.len(), "Analyze request");

    let results = state.service().analyze(uploads).await?;
    Ok(Json(AnalyzeResponse { results }))
}

/// POST /normalize
///
/// Normalizes each uploaded file and streams back a zip of the successes.
/// The request workspace lives until the body stream is dropped.
pub async fn normalize(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let uploads = read_uploads("normalize", multipart).await?;
    info!(files = uploads.len(), "Normalize request");

    let archive = state.service().normalize(uploads).await?;
    let download_name = archive.download_name();
    info!(
        session_id = %archive.session_id,
        files = archive.file_count(),
        failed = archive.failures.len(),
        "Streaming archive"
    );
    let (summary, guard) = archive.into_parts();

    // On error the guard drops here and removes the workspace.
    let file = tokio::fs::File::open(&summary.path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to open archive: {}", e)))?;

    let stream = ReaderStream::new(file).map(move |chunk| {
        let _workspace = &guard;
        chunk
    });

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", download_name))
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(summary.size_bytes)),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
