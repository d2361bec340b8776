//! Upload and clear-last-batch handlers

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use chrono::Local;
use tracing::warn;

use crate::application::{IngestError, IngestService};
use crate::infrastructure::storage::{sanitize_filename, UploadArchive};
use crate::notifications::UploadSource;

/// Multipart field carrying the CSV document.
pub const UPLOAD_FIELD: &str = "csvfile";

#[derive(Clone)]
pub struct UploadState {
    pub ingest: Arc<IngestService>,
    pub archive: UploadArchive,
}

type FormResult = Result<Redirect, (StatusCode, String)>;

async fn read_upload(multipart: &mut Multipart) -> Result<Option<(String, Bytes)>, (StatusCode, String)> {
    let bad_request = |e: axum::extract::multipart::MultipartError| {
        (StatusCode::BAD_REQUEST, format!("Error retrieving file: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await.map_err(bad_request)?;
        return Ok(Some((filename, content)));
    }
    Ok(None)
}

/// `POST /upload`: archive the file, ingest it as today's batch, go back
/// to the dashboard.
pub async fn upload_csv(State(state): State<UploadState>, mut multipart: Multipart) -> FormResult {
    let Some((raw_name, content)) = read_upload(&mut multipart).await? else {
        return Err((StatusCode::BAD_REQUEST, "Error retrieving file".to_string()));
    };

    let today = Local::now().date_naive();
    let filename = sanitize_filename(&raw_name);

    state
        .archive
        .store(today, &filename, &content)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Save error: {}", e)))?;

    match state
        .ingest
        .ingest(content.as_ref(), today, Some(filename), UploadSource::Web)
        .await
    {
        Ok(_) => Ok(Redirect::to("/")),
        Err(IngestError::Decode(e)) => {
            warn!("Rejected upload: {}", e);
            Err((StatusCode::UNPROCESSABLE_ENTITY, format!("CSV error: {}", e)))
        }
        Err(e @ IngestError::Store(_)) => {
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("CSV error: {}", e)))
        }
    }
}

/// `POST /reset`: delete the most recent upload batch.
pub async fn clear_last_upload(State(state): State<UploadState>) -> FormResult {
    state
        .ingest
        .clear_latest_batch()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Reset error: {}", e)))?;
    Ok(Redirect::to("/"))
}
