use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use voxscribe_core::{AppError, FileRecord, FileUploadResponse};
use voxscribe_storage::keys::infer_content_type;

use crate::error::HttpAppError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Multipart field name carrying the audio payload.
const AUDIO_FIELD: &str = "audioFile";

#[tracing::instrument(skip(state, multipart), fields(operation = "upload_file"))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let mut payload: Option<(String, Option<String>, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let original_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("'{}' must include a filename", AUDIO_FIELD))
            })?;
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;
        payload = Some((original_name, content_type, data));
        break;
    }

    let Some((original_name, content_type, data)) = payload else {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "Missing '{}' field in multipart form",
            AUDIO_FIELD
        ))));
    };

    let extension = Path::new(&original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| {
            AppError::InvalidInput(format!("Missing file extension (filename: {})", original_name))
        })?;

    if !state
        .config
        .allowed_extensions()
        .iter()
        .any(|allowed| allowed == &extension)
    {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "Unsupported format '{}', allowed: {}",
            extension,
            state.config.allowed_extensions().join(", ")
        ))));
    }

    if data.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "File is empty".to_string(),
        )));
    }
    let max_bytes = state.config.max_file_size_bytes();
    if data.len() as u64 > max_bytes {
        return Err(HttpAppError(AppError::PayloadTooLarge(format!(
            "{} bytes exceeds max {} bytes",
            data.len(),
            max_bytes
        ))));
    }

    let file_id = Uuid::new_v4();
    let dest = state
        .config
        .uploads_dir()
        .join(format!("{}.{}", file_id, extension));
    tokio::fs::create_dir_all(state.config.uploads_dir()).await?;
    tokio::fs::write(&dest, &data).await?;

    let mime_type = content_type
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
        .unwrap_or_else(|| infer_content_type(&dest).to_string());

    let record = FileRecord::new(
        file_id,
        original_name,
        data.len() as u64,
        mime_type,
        dest.clone(),
    );
    if let Err(e) = state.store.create(&record).await {
        // The record never existed; remove the orphaned binary.
        if let Err(cleanup_err) = tokio::fs::remove_file(&dest).await {
            tracing::warn!(
                error = %cleanup_err,
                path = %dest.display(),
                "Failed to cleanup upload after store error"
            );
        }
        return Err(e.into());
    }

    tracing::info!(
        file_id = %record.file_id,
        original_name = %record.original_name,
        size = record.size,
        "Audio file uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(FileUploadResponse::from(&record))),
    )
        .into_response())
}
