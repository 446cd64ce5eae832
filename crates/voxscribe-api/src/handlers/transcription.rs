use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voxscribe_core::{AppError, FileRecord, FileStatus, Transcription};
use voxscribe_transcribe::TranscribeOptions;

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::parse_file_id;
use crate::response::ApiResponse;
use crate::services::workflow;
use crate::state::AppState;

/// Optional per-request overrides; anything unset falls back to configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscribeRequest {
    pub language: Option<String>,
    pub punctuation: Option<bool>,
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionStatusBody {
    pub file_id: Uuid,
    pub status: FileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptionStatusBody {
    fn from_record(record: &FileRecord) -> Self {
        TranscriptionStatusBody {
            file_id: record.file_id,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
            completed_at: record.completed_at,
            error: record.error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionResultBody {
    pub file_id: Uuid,
    pub status: FileStatus,
    pub transcription: Transcription,
}

/// Accept a transcription request and run the workflow in the background.
/// Responds 202 immediately; progress is observed via the status endpoint.
#[tracing::instrument(skip(state, request), fields(operation = "submit_transcription"))]
pub async fn submit_transcription(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    request: Option<Json<TranscribeRequest>>,
) -> Result<Response, HttpAppError> {
    let file_id = parse_file_id(&file_id)?;
    let record = state.store.get(file_id).await?;

    if record.status == FileStatus::Processing {
        return Err(HttpAppError(AppError::InvalidInput(format!(
            "Transcription already in progress for file {}",
            file_id
        ))));
    }
    if !tokio::fs::try_exists(&record.path).await.unwrap_or(false) {
        return Err(HttpAppError(AppError::NotFound(format!(
            "Audio file missing for record {}",
            file_id
        ))));
    }

    let mut options = TranscribeOptions::from_config(&state.config);
    if let Some(Json(request)) = request {
        if let Some(language) = request.language {
            options.language = language;
        }
        if let Some(punctuation) = request.punctuation {
            options.punctuation = punctuation;
        }
        options.sample_rate = request.sample_rate.or(options.sample_rate);
    }

    // Flip to processing before spawning so a second submit cannot race in.
    let updated = state.store.update(file_id, |r| r.mark_processing()).await?;

    let task_state = state.clone();
    let task_record = updated.clone();
    tokio::spawn(async move {
        workflow::run_transcription(task_state, task_record, options).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(TranscriptionStatusBody::from_record(
            &updated,
        ))),
    )
        .into_response())
}

#[tracing::instrument(skip(state), fields(operation = "transcription_status"))]
pub async fn transcription_status(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<TranscriptionStatusBody>>, HttpAppError> {
    let file_id = parse_file_id(&file_id)?;
    let record = state.store.get(file_id).await?;
    Ok(Json(ApiResponse::ok(TranscriptionStatusBody::from_record(
        &record,
    ))))
}

/// Fetch the finished transcript. Responds 202 while the file is still
/// pending or processing, 500 when the workflow ended in error.
#[tracing::instrument(skip(state), fields(operation = "transcription_result"))]
pub async fn transcription_result(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Response, HttpAppError> {
    let file_id = parse_file_id(&file_id)?;
    let record = state.store.get(file_id).await?;

    match record.status {
        FileStatus::Completed => {
            let transcription = record.transcription.ok_or_else(|| {
                AppError::Internal(format!("Completed record {} has no transcription", file_id))
            })?;
            Ok(Json(ApiResponse::ok(TranscriptionResultBody {
                file_id,
                status: FileStatus::Completed,
                transcription,
            }))
            .into_response())
        }
        FileStatus::Pending | FileStatus::Processing => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse::ok(TranscriptionStatusBody::from_record(
                &record,
            ))),
        )
            .into_response()),
        FileStatus::Error => {
            let message = record
                .error
                .unwrap_or_else(|| "Transcription failed".to_string());
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("API_ERROR", message)),
            )
                .into_response())
        }
    }
}
