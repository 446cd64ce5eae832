//! Background transcription workflow.
//!
//! Runs after the submit endpoint has already flipped the record to
//! `processing` and responded 202: upload the audio to object storage,
//! submit its URL to the vendor, poll until terminal, then fold the outcome
//! back onto the record. Without a vendor credential the whole pipeline is
//! replaced by the mock fallback and object storage is never touched.

use std::sync::Arc;
use std::time::Instant;

use voxscribe_core::{FileRecord, Transcription};
use voxscribe_transcribe::{mock_transcribe, PollSettings, SubmitOutcome, TranscribeOptions};

use crate::state::AppState;

pub async fn run_transcription(
    state: Arc<AppState>,
    record: FileRecord,
    options: TranscribeOptions,
) {
    let started = Instant::now();
    let file_id = record.file_id;

    let outcome = match &state.transcriber {
        None => Ok(mock_transcribe(&record.original_name).await),
        Some(client) => transcribe_via_vendor(&state, &record, client, &options).await,
    };

    let result = match outcome {
        Ok(transcription) => {
            state
                .store
                .update(file_id, |r| r.complete(transcription))
                .await
        }
        Err(message) => {
            tracing::warn!(file_id = %file_id, error = %message, "Transcription workflow failed");
            state.store.update(file_id, |r| r.fail(message)).await
        }
    };

    match result {
        Ok(final_record) => {
            tracing::info!(
                file_id = %file_id,
                status = %final_record.status,
                duration_ms = started.elapsed().as_millis() as u64,
                "Transcription workflow finished"
            );
        }
        Err(e) => {
            // The outcome could not be persisted; the record stays in
            // `processing` until resubmitted.
            tracing::error!(
                file_id = %file_id,
                error = %e,
                "Failed to persist transcription outcome"
            );
        }
    }
}

async fn transcribe_via_vendor(
    state: &Arc<AppState>,
    record: &FileRecord,
    client: &voxscribe_transcribe::DashScopeClient,
    options: &TranscribeOptions,
) -> Result<Transcription, String> {
    let Some(storage) = state.storage.clone() else {
        return Err("Object storage is not configured".to_string());
    };

    let upload = storage
        .upload(&record.path, None, Some(&record.mime_type))
        .await
        .map_err(|e| format!("Upload to object storage failed: {}", e))?;

    let settings = PollSettings::from_config(&state.config);

    let result = match client.submit(&upload.public_url, options).await {
        Ok(SubmitOutcome::Completed(transcription)) => Ok(transcription),
        Ok(SubmitOutcome::Task(task_id)) => client
            .poll_task(&task_id, settings)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    // The object only existed for the vendor to fetch; remove it regardless
    // of outcome, off the critical path.
    let object_key = upload.object_key.clone();
    tokio::spawn(async move {
        if let Err(e) = storage.delete(&object_key).await {
            tracing::warn!(
                object_key = %object_key,
                error = %e,
                "Failed to cleanup storage object after transcription"
            );
        }
    });

    result
}
