use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::transcription::Transcription;

/// Lifecycle status of an uploaded file.
///
/// `pending → processing → completed | error`. Terminal states are never
/// left again; a record is only removed by an explicit delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl FileStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Error)
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileStatus::Pending => "pending",
            FileStatus::Processing => "processing",
            FileStatus::Completed => "completed",
            FileStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// One uploaded audio artifact and its transcription lifecycle.
///
/// Invariant: at most one of `transcription` / `error` is present, and only
/// in the matching terminal status. The `mark_processing` / `complete` /
/// `fail` helpers are the only writers of that triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_id: Uuid,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    /// Local filesystem location of the stored audio bytes.
    pub path: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<Transcription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn new(
        file_id: Uuid,
        original_name: String,
        size: u64,
        mime_type: String,
        path: PathBuf,
    ) -> Self {
        let now = Utc::now();
        FileRecord {
            file_id,
            original_name,
            size,
            mime_type,
            path,
            status: FileStatus::Pending,
            transcription: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Transition to `processing`, clearing any stale outcome fields.
    pub fn mark_processing(&mut self) {
        self.status = FileStatus::Processing;
        self.transcription = None;
        self.error = None;
        self.updated_at = Utc::now();
    }

    /// Terminal success: attach the transcript and stamp `completed_at`.
    pub fn complete(&mut self, transcription: Transcription) {
        let now = Utc::now();
        self.status = FileStatus::Completed;
        self.transcription = Some(transcription);
        self.error = None;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Terminal failure: attach the error message.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = FileStatus::Error;
        self.error = Some(message.into());
        self.transcription = None;
        self.updated_at = Utc::now();
    }
}

/// Trimmed record shape for list responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecordSummary {
    pub file_id: Uuid,
    pub original_name: String,
    pub size: u64,
    pub status: FileStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileRecordSummary {
    fn from(record: &FileRecord) -> Self {
        FileRecordSummary {
            file_id: record.file_id,
            original_name: record.original_name.clone(),
            size: record.size,
            status: record.status,
            created_at: record.created_at,
        }
    }
}

/// Response body for a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResponse {
    pub file_id: Uuid,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    pub status: FileStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileUploadResponse {
    fn from(record: &FileRecord) -> Self {
        FileUploadResponse {
            file_id: record.file_id,
            original_name: record.original_name.clone(),
            size: record.size,
            mime_type: record.mime_type.clone(),
            status: record.status,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentence;

    fn sample_record() -> FileRecord {
        FileRecord::new(
            Uuid::new_v4(),
            "sample.mp3".to_string(),
            10_240,
            "audio/mpeg".to_string(),
            PathBuf::from("uploads/sample.mp3"),
        )
    }

    #[test]
    fn test_new_record_is_pending_without_outcome() {
        let record = sample_record();
        assert_eq!(record.status, FileStatus::Pending);
        assert!(record.transcription.is_none());
        assert!(record.error.is_none());
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn test_complete_sets_exactly_one_outcome() {
        let mut record = sample_record();
        record.mark_processing();
        record.complete(Transcription::plain("hello"));
        assert_eq!(record.status, FileStatus::Completed);
        assert!(record.transcription.is_some());
        assert!(record.error.is_none());
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_fail_sets_exactly_one_outcome() {
        let mut record = sample_record();
        record.mark_processing();
        record.fail("vendor task FAILED");
        assert_eq!(record.status, FileStatus::Error);
        assert!(record.transcription.is_none());
        assert_eq!(record.error.as_deref(), Some("vendor task FAILED"));
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn test_json_round_trip_preserves_every_field() {
        let mut record = sample_record();
        record.complete(Transcription {
            text: "你好 世界".to_string(),
            sentences: vec![Sentence {
                text: "你好 世界".to_string(),
                begin_time: Some(120),
                end_time: Some(980),
            }],
            request_id: Some("req-123".to_string()),
            mock: false,
        });

        let json = serde_json::to_string_pretty(&record).unwrap();
        let restored: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, restored);
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let record = sample_record();
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("fileId").is_some());
        assert!(value.get("originalName").is_some());
        assert!(value.get("mimeType").is_some());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value.get("status").unwrap(), "pending");
    }
}
