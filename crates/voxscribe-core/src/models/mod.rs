//! Data models for the application
//!
//! One uploaded audio artifact is tracked as a `FileRecord` from upload until
//! a terminal transcription outcome.

mod file_record;
mod transcription;

pub use file_record::{FileRecord, FileRecordSummary, FileStatus, FileUploadResponse};
pub use transcription::{Sentence, Transcription};
