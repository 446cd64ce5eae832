pub mod file_delete;
pub mod file_get;
pub mod file_list;
pub mod file_upload;
pub mod health;
pub mod transcription;

use uuid::Uuid;
use voxscribe_core::AppError;

use crate::error::HttpAppError;

/// Parse a path segment as a file id, rendering failures in the standard
/// error envelope instead of axum's default rejection.
pub(crate) fn parse_file_id(raw: &str) -> Result<Uuid, HttpAppError> {
    Uuid::parse_str(raw)
        .map_err(|_| HttpAppError(AppError::InvalidInput(format!("Invalid file id: {}", raw))))
}
