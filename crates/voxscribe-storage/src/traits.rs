//! Storage abstraction trait
//!
//! This module defines the ObjectStorage trait that both cloud backends
//! implement.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use voxscribe_core::StorageBackend;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of an object upload. Ephemeral: referenced only while the
/// transcription workflow runs, never persisted on the file record.
#[derive(Debug, Clone)]
pub struct StorageUpload {
    pub object_key: String,
    /// URL reachable by the transcription vendor.
    pub public_url: String,
    pub etag: Option<String>,
    pub backend: StorageBackend,
}

/// Storage abstraction trait
///
/// Both cloud backends (Aliyun OSS, Cloudflare R2) implement this trait so
/// the transcription workflow never couples to a specific provider.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload a local file and return the object key and a vendor-reachable URL.
    ///
    /// When `object_key` is `None` one is generated as `audio/{uuid}-{basename}`;
    /// when `content_type` is `None` it is inferred from the file extension.
    /// The local file is never deleted.
    async fn upload(
        &self,
        local_path: &Path,
        object_key: Option<&str>,
        content_type: Option<&str>,
    ) -> StorageResult<StorageUpload>;

    /// Delete an object. Idempotent: deleting a nonexistent object succeeds.
    async fn delete(&self, object_key: &str) -> StorageResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, object_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
