//! VoxScribe Core Library
//!
//! This crate provides the domain models, error taxonomy, and configuration
//! shared across all VoxScribe components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{FileRecord, FileRecordSummary, FileStatus, FileUploadResponse, Sentence, Transcription};
pub use storage_types::StorageBackend;
