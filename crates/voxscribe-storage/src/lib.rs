//! VoxScribe Storage Library
//!
//! Cloud object-storage abstraction used as an intermediary so the speech
//! recognition vendor can fetch uploaded audio by URL. Two interchangeable
//! backends are provided - Aliyun OSS and Cloudflare R2 - both reached over
//! their S3-compatible endpoints via `object_store`. Exactly one backend is
//! selected at construction from configuration; there is no failover.
//!
//! # Object key format
//!
//! Auto-generated keys are `audio/{uuid}-{basename}`. Key generation and
//! MIME inference are centralized in the `keys` module so both backends stay
//! consistent.

pub mod factory;
pub mod keys;
pub mod oss;
pub mod r2;
pub mod traits;

// Re-export commonly used types
pub use factory::create_object_storage;
pub use oss::OssStorage;
pub use r2::R2Storage;
pub use traits::{ObjectStorage, StorageError, StorageResult, StorageUpload};
pub use voxscribe_core::StorageBackend;
