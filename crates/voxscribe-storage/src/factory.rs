use crate::{ObjectStorage, OssStorage, R2Storage, StorageBackend, StorageResult};
use std::sync::Arc;
use voxscribe_core::Config;

/// Create the object-storage backend selected by configuration.
///
/// Exactly one backend is constructed; missing credentials for the selected
/// backend fail here with a `ConfigError` rather than at first use.
pub fn create_object_storage(config: &Config) -> StorageResult<Arc<dyn ObjectStorage>> {
    match config.storage_backend() {
        StorageBackend::Oss => {
            let storage = OssStorage::new(config.oss())?;
            tracing::info!(backend = %StorageBackend::Oss, "Object storage configured");
            Ok(Arc::new(storage))
        }
        StorageBackend::R2 => {
            let storage = R2Storage::new(config.r2())?;
            tracing::info!(backend = %StorageBackend::R2, "Object storage configured");
            Ok(Arc::new(storage))
        }
    }
}
