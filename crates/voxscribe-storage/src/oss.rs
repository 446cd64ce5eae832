use crate::keys::{generate_object_key, infer_content_type, upload_attributes};
use crate::traits::{ObjectStorage, StorageError, StorageResult, StorageUpload};
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutOptions, PutPayload, Result as ObjectResult};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use voxscribe_core::config::OssConfig;
use voxscribe_core::StorageBackend;

/// Presigned GET expiry for vendor fetches. The vendor downloads the audio
/// shortly after submission; 7 days leaves ample slack for retries.
const PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 3600);

/// Aliyun OSS storage backend, reached over the S3-compatible endpoint.
///
/// OSS buckets are private here, so the vendor-reachable URL is a presigned
/// GET rather than a plain object URL.
#[derive(Clone, Debug)]
pub struct OssStorage {
    store: AmazonS3,
    bucket: String,
    region: String,
}

impl OssStorage {
    pub fn new(config: &OssConfig) -> StorageResult<Self> {
        let access_key_id = config.access_key_id.clone().ok_or_else(|| {
            StorageError::ConfigError("ALIYUN_ACCESS_KEY_ID not configured".to_string())
        })?;
        let access_key_secret = config.access_key_secret.clone().ok_or_else(|| {
            StorageError::ConfigError("ALIYUN_ACCESS_KEY_SECRET not configured".to_string())
        })?;
        let bucket = config.bucket.clone().ok_or_else(|| {
            StorageError::ConfigError("ALIYUN_OSS_BUCKET not configured".to_string())
        })?;

        let endpoint = format!("https://s3.{}.aliyuncs.com", config.region);
        let store = AmazonS3Builder::new()
            .with_bucket_name(bucket.clone())
            .with_region(config.region.clone())
            .with_endpoint(endpoint)
            .with_access_key_id(access_key_id)
            .with_secret_access_key(access_key_secret)
            .with_virtual_hosted_style_request(true)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(OssStorage {
            store,
            bucket,
            region: config.region.clone(),
        })
    }
}

#[async_trait]
impl ObjectStorage for OssStorage {
    async fn upload(
        &self,
        local_path: &Path,
        object_key: Option<&str>,
        content_type: Option<&str>,
    ) -> StorageResult<StorageUpload> {
        if !fs::try_exists(local_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(local_path.display().to_string()));
        }

        let key = object_key
            .map(String::from)
            .unwrap_or_else(|| generate_object_key(local_path));
        let content_type = content_type.unwrap_or_else(|| infer_content_type(local_path));

        let data = fs::read(local_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to read local file {}: {}",
                local_path.display(),
                e
            ))
        })?;
        let size = data.len() as u64;
        let bytes = Bytes::from(data);
        let location = ObjectPath::from(key.clone());

        let start = std::time::Instant::now();

        let options = PutOptions {
            attributes: upload_attributes(content_type),
            ..Default::default()
        };
        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(bytes), options)
            .await;

        let put_result = result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "OSS upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let signed: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, PRESIGN_EXPIRY)
            .await;
        let public_url = signed
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        tracing::info!(
            bucket = %self.bucket,
            region = %self.region,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "OSS upload successful"
        );

        Ok(StorageUpload {
            object_key: key,
            public_url,
            etag: put_result.e_tag,
            backend: StorageBackend::Oss,
        })
    }

    async fn delete(&self, object_key: &str) -> StorageResult<()> {
        let location = ObjectPath::from(object_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) => {}
            // Deleting a missing object is a success, not an error.
            Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %object_key,
                    "OSS delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(bucket = %self.bucket, key = %object_key, "OSS delete successful");
        Ok(())
    }

    async fn exists(&self, object_key: &str) -> StorageResult<bool> {
        let location = ObjectPath::from(object_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Oss
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> OssConfig {
        OssConfig {
            region: "oss-cn-beijing".to_string(),
            access_key_id: Some("key-id".to_string()),
            access_key_secret: Some("key-secret".to_string()),
            bucket: Some("voxscribe-audio".to_string()),
        }
    }

    #[test]
    fn test_new_with_full_config() {
        assert!(OssStorage::new(&full_config()).is_ok());
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let mut config = full_config();
        config.access_key_secret = None;
        let err = OssStorage::new(&config).unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
        assert!(err.to_string().contains("ALIYUN_ACCESS_KEY_SECRET"));
    }

    #[test]
    fn test_missing_bucket_is_config_error() {
        let mut config = full_config();
        config.bucket = None;
        assert!(matches!(
            OssStorage::new(&config),
            Err(StorageError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_missing_local_file_is_not_found() {
        let storage = OssStorage::new(&full_config()).unwrap();
        let result = storage
            .upload(Path::new("/nonexistent/audio.mp3"), None, None)
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
