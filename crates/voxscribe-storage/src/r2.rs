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
use voxscribe_core::config::R2Config;
use voxscribe_core::StorageBackend;

const PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 3600);

/// Cloudflare R2 storage backend (S3-compatible endpoint
/// `https://{account_id}.r2.cloudflarestorage.com`).
///
/// When the bucket has a public URL configured, vendor-reachable URLs are
/// `{public_url}/{key}`; otherwise a presigned GET is generated, same as OSS.
#[derive(Clone, Debug)]
pub struct R2Storage {
    store: AmazonS3,
    bucket: String,
    public_url: Option<String>,
}

impl R2Storage {
    pub fn new(config: &R2Config) -> StorageResult<Self> {
        let account_id = config
            .account_id
            .clone()
            .ok_or_else(|| StorageError::ConfigError("R2_ACCOUNT_ID not configured".to_string()))?;
        let access_key_id = config.access_key_id.clone().ok_or_else(|| {
            StorageError::ConfigError("R2_ACCESS_KEY_ID not configured".to_string())
        })?;
        let secret_access_key = config.secret_access_key.clone().ok_or_else(|| {
            StorageError::ConfigError("R2_SECRET_ACCESS_KEY not configured".to_string())
        })?;
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| StorageError::ConfigError("R2_BUCKET_NAME not configured".to_string()))?;

        let endpoint = format!("https://{}.r2.cloudflarestorage.com", account_id);
        let store = AmazonS3Builder::new()
            .with_bucket_name(bucket.clone())
            .with_region("auto")
            .with_endpoint(endpoint)
            .with_access_key_id(access_key_id)
            .with_secret_access_key(secret_access_key)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(R2Storage {
            store,
            bucket,
            public_url: config.public_url.clone(),
        })
    }

    async fn vendor_url(&self, location: &ObjectPath, key: &str) -> StorageResult<String> {
        if let Some(ref base) = self.public_url {
            return Ok(format!("{}/{}", base.trim_end_matches('/'), key));
        }
        let signed: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, location, PRESIGN_EXPIRY)
            .await;
        Ok(signed
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string())
    }
}

#[async_trait]
impl ObjectStorage for R2Storage {
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
                "R2 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let public_url = self.vendor_url(&location, &key).await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "R2 upload successful"
        );

        Ok(StorageUpload {
            object_key: key,
            public_url,
            etag: put_result.e_tag,
            backend: StorageBackend::R2,
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
                    "R2 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(bucket = %self.bucket, key = %object_key, "R2 delete successful");
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
        StorageBackend::R2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> R2Config {
        R2Config {
            account_id: Some("0123456789abcdef".to_string()),
            access_key_id: Some("key-id".to_string()),
            secret_access_key: Some("key-secret".to_string()),
            bucket: Some("voxscribe-audio".to_string()),
            public_url: Some("https://cdn.example.com/".to_string()),
        }
    }

    #[test]
    fn test_new_with_full_config() {
        assert!(R2Storage::new(&full_config()).is_ok());
    }

    #[test]
    fn test_missing_account_id_is_config_error() {
        let mut config = full_config();
        config.account_id = None;
        let err = R2Storage::new(&config).unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
        assert!(err.to_string().contains("R2_ACCOUNT_ID"));
    }

    #[tokio::test]
    async fn test_public_url_joins_key_without_double_slash() {
        let storage = R2Storage::new(&full_config()).unwrap();
        let location = ObjectPath::from("audio/abc-sample.mp3".to_string());
        let url = storage
            .vendor_url(&location, "audio/abc-sample.mp3")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/audio/abc-sample.mp3");
    }

    #[tokio::test]
    async fn test_upload_missing_local_file_is_not_found() {
        let storage = R2Storage::new(&full_config()).unwrap();
        let result = storage
            .upload(Path::new("/nonexistent/audio.mp3"), None, None)
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
