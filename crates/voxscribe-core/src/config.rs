//! Configuration module
//!
//! Environment-driven configuration, loaded once at startup and injected into
//! the services that need it. Missing vendor credentials are not a startup
//! error (the transcription client falls back to mock mode); missing storage
//! credentials surface as a `Configuration` error when the storage client is
//! constructed.

use std::env;
use std::path::PathBuf;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
const DEFAULT_ALLOWED_FORMATS: &str = "mp3,wav,m4a,flac";
const DEFAULT_POLL_MAX_RETRIES: u32 = 10;
const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;
const DEFAULT_TRANSCRIBE_MODEL: &str = "sensevoice-v1";
const DEFAULT_LANGUAGE: &str = "zh";

/// Aliyun OSS credentials (used when `DEFAULT_STORAGE=OSS`).
#[derive(Clone, Debug)]
pub struct OssConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub bucket: Option<String>,
}

/// Cloudflare R2 credentials (used when `DEFAULT_STORAGE=R2`).
#[derive(Clone, Debug)]
pub struct R2Config {
    pub account_id: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub bucket: Option<String>,
    /// Public bucket URL; when unset, presigned GET URLs are generated instead.
    pub public_url: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    environment: String,
    cors_origins: Vec<String>,
    data_dir: PathBuf,
    uploads_dir: PathBuf,
    max_file_size_bytes: u64,
    allowed_extensions: Vec<String>,
    storage_backend: StorageBackend,
    oss: OssConfig,
    r2: R2Config,
    dashscope_api_key: Option<String>,
    transcribe_model: String,
    language: String,
    poll_max_retries: u32,
    poll_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let allowed_extensions = env::var("ALLOWED_FORMATS")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_FORMATS.to_string())
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let storage_backend = env::var("DEFAULT_STORAGE")
            .unwrap_or_else(|_| "OSS".to_string())
            .parse::<StorageBackend>()?;

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_file_size_bytes: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            allowed_extensions,
            storage_backend,
            oss: OssConfig {
                region: env::var("ALIYUN_OSS_REGION")
                    .unwrap_or_else(|_| "oss-cn-beijing".to_string()),
                access_key_id: env::var("ALIYUN_ACCESS_KEY_ID").ok(),
                access_key_secret: env::var("ALIYUN_ACCESS_KEY_SECRET").ok(),
                bucket: env::var("ALIYUN_OSS_BUCKET").ok(),
            },
            r2: R2Config {
                account_id: env::var("R2_ACCOUNT_ID").ok(),
                access_key_id: env::var("R2_ACCESS_KEY_ID").ok(),
                secret_access_key: env::var("R2_SECRET_ACCESS_KEY").ok(),
                bucket: env::var("R2_BUCKET_NAME").ok(),
                public_url: env::var("R2_PUBLIC_URL").ok(),
            },
            dashscope_api_key: env::var("DASHSCOPE_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            transcribe_model: env::var("TRANSCRIBE_MODEL")
                .unwrap_or_else(|_| DEFAULT_TRANSCRIBE_MODEL.to_string()),
            language: env::var("TRANSCRIBE_LANGUAGE")
                .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string()),
            poll_max_retries: env::var("TRANSCRIBE_POLL_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_POLL_MAX_RETRIES),
            poll_interval_ms: env::var("TRANSCRIBE_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        })
    }

    /// Fail fast on configuration that can never serve requests.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE must be greater than zero"));
        }
        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_FORMATS must list at least one extension"
            ));
        }
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn uploads_dir(&self) -> &PathBuf {
        &self.uploads_dir
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    pub fn oss(&self) -> &OssConfig {
        &self.oss
    }

    pub fn r2(&self) -> &R2Config {
        &self.r2
    }

    pub fn dashscope_api_key(&self) -> Option<&str> {
        self.dashscope_api_key.as_deref()
    }

    pub fn transcribe_model(&self) -> &str {
        &self.transcribe_model
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn poll_max_retries(&self) -> u32 {
        self.poll_max_retries
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Test-oriented constructor: mock transcription, temp-style directories,
    /// explicit limits. Storage credentials stay unset.
    pub fn for_tests(data_dir: PathBuf, uploads_dir: PathBuf) -> Self {
        Config {
            server_port: 0,
            environment: "test".to_string(),
            cors_origins: vec!["*".to_string()],
            data_dir,
            uploads_dir,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_FORMATS
                .split(',')
                .map(String::from)
                .collect(),
            storage_backend: StorageBackend::Oss,
            oss: OssConfig {
                region: "oss-cn-beijing".to_string(),
                access_key_id: None,
                access_key_secret: None,
                bucket: None,
            },
            r2: R2Config {
                account_id: None,
                access_key_id: None,
                secret_access_key: None,
                bucket: None,
                public_url: None,
            },
            dashscope_api_key: None,
            transcribe_model: DEFAULT_TRANSCRIBE_MODEL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            poll_max_retries: DEFAULT_POLL_MAX_RETRIES,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    #[doc(hidden)]
    pub fn set_max_file_size_bytes(&mut self, bytes: u64) {
        self.max_file_size_bytes = bytes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_tests_defaults() {
        let config = Config::for_tests(PathBuf::from("data"), PathBuf::from("uploads"));
        assert_eq!(config.max_file_size_bytes(), DEFAULT_MAX_FILE_SIZE);
        assert_eq!(
            config.allowed_extensions(),
            &["mp3", "wav", "m4a", "flac"]
        );
        assert_eq!(config.poll_max_retries(), 10);
        assert_eq!(config.poll_interval_ms(), 3000);
        assert!(config.dashscope_api_key().is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_validate_rejects_empty_extensions() {
        let mut config = Config::for_tests(PathBuf::from("data"), PathBuf::from("uploads"));
        config.allowed_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_wildcard_cors_in_production() {
        let mut config = Config::for_tests(PathBuf::from("data"), PathBuf::from("uploads"));
        config.environment = "production".to_string();
        assert!(config.validate().is_err());
        config.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(config.validate().is_ok());
    }
}
