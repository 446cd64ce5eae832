//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>`. Use
//! `AppError` (or types that implement `Into<AppError>`) for errors and `.map_err(Into::into)`
//! so they become `HttpAppError` and render consistently (status, body, logging).

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use voxscribe_core::{AppError, ErrorMetadata, LogLevel};
use voxscribe_storage::StorageError;
use voxscribe_store::StoreError;
use voxscribe_transcribe::TranscribeError;

/// Error object nested under `error` in the response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable error code for programmatic handling
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client (e.g., "Retry after a short delay")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Full error envelope: `{ "success": false, "error": { ... } }`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorResponse {
            success: false,
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details: None,
                error_type: None,
                recoverable: false,
                suggested_action: None,
            },
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from voxscribe-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<std::io::Error> for HttpAppError {
    fn from(err: std::io::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        // Body-limit layers cut oversized streams mid-read; that surfaces here
        // as a multipart read failure and must keep its 413, not become a 400.
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return HttpAppError(AppError::PayloadTooLarge(err.body_text()));
        }
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid multipart request: {}",
            err.body_text()
        )))
    }
}

impl From<StoreError> for HttpAppError {
    fn from(err: StoreError) -> Self {
        let app = match err {
            StoreError::NotFound(file_id) => {
                AppError::NotFound(format!("File record not found: {}", file_id))
            }
            StoreError::ReadFailed(msg) | StoreError::WriteFailed(msg) => AppError::Storage(msg),
            StoreError::Io(e) => AppError::Internal(format!("IO error: {}", e)),
        };
        HttpAppError(app)
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::UploadFailed(msg)
            | StorageError::DeleteFailed(msg)
            | StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(e) => AppError::Internal(format!("IO error: {}", e)),
            StorageError::ConfigError(msg) => AppError::Configuration(msg),
        };
        HttpAppError(app)
    }
}

impl From<TranscribeError> for HttpAppError {
    fn from(err: TranscribeError) -> Self {
        HttpAppError(AppError::from(err))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Always hide details in production for security; in non-production, only show details for non-sensitive errors.
        let body = if is_production || app_error.is_sensitive() {
            ErrorResponse {
                success: false,
                error: ErrorBody {
                    code: app_error.error_code().to_string(),
                    message: app_error.client_message(),
                    details: None,
                    error_type: None,
                    recoverable: app_error.is_recoverable(),
                    suggested_action: app_error.suggested_action().map(String::from),
                },
            }
        } else {
            ErrorResponse {
                success: false,
                error: ErrorBody {
                    code: app_error.error_code().to_string(),
                    message: app_error.client_message(),
                    details: Some(app_error.detailed_message()),
                    error_type: Some(app_error.error_type().to_string()),
                    recoverable: app_error.is_recoverable(),
                    suggested_action: app_error.suggested_action().map(String::from),
                },
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_from_store_error_not_found() {
        let file_id = Uuid::new_v4();
        let HttpAppError(app_err) = StoreError::NotFound(file_id).into();
        match app_err {
            AppError::NotFound(msg) => assert!(msg.contains(&file_id.to_string())),
            other => panic!("Expected NotFound variant, got {other:?}"),
        }
    }

    #[test]
    fn test_from_storage_error_config() {
        let HttpAppError(app_err) =
            StorageError::ConfigError("ALIYUN_OSS_BUCKET is not set".to_string()).into();
        match app_err {
            AppError::Configuration(msg) => assert!(msg.contains("ALIYUN_OSS_BUCKET")),
            other => panic!("Expected Configuration variant, got {other:?}"),
        }
    }

    #[test]
    fn test_from_transcribe_error_vendor() {
        let err = TranscribeError::VendorApi {
            status: 429,
            message: "Throttling".to_string(),
            payload: None,
        };
        let HttpAppError(app_err) = err.into();
        assert_eq!(app_err.error_code(), "API_ERROR");
        assert_eq!(app_err.http_status_code(), 502);
    }

    /// Verifies the public error envelope: `success: false` plus a nested
    /// `error` object with `code`, `message`, and `recoverable`.
    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse::new("FILE_NOT_FOUND", "File record not found");
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "FILE_NOT_FOUND");
        assert!(json["error"]["message"].as_str().is_some());
        assert_eq!(json["error"]["recoverable"], false);
        assert!(json["error"].get("suggestedAction").is_none());
    }

    #[test]
    fn test_error_response_carries_suggested_action() {
        let app_error = AppError::PayloadTooLarge("too big".to_string());
        let response = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: app_error.error_code().to_string(),
                message: app_error.client_message(),
                details: None,
                error_type: None,
                recoverable: app_error.is_recoverable(),
                suggested_action: app_error.suggested_action().map(String::from),
            },
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(
            json["error"]["suggestedAction"],
            "Upload a smaller file or raise MAX_FILE_SIZE"
        );
    }
}
