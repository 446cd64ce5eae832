//! Error types module
//!
//! All errors are unified under the `AppError` enum, which covers request
//! validation, record lookup, cloud storage, and vendor API failures.
//! `ErrorMetadata` lets each variant self-describe its HTTP response
//! characteristics so the API layer stays a thin mapping.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FILE_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Suggested action for the client (e.g., "Retry after a short delay")
    fn suggested_action(&self) -> Option<&'static str>;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Vendor API error ({status}): {message}")]
    VendorApi {
        status: u16,
        message: String,
        /// Raw vendor error payload, preserved for diagnostics.
        payload: Option<serde_json::Value>,
    },

    #[error("Malformed vendor response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata per variant:
/// (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
#[allow(clippy::type_complexity)]
fn app_error_static_metadata(
    err: &AppError,
) -> (u16, &'static str, bool, Option<&'static str>, bool, LogLevel) {
    match err {
        AppError::InvalidInput(_) => (400, "INVALID_REQUEST", false, None, false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "FILE_NOT_FOUND", false, None, false, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (
            413,
            "FILE_TOO_LARGE",
            false,
            Some("Upload a smaller file or raise MAX_FILE_SIZE"),
            false,
            LogLevel::Debug,
        ),
        AppError::VendorApi { .. } => (
            502,
            "API_ERROR",
            true,
            Some("Retry after a short delay"),
            false,
            LogLevel::Error,
        ),
        AppError::MalformedResponse(_) => (502, "API_ERROR", false, None, false, LogLevel::Error),
        AppError::Configuration(_) => {
            (500, "CONFIGURATION_ERROR", false, None, true, LogLevel::Error)
        }
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry the request"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) => (
            500,
            "SERVER_ERROR",
            true,
            Some("Retry the request"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "SERVER_ERROR",
            true,
            Some("Retry the request"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::VendorApi { .. } => "VendorApi",
            AppError::MalformedResponse(_) => "MalformedResponse",
            AppError::Configuration(_) => "Configuration",
            AppError::Storage(_) => "Storage",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including the source chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::PayloadTooLarge(msg) => msg.clone(),
            AppError::VendorApi { message, .. } => {
                format!("Speech recognition service error: {}", message)
            }
            AppError::MalformedResponse(_) => {
                "Speech recognition service returned an unexpected response".to_string()
            }
            AppError::Configuration(_) => "Service is not configured correctly".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
