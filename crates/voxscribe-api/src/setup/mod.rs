//! Application setup and initialization
//!
//! All startup wiring lives here so `main.rs` stays a thin entry point and
//! integration tests can assemble the same application without a socket.

pub mod routes;
pub mod server;
pub mod telemetry;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use voxscribe_core::Config;
use voxscribe_storage::create_object_storage;
use voxscribe_store::FileStore;
use voxscribe_transcribe::DashScopeClient;

use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    let store = FileStore::new(config.data_dir().clone())
        .await
        .context("Failed to initialize file store")?;
    tokio::fs::create_dir_all(config.uploads_dir())
        .await
        .with_context(|| {
            format!(
                "Failed to create uploads directory {}",
                config.uploads_dir().display()
            )
        })?;

    // Storage and the vendor client stand or fall together: without an API
    // credential the workflow runs in mock mode and needs neither.
    let (storage, transcriber) = match config.dashscope_api_key() {
        Some(api_key) => {
            let storage =
                create_object_storage(&config).context("Failed to initialize object storage")?;
            let client = DashScopeClient::new(api_key)
                .context("Failed to initialize transcription client")?;
            tracing::info!(backend = %config.storage_backend(), "Transcription vendor configured");
            (Some(storage), Some(client))
        }
        None => {
            tracing::warn!(
                "No vendor API credential configured, transcriptions will return mock results"
            );
            (None, None)
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        store: Arc::new(store),
        storage,
        transcriber,
        started_at: Instant::now(),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
