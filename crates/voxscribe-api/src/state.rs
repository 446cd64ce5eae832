use std::sync::Arc;
use std::time::Instant;

use voxscribe_core::Config;
use voxscribe_storage::ObjectStorage;
use voxscribe_store::FileStore;
use voxscribe_transcribe::DashScopeClient;

/// Shared application state, constructed once at startup and cloned into
/// handlers behind an `Arc`.
///
/// `storage` and `transcriber` are populated together: when no vendor API
/// credential is configured both stay `None` and the transcription workflow
/// runs in mock mode without touching cloud storage.
pub struct AppState {
    pub config: Config,
    pub store: Arc<FileStore>,
    pub storage: Option<Arc<dyn ObjectStorage>>,
    pub transcriber: Option<DashScopeClient>,
    pub started_at: Instant,
}

impl AppState {
    pub fn mock_mode(&self) -> bool {
        self.transcriber.is_none()
    }
}
