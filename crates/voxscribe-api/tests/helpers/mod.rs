//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p voxscribe-api`. The app is
//! assembled in mock mode (no vendor credential, no object storage) on top
//! of temporary data and upload directories.

use std::sync::Arc;
use std::time::Instant;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::Value;
use tempfile::TempDir;
use voxscribe_api::constants;
use voxscribe_api::setup::routes;
use voxscribe_api::state::AppState;
use voxscribe_core::Config;
use voxscribe_store::FileStore;

/// API path prefix for tests (e.g. `/api/v1`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus the temp directories backing it.
pub struct TestApp {
    pub server: TestServer,
    pub _data_dir: TempDir,
    pub _uploads_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn uploads_path(&self) -> &std::path::Path {
        self._uploads_dir.path()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup test app in mock mode, with a hook to adjust configuration.
pub async fn setup_test_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let data_dir = TempDir::new().expect("create data dir");
    let uploads_dir = TempDir::new().expect("create uploads dir");

    let mut config = Config::for_tests(
        data_dir.path().to_path_buf(),
        uploads_dir.path().to_path_buf(),
    );
    adjust(&mut config);

    let store = FileStore::new(config.data_dir().clone())
        .await
        .expect("create file store");

    let state = Arc::new(AppState {
        config: config.clone(),
        store: Arc::new(store),
        storage: None,
        transcriber: None,
        started_at: Instant::now(),
    });

    let router = routes::setup_routes(&config, state).expect("build router");
    let server = TestServer::new(router).expect("start test server");

    TestApp {
        server,
        _data_dir: data_dir,
        _uploads_dir: uploads_dir,
    }
}

/// Build a multipart form carrying one audio file under the expected field.
pub fn audio_form(file_name: &str, bytes: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "audioFile",
        Part::bytes(bytes)
            .file_name(file_name)
            .mime_type("audio/mpeg"),
    )
}

/// Upload a small audio file and return its id.
pub async fn upload_sample(app: &TestApp, file_name: &str) -> String {
    let response = app
        .client()
        .post(&api_path("/files"))
        .multipart(audio_form(file_name, b"fake mp3 bytes".to_vec()))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    body["data"]["fileId"]
        .as_str()
        .expect("fileId in upload response")
        .to_string()
}
