use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use voxscribe_core::{AppError, Config, Sentence, Transcription};

use crate::markup::strip_markup;
use crate::wire::{Manifest, SubmitResponse, TaskResponse};

const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com";
const SUBMIT_PATH: &str = "/api/v1/services/audio/asr/transcription";
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("vendor API returned {status}: {message}")]
    VendorApi {
        status: u16,
        message: String,
        payload: Option<Value>,
    },
    #[error("unrecognized vendor response: {0}")]
    MalformedResponse(String),
    #[error("transcription task failed: {0}")]
    TaskFailed(String),
    #[error("transcription task still running after {attempts} polls")]
    Timeout { attempts: u32 },
    #[error("transcription request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<TranscribeError> for AppError {
    fn from(err: TranscribeError) -> Self {
        match err {
            TranscribeError::VendorApi {
                status,
                message,
                payload,
            } => AppError::VendorApi {
                status,
                message,
                payload,
            },
            TranscribeError::MalformedResponse(msg) => AppError::MalformedResponse(msg),
            TranscribeError::TaskFailed(msg) => AppError::VendorApi {
                status: 500,
                message: msg,
                payload: None,
            },
            TranscribeError::Timeout { attempts } => AppError::VendorApi {
                status: 504,
                message: format!("task did not finish within {attempts} polls"),
                payload: None,
            },
            TranscribeError::Http(e) => AppError::VendorApi {
                status: 502,
                message: e.to_string(),
                payload: None,
            },
        }
    }
}

/// Request knobs for a transcription submission.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    pub model: String,
    pub language: String,
    pub punctuation: bool,
    pub sample_rate: Option<u32>,
}

impl TranscribeOptions {
    pub fn from_config(config: &Config) -> Self {
        TranscribeOptions {
            model: config.transcribe_model().to_string(),
            language: config.language().to_string(),
            punctuation: true,
            sample_rate: None,
        }
    }
}

/// Polling cadence for asynchronous vendor tasks.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub max_retries: u32,
    pub interval: Duration,
}

impl PollSettings {
    pub fn from_config(config: &Config) -> Self {
        PollSettings {
            max_retries: config.poll_max_retries(),
            interval: Duration::from_millis(config.poll_interval_ms()),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            max_retries: 10,
            interval: Duration::from_millis(3000),
        }
    }
}

/// Outcome of a submission: small files may come back transcribed inline,
/// larger ones return a task id to poll.
#[derive(Debug)]
pub enum SubmitOutcome {
    Completed(Transcription),
    Task(String),
}

/// HTTP client for the DashScope file-transcription service.
///
/// Constructed once at startup and shared; holds the API credential and a
/// pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct DashScopeClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl DashScopeClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, TranscribeError> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(DashScopeClient {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at a different API host. Used by tests against a
    /// local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn headers(&self, asynchronous: bool) -> Result<HeaderMap, TranscribeError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", self.api_key);
        let auth = HeaderValue::from_str(&bearer)
            .map_err(|_| TranscribeError::MalformedResponse("API key is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if asynchronous {
            headers.insert("X-DashScope-Async", HeaderValue::from_static("enable"));
        }
        Ok(headers)
    }

    /// Submits a publicly reachable audio URL for transcription.
    pub async fn submit(
        &self,
        file_url: &str,
        options: &TranscribeOptions,
    ) -> Result<SubmitOutcome, TranscribeError> {
        let mut parameters = json!({
            "language_hints": [options.language],
            "punc": options.punctuation,
        });
        if let Some(rate) = options.sample_rate {
            parameters["sample_rate"] = json!(rate);
        }
        let body = json!({
            "model": options.model,
            "input": { "file_urls": [file_url] },
            "parameters": parameters,
        });

        debug!(model = %options.model, "submitting transcription request");
        let response = self
            .http
            .post(format!("{}{}", self.base_url, SUBMIT_PATH))
            .headers(self.headers(true)?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::vendor_error(status.as_u16(), response.text().await.ok()));
        }

        let parsed: SubmitResponse = response.json().await?;
        let request_id = parsed.request_id.clone();
        match parsed.output {
            Some(output) => {
                if let Some(task_id) = output.task_id {
                    info!(task_id = %task_id, "transcription task accepted");
                    Ok(SubmitOutcome::Task(task_id))
                } else if let Some(text) = output.text {
                    info!("transcription completed synchronously");
                    let mut transcription = Transcription::plain(strip_markup(&text));
                    transcription.request_id = request_id;
                    Ok(SubmitOutcome::Completed(transcription))
                } else {
                    Err(TranscribeError::MalformedResponse(
                        "output carries neither task_id nor text".to_string(),
                    ))
                }
            }
            None => Err(TranscribeError::MalformedResponse(
                "response has no output object".to_string(),
            )),
        }
    }

    /// Polls a submitted task until it reaches a terminal state, then fetches
    /// and parses the transcription manifest.
    pub async fn poll_task(
        &self,
        task_id: &str,
        settings: PollSettings,
    ) -> Result<Transcription, TranscribeError> {
        let started = Instant::now();
        for attempt in 1..=settings.max_retries {
            tokio::time::sleep(settings.interval).await;

            let response = self
                .http
                .get(format!("{}/api/v1/tasks/{}", self.base_url, task_id))
                .headers(self.headers(false)?)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(Self::vendor_error(status.as_u16(), response.text().await.ok()));
            }

            let parsed: TaskResponse = response.json().await?;
            let request_id = parsed.request_id.clone();
            let output = parsed.output.ok_or_else(|| {
                TranscribeError::MalformedResponse("task response has no output object".to_string())
            })?;
            let task_status = output.task_status.as_deref().unwrap_or("UNKNOWN");
            debug!(task_id, attempt, task_status, "polled transcription task");

            match task_status {
                "SUCCEEDED" => {
                    let url = output
                        .results
                        .as_ref()
                        .and_then(|r| r.first())
                        .and_then(|r| r.transcription_url.clone())
                        .ok_or_else(|| {
                            TranscribeError::MalformedResponse(
                                "succeeded task carries no transcription_url".to_string(),
                            )
                        })?;
                    let mut transcription = self.fetch_manifest(&url).await?;
                    transcription.request_id = request_id;
                    info!(
                        task_id,
                        attempt,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "transcription task succeeded"
                    );
                    return Ok(transcription);
                }
                "FAILED" => {
                    let message = output
                        .message
                        .or(output.code)
                        .or_else(|| {
                            output
                                .results
                                .as_ref()
                                .and_then(|r| r.first())
                                .and_then(|r| r.message.clone())
                        })
                        .unwrap_or_else(|| "task failed without a message".to_string());
                    warn!(task_id, attempt, %message, "transcription task failed");
                    return Err(TranscribeError::TaskFailed(message));
                }
                _ => {}
            }
        }

        Err(TranscribeError::Timeout {
            attempts: settings.max_retries,
        })
    }

    /// Downloads the result manifest and extracts the first transcript.
    async fn fetch_manifest(&self, url: &str) -> Result<Transcription, TranscribeError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::vendor_error(status.as_u16(), response.text().await.ok()));
        }

        let manifest: Manifest = response.json().await?;
        let transcript = manifest
            .transcripts
            .and_then(|mut t| if t.is_empty() { None } else { Some(t.remove(0)) })
            .ok_or_else(|| {
                TranscribeError::MalformedResponse("manifest carries no transcripts".to_string())
            })?;

        let text = strip_markup(transcript.text.as_deref().unwrap_or_default());
        let sentences = transcript
            .sentences
            .into_iter()
            .filter_map(|s| {
                let raw = s.text?;
                let cleaned = strip_markup(&raw);
                if cleaned.is_empty() {
                    return None;
                }
                Some(Sentence {
                    text: cleaned,
                    begin_time: s.begin_time,
                    end_time: s.end_time,
                })
            })
            .collect();

        let mut transcription = Transcription::plain(text);
        transcription.sentences = sentences;
        Ok(transcription)
    }

    fn vendor_error(status: u16, body: Option<String>) -> TranscribeError {
        let payload = body
            .as_deref()
            .and_then(|b| serde_json::from_str::<Value>(b).ok());
        let message = payload
            .as_ref()
            .and_then(|p| p.get("message").and_then(Value::as_str))
            .map(str::to_string)
            .or(body)
            .unwrap_or_else(|| "vendor API request failed".to_string());
        TranscribeError::VendorApi {
            status,
            message,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> TranscribeOptions {
        TranscribeOptions {
            model: "sensevoice-v1".to_string(),
            language: "zh".to_string(),
            punctuation: true,
            sample_rate: None,
        }
    }

    fn fast_polling() -> PollSettings {
        PollSettings {
            max_retries: 3,
            interval: Duration::from_millis(10),
        }
    }

    fn client(server: &mockito::Server) -> DashScopeClient {
        DashScopeClient::new("test-key")
            .unwrap()
            .with_base_url(server.url())
    }

    #[tokio::test]
    async fn submit_returns_task_id_for_async_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/services/audio/asr/transcription")
            .match_header("authorization", "Bearer test-key")
            .match_header("x-dashscope-async", "enable")
            .with_status(200)
            .with_body(
                json!({ "output": { "task_id": "task-42" }, "request_id": "req-1" }).to_string(),
            )
            .create_async()
            .await;

        let outcome = client(&server)
            .submit("https://example.com/a.mp3", &options())
            .await
            .unwrap();
        mock.assert_async().await;
        match outcome {
            SubmitOutcome::Task(id) => assert_eq!(id, "task-42"),
            other => panic!("expected task outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn submit_returns_text_for_synchronous_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/services/audio/asr/transcription")
            .with_status(200)
            .with_body(
                json!({ "output": { "text": "<|zh|>你好" }, "request_id": "req-2" }).to_string(),
            )
            .create_async()
            .await;

        let outcome = client(&server)
            .submit("https://example.com/a.mp3", &options())
            .await
            .unwrap();
        match outcome {
            SubmitOutcome::Completed(t) => {
                assert_eq!(t.text, "你好");
                assert_eq!(t.request_id.as_deref(), Some("req-2"));
                assert!(!t.mock);
            }
            other => panic!("expected completed outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn submit_surfaces_vendor_error_with_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/services/audio/asr/transcription")
            .with_status(401)
            .with_body(json!({ "code": "InvalidApiKey", "message": "invalid key" }).to_string())
            .create_async()
            .await;

        let err = client(&server)
            .submit("https://example.com/a.mp3", &options())
            .await
            .unwrap_err();
        match err {
            TranscribeError::VendorApi {
                status,
                message,
                payload,
            } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid key");
                assert!(payload.is_some());
            }
            other => panic!("expected vendor error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn submit_rejects_unrecognized_shape() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/services/audio/asr/transcription")
            .with_status(200)
            .with_body(json!({ "output": {} }).to_string())
            .create_async()
            .await;

        let err = client(&server)
            .submit("https://example.com/a.mp3", &options())
            .await
            .unwrap_err();
        assert!(matches!(err, TranscribeError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn poll_fetches_manifest_on_success() {
        let mut server = mockito::Server::new_async().await;
        let manifest_path = "/results/task-42.json";
        server
            .mock("GET", "/api/v1/tasks/task-42")
            .with_status(200)
            .with_body(
                json!({
                    "output": {
                        "task_status": "SUCCEEDED",
                        "results": [{ "transcription_url": format!("{}{}", server.url(), manifest_path) }]
                    },
                    "request_id": "req-3"
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", manifest_path)
            .with_status(200)
            .with_body(
                json!({
                    "transcripts": [{
                        "text": "<|zh|>第一句。第二句。",
                        "sentences": [
                            { "text": "<|zh|>第一句。", "begin_time": 0, "end_time": 1200 },
                            { "text": "第二句。", "begin_time": 1200, "end_time": 2400 }
                        ]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let transcription = client(&server)
            .poll_task("task-42", fast_polling())
            .await
            .unwrap();
        assert_eq!(transcription.text, "第一句。第二句。");
        assert_eq!(transcription.sentences.len(), 2);
        assert_eq!(transcription.sentences[0].text, "第一句。");
        assert_eq!(transcription.sentences[1].begin_time, Some(1200));
        assert_eq!(transcription.request_id.as_deref(), Some("req-3"));
    }

    #[tokio::test]
    async fn poll_reports_failed_task_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/tasks/task-9")
            .with_status(200)
            .with_body(
                json!({ "output": { "task_status": "FAILED", "message": "audio too noisy" } })
                    .to_string(),
            )
            .create_async()
            .await;

        let err = client(&server)
            .poll_task("task-9", fast_polling())
            .await
            .unwrap_err();
        match err {
            TranscribeError::TaskFailed(msg) => assert_eq!(msg, "audio too noisy"),
            other => panic!("expected task failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn poll_times_out_after_max_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/tasks/task-slow")
            .with_status(200)
            .with_body(json!({ "output": { "task_status": "RUNNING" } }).to_string())
            .expect(3)
            .create_async()
            .await;

        let err = client(&server)
            .poll_task("task-slow", fast_polling())
            .await
            .unwrap_err();
        mock.assert_async().await;
        assert!(matches!(err, TranscribeError::Timeout { attempts: 3 }));
    }

    #[tokio::test]
    async fn poll_treats_empty_manifest_as_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/tasks/task-7")
            .with_status(200)
            .with_body(
                json!({
                    "output": {
                        "task_status": "SUCCEEDED",
                        "results": [{ "transcription_url": format!("{}/results/empty.json", server.url()) }]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/results/empty.json")
            .with_status(200)
            .with_body(json!({ "transcripts": [] }).to_string())
            .create_async()
            .await;

        let err = client(&server)
            .poll_task("task-7", fast_polling())
            .await
            .unwrap_err();
        assert!(matches!(err, TranscribeError::MalformedResponse(_)));
    }
}
