//! Wire-level response shapes for the DashScope ASR endpoints.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub output: Option<SubmitOutput>,
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitOutput {
    pub task_id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskResponse {
    pub output: Option<TaskOutput>,
    pub request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskOutput {
    pub task_status: Option<String>,
    pub results: Option<Vec<TaskResult>>,
    pub message: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskResult {
    pub transcription_url: Option<String>,
    pub message: Option<String>,
}

/// The manifest document fetched from `transcription_url` on success.
#[derive(Debug, Deserialize)]
pub(crate) struct Manifest {
    pub transcripts: Option<Vec<ManifestTranscript>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManifestTranscript {
    pub text: Option<String>,
    #[serde(default)]
    pub sentences: Vec<ManifestSentence>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManifestSentence {
    pub text: Option<String>,
    pub begin_time: Option<u64>,
    pub end_time: Option<u64>,
}
