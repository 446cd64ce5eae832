use serde::{Deserialize, Serialize};

/// A completed transcript, folded onto the `FileRecord` when the vendor task
/// (or the mock fallback) finishes successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub text: String,
    #[serde(default)]
    pub sentences: Vec<Sentence>,
    /// Vendor request id, when the vendor API was actually called.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// True when produced by the mock fallback (no API credential configured).
    /// Mock results must never be indistinguishable from real ones.
    #[serde(default)]
    pub mock: bool,
}

impl Transcription {
    pub fn plain(text: impl Into<String>) -> Self {
        Transcription {
            text: text.into(),
            sentences: Vec::new(),
            request_id: None,
            mock: false,
        }
    }
}

/// Per-sentence breakdown with millisecond offsets, as delivered by the
/// vendor's transcription manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
}
