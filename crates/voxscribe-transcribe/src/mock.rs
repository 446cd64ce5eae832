use std::time::Duration;

use tracing::warn;
use voxscribe_core::Transcription;

const MOCK_DELAY: Duration = Duration::from_secs(1);

/// Fallback used when no API credential is configured: waits roughly as long
/// as a short real task would and returns a canned transcript that names the
/// uploaded file. The result is flagged so callers can tell it apart from a
/// real one.
pub async fn mock_transcribe(original_name: &str) -> Transcription {
    warn!(
        file = original_name,
        "no API credential configured, returning mock transcription"
    );
    tokio::time::sleep(MOCK_DELAY).await;
    let mut transcription = Transcription::plain(format!(
        "This is a mock transcription of \"{original_name}\". Configure an API credential to get real speech recognition results."
    ));
    transcription.mock = true;
    transcription
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_result_names_the_file_and_is_flagged() {
        let transcription = mock_transcribe("interview.mp3").await;
        assert!(transcription.mock);
        assert!(transcription.text.contains("interview.mp3"));
        assert!(transcription.sentences.is_empty());
        assert!(transcription.request_id.is_none());
    }
}
