pub mod client;
pub mod markup;
pub mod mock;
mod wire;

pub use client::{DashScopeClient, PollSettings, SubmitOutcome, TranscribeError, TranscribeOptions};
pub use mock::mock_transcribe;
