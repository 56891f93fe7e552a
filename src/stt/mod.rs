//! Transcription gateway
//!
//! Wraps the speech-to-text collaborator behind the `Transcriber` trait
//! so the orchestrator can be driven by a mock in tests. Implementations
//! must be safe to invoke concurrently for different participants.

mod nats;

pub use nats::NatsTranscriber;

use crate::error::RelayResult;

/// One transcribed unit of speech
#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    /// 0.0 when the backend reports none
    pub confidence: f32,
    /// Confirmed result vs. interim (subject to revision)
    pub is_final: bool,
}

/// Speech-to-text capability
///
/// An empty or whitespace-only `text` means the audio produced no
/// utterance; the orchestrator drops it silently rather than treating it
/// as an error.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], language_hint: &str) -> RelayResult<Transcription>;
}
