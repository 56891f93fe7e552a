use super::{Transcriber, Transcription};
use crate::error::{RelayError, RelayResult};
use crate::nats::{NatsClient, TranscribeRequest};
use base64::Engine;
use std::sync::Arc;

/// STT gateway backed by the NATS transcription service
pub struct NatsTranscriber {
    client: Arc<NatsClient>,
    sample_rate: u32,
    channels: u16,
}

impl NatsTranscriber {
    pub fn new(client: Arc<NatsClient>, sample_rate: u32, channels: u16) -> Self {
        Self {
            client,
            sample_rate,
            channels,
        }
    }
}

#[async_trait::async_trait]
impl Transcriber for NatsTranscriber {
    async fn transcribe(&self, audio: &[u8], language_hint: &str) -> RelayResult<Transcription> {
        let request = TranscribeRequest {
            audio: base64::engine::general_purpose::STANDARD.encode(audio),
            language: language_hint.to_string(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        };

        let response = self
            .client
            .request_transcription(&request)
            .await
            .map_err(|e| RelayError::Transcription(e.to_string()))?;

        Ok(Transcription {
            text: response.text,
            confidence: response.confidence.unwrap_or(0.0),
            is_final: !response.partial,
        })
    }
}
