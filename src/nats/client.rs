use crate::error::{RelayError, RelayResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use super::messages::{
    TranscribeRequest, TranscribeResponse, TranslateRequest, TranslateResponse,
};

/// Subjects understood by the collaborator services
pub const SUBJECT_TRANSCRIBE: &str = "stt.transcribe";
pub const SUBJECT_TRANSLATE: &str = "translate.text";
pub const SUBJECT_UTTERANCE: &str = "store.utterance";
pub const SUBJECT_TRANSLATIONS: &str = "store.translations";

pub struct NatsClient {
    client: async_nats::Client,
    request_timeout: Duration,
}

impl NatsClient {
    /// Connect to the NATS server
    pub async fn connect(url: &str, request_timeout: Duration) -> RelayResult<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .map_err(|e| RelayError::Collaborator(format!("NATS connect failed: {}", e)))?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            request_timeout,
        })
    }

    /// Request/reply to the STT service
    pub async fn request_transcription(
        &self,
        request: &TranscribeRequest,
    ) -> RelayResult<TranscribeResponse> {
        self.request(SUBJECT_TRANSCRIBE, request).await
    }

    /// Request/reply to the translation service
    pub async fn request_translation(
        &self,
        request: &TranslateRequest,
    ) -> RelayResult<TranslateResponse> {
        self.request(SUBJECT_TRANSLATE, request).await
    }

    /// Fire-and-forget publish of a JSON record
    pub async fn publish_record<T: Serialize>(&self, subject: &str, record: &T) -> RelayResult<()> {
        let payload = serde_json::to_vec(record)
            .map_err(|e| RelayError::Collaborator(format!("encode for {}: {}", subject, e)))?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .map_err(|e| RelayError::Collaborator(format!("publish to {}: {}", subject, e)))
    }

    async fn request<Req, Resp>(&self, subject: &str, request: &Req) -> RelayResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)
            .map_err(|e| RelayError::Collaborator(format!("encode for {}: {}", subject, e)))?;

        let response = tokio::time::timeout(
            self.request_timeout,
            self.client.request(subject.to_string(), payload.into()),
        )
        .await
        .map_err(|_| RelayError::Collaborator(format!("request to {} timed out", subject)))?
        .map_err(|e| RelayError::Collaborator(format!("request to {}: {}", subject, e)))?;

        serde_json::from_slice(&response.payload)
            .map_err(|e| RelayError::Collaborator(format!("decode reply from {}: {}", subject, e)))
    }
}
