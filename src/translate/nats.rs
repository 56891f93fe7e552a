use super::Translator;
use crate::error::{RelayError, RelayResult};
use crate::nats::{NatsClient, TranslateRequest};
use std::sync::Arc;

/// Translation gateway backed by the NATS translation service
pub struct NatsTranslator {
    client: Arc<NatsClient>,
}

impl NatsTranslator {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Translator for NatsTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> RelayResult<String> {
        let request = TranslateRequest {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        };

        let response = self
            .client
            .request_translation(&request)
            .await
            .map_err(|e| RelayError::Translation {
                language: target_language.to_string(),
                reason: e.to_string(),
            })?;

        Ok(response.translated_text)
    }
}
