use super::{PersistenceSink, TranslationRecord, UtteranceRecord};
use crate::error::RelayResult;
use crate::nats::client::{SUBJECT_TRANSLATIONS, SUBJECT_UTTERANCE};
use crate::nats::NatsClient;
use std::sync::Arc;

/// Persistence sink publishing records to the storage service
pub struct NatsPersistence {
    client: Arc<NatsClient>,
}

impl NatsPersistence {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl PersistenceSink for NatsPersistence {
    async fn create_utterance(&self, record: &UtteranceRecord) -> RelayResult<()> {
        self.client.publish_record(SUBJECT_UTTERANCE, record).await
    }

    async fn create_translations_bulk(&self, records: &[TranslationRecord]) -> RelayResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.client
            .publish_record(SUBJECT_TRANSLATIONS, &records)
            .await
    }
}
