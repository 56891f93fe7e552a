//! Persistence collaborator boundary
//!
//! Final utterances and their translations are handed off fire-and-
//! forget; a persistence failure is logged and never affects delivery.

mod nats;

pub use nats::NatsPersistence;

use crate::error::RelayResult;
use serde::{Deserialize, Serialize};

/// Durable record of one final utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtteranceRecord {
    pub id: String,
    pub session_id: String,
    pub participant_id: String,
    pub speaker_name: String,
    pub original_language: String,
    pub original_text: String,
    pub confidence: f32,
    /// RFC3339
    pub timestamp: String,
}

/// Durable record of one translation of an utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub utterance_id: String,
    pub target_language: String,
    pub translated_text: String,
}

#[async_trait::async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn create_utterance(&self, record: &UtteranceRecord) -> RelayResult<()>;

    async fn create_translations_bulk(&self, records: &[TranslationRecord]) -> RelayResult<()>;
}
