pub mod audio;
pub mod config;
pub mod connections;
pub mod error;
pub mod http;
pub mod nats;
pub mod persist;
pub mod protocol;
pub mod realtime;
pub mod session;
pub mod stt;
pub mod translate;

pub use audio::{pcm_duration_ms, AudioIngestBuffer};
pub use config::Config;
pub use connections::{ConnectionHandle, ConnectionRegistry, ParticipantSnapshot};
pub use error::{RelayError, RelayResult};
pub use http::{create_router, AppState};
pub use nats::NatsClient;
pub use persist::{NatsPersistence, PersistenceSink, TranslationRecord, UtteranceRecord};
pub use protocol::{InboundMessage, OutboundMessage, ParticipantEvent, SubtitlePayload};
pub use realtime::RealtimeOrchestrator;
pub use session::{ParticipantState, Session, SessionRegistry};
pub use stt::{NatsTranscriber, Transcriber, Transcription};
pub use translate::{
    NatsTranslator, TranslationCache, TranslationPipeline, TranslationSet, Translator,
};
