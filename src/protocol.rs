//! WebSocket wire messages
//!
//! Inbound frames are control messages from a participant's client
//! (audio, manual text, language change, keepalive). Outbound frames
//! carry subtitles and session membership events. All frames are JSON
//! with a `type` discriminator.

use serde::{Deserialize, Serialize};

/// Control message received from a connected client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Base64-encoded PCM audio from the participant's microphone
    Audio { data: String },

    /// Manually entered text; skips the STT round-trip
    Text {
        text: String,
        /// Source language; the participant's preferred language when absent
        #[serde(default)]
        language: Option<String>,
    },

    /// Change this connection's preferred subtitle language
    LanguageChange { language: String },

    /// Keepalive
    Ping,
}

/// Message delivered to a connected client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
    Subtitle(SubtitlePayload),
    ParticipantJoined(ParticipantEvent),
    ParticipantLeft(ParticipantEvent),
    LanguageChanged { language: String },
    SessionEnded { session_id: String },
    Pong,
}

/// One subtitle, rendered in the receiving connection's preferred language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitlePayload {
    pub speaker_name: String,
    pub original_language: String,
    pub original_text: String,
    pub translated_text: String,
    pub target_language: String,
    /// RFC3339
    pub timestamp: String,
    pub is_final: bool,
    /// Per-session monotonic ordering key
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantEvent {
    pub participant_id: String,
    pub preferred_language: String,
}
