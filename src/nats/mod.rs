//! NATS transport to the external collaborators
//!
//! Transcription and translation are request/reply services; utterance
//! persistence is fire-and-forget publish. Everything crossing the wire
//! is JSON.

pub mod client;
pub mod messages;

pub use client::NatsClient;
pub use messages::{
    TranscribeRequest, TranscribeResponse, TranslateRequest, TranslateResponse,
};
