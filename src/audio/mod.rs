//! Audio ingestion
//!
//! Inbound audio arrives as small base64 PCM chunks per participant.
//! The ingest buffer accumulates them into segments long enough for the
//! STT service to produce useful text, bounded so a burst never inflates
//! transcription latency.

mod buffer;

pub use buffer::{pcm_duration_ms, AudioIngestBuffer};
