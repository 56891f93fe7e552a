//! Realtime pipeline orchestration
//!
//! Drives audio/text events through buffering, transcription,
//! translation fan-out, and language-filtered broadcast. One stream =
//! one (session, participant) pair; streams are processed one segment
//! at a time so subtitles reach every subscriber in transcription
//! order.

mod orchestrator;

pub use orchestrator::RealtimeOrchestrator;
