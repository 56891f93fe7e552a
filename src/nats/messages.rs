use serde::{Deserialize, Serialize};

/// Request to the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeRequest {
    /// Base64-encoded PCM bytes
    pub audio: String,
    /// Language hint (ISO 639-1)
    pub language: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Reply from the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
    pub confidence: Option<f32>,
    /// Interim result, subject to revision
    pub partial: bool,
}

/// Request to the translation service (single text, single language pair)
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

/// Reply from the translation service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
}
