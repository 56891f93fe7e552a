use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub nats: NatsConfig,
    pub audio: AudioConfig,
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub url: String,

    /// Timeout for request/reply calls to the STT and translation services
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Sample rate of inbound PCM (Whisper-style STT expects 16kHz)
    pub sample_rate: u32,

    /// Number of channels (1 = mono)
    pub channels: u16,

    /// Minimum accumulated audio before a segment is handed to STT
    #[serde(default = "default_min_buffer_ms")]
    pub min_buffer_ms: u64,

    /// Hard cap on accumulated audio; bursts beyond this keep only the
    /// most recent window
    #[serde(default = "default_max_buffer_ms")]
    pub max_buffer_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Languages subtitles are produced in when no participant has
    /// declared a preference yet
    #[serde(default = "default_languages")]
    pub default_languages: Vec<String>,

    #[serde(default = "default_max_transcriptions")]
    pub max_concurrent_transcriptions: usize,

    #[serde(default = "default_max_translations")]
    pub max_concurrent_translations: usize,

    /// Bounded size of the (source language, text) translation cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// When true, a second connection for an already-connected
    /// participant is rejected instead of replacing the first
    #[serde(default)]
    pub single_connection_per_participant: bool,
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_min_buffer_ms() -> u64 {
    500
}

fn default_max_buffer_ms() -> u64 {
    5_000
}

fn default_languages() -> Vec<String> {
    vec!["ko".to_string(), "en".to_string()]
}

fn default_max_transcriptions() -> usize {
    8
}

fn default_max_translations() -> usize {
    16
}

fn default_cache_capacity() -> usize {
    1_000
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "subtitle-relay".to_string(),
                http: HttpConfig {
                    bind: "127.0.0.1".to_string(),
                    port: 8080,
                },
            },
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_timeout_ms: default_request_timeout_ms(),
            },
            audio: AudioConfig {
                sample_rate: 16000, // Whisper expects 16kHz
                channels: 1,        // Mono
                min_buffer_ms: default_min_buffer_ms(),
                max_buffer_ms: default_max_buffer_ms(),
            },
            realtime: RealtimeConfig {
                default_languages: default_languages(),
                max_concurrent_transcriptions: default_max_transcriptions(),
                max_concurrent_translations: default_max_translations(),
                cache_capacity: default_cache_capacity(),
                single_connection_per_participant: false,
            },
        }
    }
}
