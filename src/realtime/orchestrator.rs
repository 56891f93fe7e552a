use crate::audio::{pcm_duration_ms, AudioIngestBuffer};
use crate::config::Config;
use crate::connections::ConnectionRegistry;
use crate::error::RelayError;
use crate::persist::{PersistenceSink, TranslationRecord, UtteranceRecord};
use crate::protocol::{OutboundMessage, SubtitlePayload};
use crate::session::SessionRegistry;
use crate::stt::Transcriber;
use crate::translate::{TranslationPipeline, Translator};
use base64::Engine;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info, warn};

/// Results scored below this are noise and are dropped. Backends that
/// report no score at all come through as 0.0 and are let past.
const MIN_CONFIDENCE: f32 = 0.2;

/// Drives the subtitle pipeline for every live session
///
/// Audio: buffer until the ingest window fills, transcribe, fan out,
/// broadcast. Text: skip straight to fan-out. All collaborator failures
/// are contained here - logged with session/participant context and
/// dropped - so one participant's failure never stalls another's
/// pipeline.
pub struct RealtimeOrchestrator {
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionRegistry>,
    ingest: AudioIngestBuffer,
    transcriber: Arc<dyn Transcriber>,
    translations: TranslationPipeline,
    sink: Arc<dyn PersistenceSink>,
    stt_limiter: Arc<Semaphore>,

    /// One lock per (session, participant) stream: a stream's segments
    /// are processed one at a time, never overlapping, which is what
    /// keeps delivered sequence numbers in order
    streams: DashMap<(String, String), Arc<Mutex<()>>>,

    sample_rate: u32,
    channels: u16,
    default_languages: Vec<String>,
}

impl RealtimeOrchestrator {
    pub fn new(
        config: &Config,
        sessions: Arc<SessionRegistry>,
        connections: Arc<ConnectionRegistry>,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        sink: Arc<dyn PersistenceSink>,
    ) -> Self {
        Self {
            sessions,
            connections,
            ingest: AudioIngestBuffer::new(config.audio.min_buffer_ms, config.audio.max_buffer_ms),
            transcriber,
            translations: TranslationPipeline::new(
                translator,
                config.realtime.cache_capacity,
                config.realtime.max_concurrent_translations,
            ),
            sink,
            stt_limiter: Arc::new(Semaphore::new(
                config.realtime.max_concurrent_transcriptions.max(1),
            )),
            streams: DashMap::new(),
            sample_rate: config.audio.sample_rate,
            channels: config.audio.channels,
            default_languages: config.realtime.default_languages.clone(),
        }
    }

    pub fn translations(&self) -> &TranslationPipeline {
        &self.translations
    }

    /// Handle one inbound audio chunk (base64 PCM)
    pub async fn process_audio(&self, session_id: &str, participant_id: &str, data: &str) {
        let bytes = match base64::engine::general_purpose::STANDARD.decode(data) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    "Dropping undecodable audio chunk: session={} participant={} error={}",
                    session_id, participant_id, e
                );
                return;
            }
        };

        let duration_ms = pcm_duration_ms(bytes.len(), self.sample_rate, self.channels);
        let Some(segment) = self.ingest.add_chunk(participant_id, &bytes, duration_ms) else {
            // Still buffering below the minimum window
            return;
        };

        self.process_segment(session_id, participant_id, segment)
            .await;
    }

    /// Handle manually entered text; no STT round-trip
    pub async fn process_text(
        &self,
        session_id: &str,
        participant_id: &str,
        text: &str,
        language: Option<&str>,
    ) {
        if text.trim().is_empty() {
            return;
        }

        let lock = self.stream_lock(session_id, participant_id);
        let _guard = lock.lock().await;

        let source_language = match language {
            Some(lang) => lang.to_string(),
            None => self.speaker_language(session_id, participant_id),
        };

        self.deliver_utterance(
            session_id,
            participant_id,
            text.to_string(),
            source_language,
            1.0,
            true,
        )
        .await;
    }

    /// Flush any sub-window audio for the stream and run it through the
    /// pipeline (e.g. the speaker paused before the window filled)
    pub async fn flush_audio(&self, session_id: &str, participant_id: &str) {
        if let Some(segment) = self.ingest.flush(participant_id) {
            self.process_segment(session_id, participant_id, segment)
                .await;
        }
    }

    /// Drop buffered audio and the stream lock for a departed participant
    pub fn forget_stream(&self, session_id: &str, participant_id: &str) {
        self.ingest.clear(participant_id);
        self.streams
            .remove(&(session_id.to_string(), participant_id.to_string()));
    }

    /// Explicitly end a session: notify subscribers, close their
    /// connections, free the session state. Deliveries still in flight
    /// for the session become no-ops.
    pub async fn end_session(&self, session_id: &str) {
        self.connections
            .broadcast(session_id, |_| OutboundMessage::SessionEnded {
                session_id: session_id.to_string(),
            });

        for snapshot in self.connections.list_participants(session_id) {
            self.ingest.clear(&snapshot.participant_id);
        }
        let closed = self.connections.drain_session(session_id);
        self.sessions.end_session(session_id);
        self.streams.retain(|(sid, _), _| sid != session_id);

        info!(
            "Session {} ended explicitly, {} connections closed",
            session_id, closed
        );
    }

    async fn process_segment(&self, session_id: &str, participant_id: &str, segment: Vec<u8>) {
        let lock = self.stream_lock(session_id, participant_id);
        let _guard = lock.lock().await;

        let language_hint = self.speaker_language(session_id, participant_id);

        let transcription = {
            let _permit = self.stt_limiter.acquire().await.ok();
            self.transcriber.transcribe(&segment, &language_hint).await
        };

        let transcription = match transcription {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    "Transcription failed: session={} participant={} error={}",
                    session_id, participant_id, e
                );
                return;
            }
        };

        // No utterance produced; not an error
        if transcription.text.trim().is_empty() {
            debug!(
                "Empty transcription dropped: session={} participant={}",
                session_id, participant_id
            );
            return;
        }

        if transcription.confidence > 0.0 && transcription.confidence < MIN_CONFIDENCE {
            debug!(
                "Low-confidence transcription dropped: session={} participant={} confidence={}",
                session_id, participant_id, transcription.confidence
            );
            return;
        }

        self.deliver_utterance(
            session_id,
            participant_id,
            transcription.text,
            language_hint,
            transcription.confidence,
            transcription.is_final,
        )
        .await;
    }

    async fn deliver_utterance(
        &self,
        session_id: &str,
        participant_id: &str,
        text: String,
        source_language: String,
        confidence: f32,
        is_final: bool,
    ) {
        // Sequence first: a missing session means the event arrived late
        // and the whole delivery is a soft no-op
        let sequence = match self.sessions.next_sequence(session_id) {
            Ok(sequence) => sequence,
            Err(RelayError::SessionNotFound(_)) => {
                debug!(
                    "Dropping utterance for ended session {}: participant={}",
                    session_id, participant_id
                );
                return;
            }
            Err(e) => {
                warn!("Sequencing failed for session {}: {}", session_id, e);
                return;
            }
        };

        let speaker_name = self
            .sessions
            .get(session_id)
            .and_then(|s| s.participant(participant_id))
            .map(|p| p.name)
            .unwrap_or_else(|| participant_id.to_string());

        let mut target_languages = self.sessions.target_languages(session_id);
        if target_languages.is_empty() {
            target_languages = self.default_languages.clone();
        }

        let set = self
            .translations
            .translate_all(&text, &source_language, &target_languages)
            .await;

        let timestamp = Utc::now().to_rfc3339();
        let delivered = self.connections.broadcast(session_id, |language| {
            OutboundMessage::Subtitle(SubtitlePayload {
                speaker_name: speaker_name.clone(),
                original_language: source_language.clone(),
                original_text: text.clone(),
                translated_text: set.text_for(language, &text).to_string(),
                target_language: language.to_string(),
                timestamp: timestamp.clone(),
                is_final,
                sequence,
            })
        });

        debug!(
            "Subtitle {} delivered to {} connections: session={} speaker={}",
            sequence, delivered, session_id, participant_id
        );

        if is_final {
            self.persist_utterance(
                session_id,
                participant_id,
                &speaker_name,
                &text,
                &source_language,
                confidence,
                &timestamp,
                &set.translations,
            );
        }
    }

    /// Fire-and-forget persistence of a final utterance
    #[allow(clippy::too_many_arguments)]
    fn persist_utterance(
        &self,
        session_id: &str,
        participant_id: &str,
        speaker_name: &str,
        text: &str,
        source_language: &str,
        confidence: f32,
        timestamp: &str,
        translations: &std::collections::HashMap<String, String>,
    ) {
        let utterance = UtteranceRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            participant_id: participant_id.to_string(),
            speaker_name: speaker_name.to_string(),
            original_language: source_language.to_string(),
            original_text: text.to_string(),
            confidence,
            timestamp: timestamp.to_string(),
        };

        let records: Vec<TranslationRecord> = translations
            .iter()
            .filter(|(language, _)| language.as_str() != source_language)
            .map(|(language, translated)| TranslationRecord {
                utterance_id: utterance.id.clone(),
                target_language: language.clone(),
                translated_text: translated.clone(),
            })
            .collect();

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.create_utterance(&utterance).await {
                error!("Failed to persist utterance {}: {}", utterance.id, e);
                return;
            }
            if let Err(e) = sink.create_translations_bulk(&records).await {
                error!(
                    "Failed to persist translations for utterance {}: {}",
                    utterance.id, e
                );
            }
        });
    }

    fn speaker_language(&self, session_id: &str, participant_id: &str) -> String {
        self.sessions
            .get(session_id)
            .and_then(|s| s.participant(participant_id))
            .map(|p| p.preferred_language)
            .unwrap_or_else(|| {
                self.default_languages
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "en".to_string())
            })
    }

    fn stream_lock(&self, session_id: &str, participant_id: &str) -> Arc<Mutex<()>> {
        self.streams
            .entry((session_id.to_string(), participant_id.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
