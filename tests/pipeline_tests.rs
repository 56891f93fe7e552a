// End-to-end pipeline tests with mock collaborators
//
// Audio goes in as base64 PCM; subtitles come out on each connection's
// queue in that connection's preferred language, in sequence order.
// The STT, translation, and persistence collaborators are mocks wired
// through the same traits the NATS gateways implement.

use base64::Engine;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use subtitle_relay::config::Config;
use subtitle_relay::connections::ConnectionRegistry;
use subtitle_relay::error::{RelayError, RelayResult};
use subtitle_relay::persist::{PersistenceSink, TranslationRecord, UtteranceRecord};
use subtitle_relay::protocol::{OutboundMessage, SubtitlePayload};
use subtitle_relay::realtime::RealtimeOrchestrator;
use subtitle_relay::session::SessionRegistry;
use subtitle_relay::stt::{Transcriber, Transcription};
use subtitle_relay::translate::Translator;

/// Returns the scripted transcriptions in order, regardless of audio
struct ScriptedTranscriber {
    script: Mutex<VecDeque<Transcription>>,
}

impl ScriptedTranscriber {
    fn new(results: Vec<Transcription>) -> Self {
        Self {
            script: Mutex::new(results.into()),
        }
    }
}

#[async_trait::async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _audio: &[u8], _language_hint: &str) -> RelayResult<Transcription> {
        self.script
            .lock()
            .pop_front()
            .ok_or_else(|| RelayError::Transcription("script exhausted".to_string()))
    }
}

/// Dictionary translator; unknown pairs get a tagged passthrough
struct DictionaryTranslator {
    entries: HashMap<(String, String), String>,
    fail_languages: Vec<String>,
}

impl DictionaryTranslator {
    fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            ("Hello".to_string(), "ko".to_string()),
            "안녕하세요".to_string(),
        );
        Self {
            entries,
            fail_languages: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl Translator for DictionaryTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> RelayResult<String> {
        if self.fail_languages.iter().any(|l| l == target_language) {
            return Err(RelayError::Translation {
                language: target_language.to_string(),
                reason: "backend unavailable".to_string(),
            });
        }
        Ok(self
            .entries
            .get(&(text.to_string(), target_language.to_string()))
            .cloned()
            .unwrap_or_else(|| format!("[{}] {}", target_language, text)))
    }
}

#[derive(Default)]
struct RecordingSink {
    utterances: Mutex<Vec<UtteranceRecord>>,
    translations: Mutex<Vec<TranslationRecord>>,
}

#[async_trait::async_trait]
impl PersistenceSink for RecordingSink {
    async fn create_utterance(&self, record: &UtteranceRecord) -> RelayResult<()> {
        self.utterances.lock().push(record.clone());
        Ok(())
    }

    async fn create_translations_bulk(&self, records: &[TranslationRecord]) -> RelayResult<()> {
        self.translations.lock().extend(records.iter().cloned());
        Ok(())
    }
}

struct Harness {
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionRegistry>,
    orchestrator: RealtimeOrchestrator,
    sink: Arc<RecordingSink>,
}

fn harness(transcriber: ScriptedTranscriber, translator: DictionaryTranslator) -> Harness {
    let config = Config::default();
    let sessions = Arc::new(SessionRegistry::new());
    let connections = Arc::new(ConnectionRegistry::new(false));
    let sink = Arc::new(RecordingSink::default());

    let orchestrator = RealtimeOrchestrator::new(
        &config,
        Arc::clone(&sessions),
        Arc::clone(&connections),
        Arc::new(transcriber),
        Arc::new(translator),
        sink.clone(),
    );

    Harness {
        sessions,
        connections,
        orchestrator,
        sink,
    }
}

/// 500ms of 16kHz mono PCM, base64-encoded: exactly one ingest window
fn full_window_chunk() -> String {
    base64::engine::general_purpose::STANDARD.encode(vec![0u8; 16_000])
}

fn final_utterance(text: &str) -> Transcription {
    Transcription {
        text: text.to_string(),
        confidence: 0.95,
        is_final: true,
    }
}

fn expect_subtitle(message: OutboundMessage) -> SubtitlePayload {
    match message {
        OutboundMessage::Subtitle(payload) => payload,
        other => panic!("Expected subtitle, got {:?}", other),
    }
}

#[tokio::test]
async fn test_two_participants_get_their_own_language() {
    let h = harness(
        ScriptedTranscriber::new(vec![final_utterance("Hello")]),
        DictionaryTranslator::new(),
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    session.add_participant("bob", "Bob", "ko");
    let (_ha, mut rx_a) = h.connections.register("meeting-1", "alice", "en").unwrap();
    let (_hb, mut rx_b) = h.connections.register("meeting-1", "bob", "ko").unwrap();

    h.orchestrator
        .process_audio("meeting-1", "alice", &full_window_chunk())
        .await;

    let to_alice = expect_subtitle(rx_a.try_recv().unwrap());
    let to_bob = expect_subtitle(rx_b.try_recv().unwrap());

    assert_eq!(to_alice.translated_text, "Hello");
    assert_eq!(to_alice.target_language, "en");
    assert_eq!(to_bob.translated_text, "안녕하세요");
    assert_eq!(to_bob.target_language, "ko");

    // Same utterance, same ordering key, same speaker
    assert_eq!(to_alice.sequence, to_bob.sequence);
    assert_eq!(to_alice.speaker_name, "Alice");
    assert_eq!(to_bob.original_text, "Hello");
    assert!(to_bob.is_final);
}

#[tokio::test]
async fn test_subtitles_arrive_in_transcription_order() {
    let h = harness(
        ScriptedTranscriber::new(vec![
            final_utterance("one"),
            final_utterance("two"),
            final_utterance("three"),
        ]),
        DictionaryTranslator::new(),
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    session.add_participant("bob", "Bob", "ko");
    let (_hb, mut rx_b) = h.connections.register("meeting-1", "bob", "ko").unwrap();

    for _ in 0..3 {
        h.orchestrator
            .process_audio("meeting-1", "alice", &full_window_chunk())
            .await;
    }

    let mut sequences = Vec::new();
    let mut texts = Vec::new();
    while let Ok(message) = rx_b.try_recv() {
        let payload = expect_subtitle(message);
        sequences.push(payload.sequence);
        texts.push(payload.original_text);
    }

    assert_eq!(texts, vec!["one", "two", "three"]);
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_sub_window_audio_waits_for_flush() {
    let h = harness(
        ScriptedTranscriber::new(vec![final_utterance("tail")]),
        DictionaryTranslator::new(),
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    let (_ha, mut rx_a) = h.connections.register("meeting-1", "alice", "en").unwrap();

    // 250ms: below the 500ms window, nothing may come out
    let short = base64::engine::general_purpose::STANDARD.encode(vec![0u8; 8_000]);
    h.orchestrator
        .process_audio("meeting-1", "alice", &short)
        .await;
    assert!(rx_a.try_recv().is_err());

    // The speaker paused; flush pushes the tail through the pipeline
    h.orchestrator.flush_audio("meeting-1", "alice").await;
    let payload = expect_subtitle(rx_a.try_recv().unwrap());
    assert_eq!(payload.original_text, "tail");
}

#[tokio::test]
async fn test_empty_transcription_is_dropped_silently() {
    let h = harness(
        ScriptedTranscriber::new(vec![Transcription {
            text: "   ".to_string(),
            confidence: 0.1,
            is_final: true,
        }]),
        DictionaryTranslator::new(),
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    let (_ha, mut rx_a) = h.connections.register("meeting-1", "alice", "en").unwrap();

    h.orchestrator
        .process_audio("meeting-1", "alice", &full_window_chunk())
        .await;

    assert!(rx_a.try_recv().is_err(), "no utterance, no delivery");
}

#[tokio::test]
async fn test_low_confidence_transcription_is_dropped() {
    let h = harness(
        ScriptedTranscriber::new(vec![Transcription {
            text: "mumble".to_string(),
            confidence: 0.05,
            is_final: true,
        }]),
        DictionaryTranslator::new(),
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    let (_ha, mut rx_a) = h.connections.register("meeting-1", "alice", "en").unwrap();

    h.orchestrator
        .process_audio("meeting-1", "alice", &full_window_chunk())
        .await;

    assert!(rx_a.try_recv().is_err(), "noise below the floor is dropped");
}

#[tokio::test]
async fn test_transcription_failure_drops_event_only() {
    // One scripted result; the call after it fails in the gateway
    let h = harness(
        ScriptedTranscriber::new(vec![final_utterance("after the failure")]),
        DictionaryTranslator::new(),
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    session.add_participant("bob", "Bob", "en");
    let (_ha, mut rx_a) = h.connections.register("meeting-1", "alice", "en").unwrap();

    // Exhaust the script with one extra utterance first
    h.orchestrator
        .process_audio("meeting-1", "alice", &full_window_chunk())
        .await;
    assert_eq!(
        expect_subtitle(rx_a.try_recv().unwrap()).original_text,
        "after the failure"
    );

    // This one fails inside the gateway; the pipeline keeps running
    h.orchestrator
        .process_audio("meeting-1", "alice", &full_window_chunk())
        .await;
    assert!(rx_a.try_recv().is_err());

    // Subsequent text events still flow
    h.orchestrator
        .process_text("meeting-1", "bob", "still alive", None)
        .await;
    assert_eq!(
        expect_subtitle(rx_a.try_recv().unwrap()).original_text,
        "still alive"
    );
}

#[tokio::test]
async fn test_degraded_translation_still_delivers() {
    let mut translator = DictionaryTranslator::new();
    translator.fail_languages = vec!["ja".to_string()];

    let h = harness(
        ScriptedTranscriber::new(vec![final_utterance("Hello")]),
        translator,
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    session.add_participant("yuki", "Yuki", "ja");
    let (_hy, mut rx_y) = h.connections.register("meeting-1", "yuki", "ja").unwrap();

    h.orchestrator
        .process_audio("meeting-1", "alice", &full_window_chunk())
        .await;

    // Degraded but delivered: the original text in place of Japanese
    let payload = expect_subtitle(rx_y.try_recv().unwrap());
    assert_eq!(payload.translated_text, "Hello");
    assert_eq!(payload.target_language, "ja");
}

#[tokio::test]
async fn test_final_utterance_is_persisted() {
    let h = harness(
        ScriptedTranscriber::new(vec![final_utterance("Hello")]),
        DictionaryTranslator::new(),
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    session.add_participant("bob", "Bob", "ko");
    let (_hb, _rx_b) = h.connections.register("meeting-1", "bob", "ko").unwrap();

    h.orchestrator
        .process_audio("meeting-1", "alice", &full_window_chunk())
        .await;

    // Persistence is fire-and-forget on a spawned task
    tokio::time::sleep(Duration::from_millis(50)).await;

    let utterances = h.sink.utterances.lock();
    assert_eq!(utterances.len(), 1);
    assert_eq!(utterances[0].original_text, "Hello");
    assert_eq!(utterances[0].speaker_name, "Alice");

    let translations = h.sink.translations.lock();
    assert_eq!(translations.len(), 1, "source language is not re-stored");
    assert_eq!(translations[0].target_language, "ko");
    assert_eq!(translations[0].translated_text, "안녕하세요");
    assert_eq!(translations[0].utterance_id, utterances[0].id);
}

#[tokio::test]
async fn test_interim_utterance_is_not_persisted() {
    let h = harness(
        ScriptedTranscriber::new(vec![Transcription {
            text: "partial thought".to_string(),
            confidence: 0.5,
            is_final: false,
        }]),
        DictionaryTranslator::new(),
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    let (_ha, mut rx_a) = h.connections.register("meeting-1", "alice", "en").unwrap();

    h.orchestrator
        .process_audio("meeting-1", "alice", &full_window_chunk())
        .await;

    // Delivered as interim...
    let payload = expect_subtitle(rx_a.try_recv().unwrap());
    assert!(!payload.is_final);

    // ...but never stored
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.sink.utterances.lock().is_empty());
}

#[tokio::test]
async fn test_event_for_ended_session_is_a_noop() {
    let h = harness(
        ScriptedTranscriber::new(vec![]),
        DictionaryTranslator::new(),
    );

    // No session was ever created; text events must vanish quietly
    h.orchestrator
        .process_text("ghost-meeting", "alice", "anyone there?", Some("en"))
        .await;

    assert_eq!(h.sessions.session_count(), 0);
}

#[tokio::test]
async fn test_explicit_end_notifies_and_closes() {
    let h = harness(
        ScriptedTranscriber::new(vec![]),
        DictionaryTranslator::new(),
    );

    let session = h.sessions.get_or_create("meeting-1");
    session.add_participant("alice", "Alice", "en");
    let (_ha, mut rx_a) = h.connections.register("meeting-1", "alice", "en").unwrap();

    h.orchestrator.end_session("meeting-1").await;

    match rx_a.try_recv().unwrap() {
        OutboundMessage::SessionEnded { session_id } => assert_eq!(session_id, "meeting-1"),
        other => panic!("Expected session_ended, got {:?}", other),
    }

    // Queue is closed and all state freed
    assert!(rx_a.try_recv().is_err());
    assert_eq!(h.connections.session_connection_count("meeting-1"), 0);
    assert_eq!(h.sessions.session_count(), 0);
}
