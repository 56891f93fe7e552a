use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// One participant's state within a session
#[derive(Debug, Clone)]
pub struct ParticipantState {
    /// Display name shown on subtitles
    pub name: String,

    /// Preferred subtitle language (ISO 639-1)
    pub preferred_language: String,

    pub joined_at: DateTime<Utc>,

    /// Set when the participant leaves; a re-join clears it
    pub left_at: Option<DateTime<Utc>>,
}

/// One active conferencing session
///
/// A participant id maps to at most one `ParticipantState` at a time;
/// re-joining updates the existing entry.
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    participants: RwLock<HashMap<String, ParticipantState>>,
    sequence: AtomicU64,
    active: AtomicBool,
}

impl Session {
    pub fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            participants: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            active: AtomicBool::new(true),
        }
    }

    pub fn add_participant(&self, participant_id: &str, name: &str, language: &str) {
        let mut participants = self.participants.write();
        participants.insert(
            participant_id.to_string(),
            ParticipantState {
                name: name.to_string(),
                preferred_language: language.to_string(),
                joined_at: Utc::now(),
                left_at: None,
            },
        );
    }

    pub fn remove_participant(&self, participant_id: &str) {
        let mut participants = self.participants.write();
        if let Some(state) = participants.get_mut(participant_id) {
            state.left_at = Some(Utc::now());
        }
    }

    /// Returns false if the participant is unknown
    pub fn update_language(&self, participant_id: &str, language: &str) -> bool {
        let mut participants = self.participants.write();
        match participants.get_mut(participant_id) {
            Some(state) => {
                state.preferred_language = language.to_string();
                true
            }
            None => false,
        }
    }

    /// Strictly increasing per session, safe under concurrent callers
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Union of the preferred languages of currently-joined participants,
    /// sorted for deterministic fan-out
    pub fn target_languages(&self) -> Vec<String> {
        let participants = self.participants.read();
        let mut languages: Vec<String> = participants
            .values()
            .filter(|p| p.left_at.is_none())
            .map(|p| p.preferred_language.clone())
            .collect();
        languages.sort();
        languages.dedup();
        languages
    }

    pub fn participant(&self, participant_id: &str) -> Option<ParticipantState> {
        self.participants.read().get(participant_id).cloned()
    }

    pub fn participant_count(&self) -> usize {
        self.participants
            .read()
            .values()
            .filter(|p| p.left_at.is_none())
            .count()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn end(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
