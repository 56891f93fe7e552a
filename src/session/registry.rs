use super::state::Session;
use crate::error::{RelayError, RelayResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Process-wide registry of live sessions
///
/// Created once at startup and shared across tasks. Operations against
/// an ended session fail softly: lookups return `None`, sequence
/// requests return `SessionNotFound`, everything else is a no-op. The
/// lock guards only the map itself; per-session state has its own
/// synchronization.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_create(&self, session_id: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().get(session_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write();
        // Racing creators: the first insert wins
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| {
                    info!("Session created: {}", session_id);
                    Arc::new(Session::new(session_id.to_string()))
                }),
        )
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Remove the session and mark it inactive; in-flight deliveries
    /// targeting it become no-ops
    pub fn end_session(&self, session_id: &str) -> Option<Arc<Session>> {
        let removed = self.sessions.write().remove(session_id);
        if let Some(session) = &removed {
            session.end();
            info!("Session ended: {}", session_id);
        }
        removed
    }

    pub fn next_sequence(&self, session_id: &str) -> RelayResult<u64> {
        match self.get(session_id) {
            Some(session) => Ok(session.next_sequence()),
            None => Err(RelayError::SessionNotFound(session_id.to_string())),
        }
    }

    /// Empty when the session is gone or nobody has joined yet; the
    /// orchestrator substitutes the configured default set
    pub fn target_languages(&self, session_id: &str) -> Vec<String> {
        self.get(session_id)
            .map(|s| s.target_languages())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove all sessions (process shutdown)
    pub fn drain(&self) -> Vec<Arc<Session>> {
        let mut sessions = self.sessions.write();
        let drained: Vec<Arc<Session>> = sessions.drain().map(|(_, s)| s).collect();
        for session in &drained {
            session.end();
        }
        drained
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
