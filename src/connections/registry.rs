use crate::error::{RelayError, RelayResult};
use crate::protocol::OutboundMessage;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Opaque handle returned by `register`; required for unregistering and
/// per-connection mutation
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub session_id: String,
    pub participant_id: String,
}

/// Live-connection view of one participant
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantSnapshot {
    pub participant_id: String,
    pub preferred_language: String,
}

struct ConnectionEntry {
    session_id: String,
    participant_id: String,
    preferred_language: String,
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

#[derive(Default)]
struct Inner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    by_session: HashMap<String, Vec<ConnectionId>>,
    by_participant: HashMap<String, ConnectionId>,
}

/// Registry of live connections, grouped by session and by participant
///
/// All mutation and snapshot reads go through one `RwLock`, held only
/// for the map operation itself (sends are non-blocking), which makes
/// register/unregister/broadcast linearizable with respect to each
/// other: a broadcast observes a consistent connection set and never
/// delivers to a connection that has already been unregistered.
pub struct ConnectionRegistry {
    inner: RwLock<Inner>,
    single_connection_per_participant: bool,
}

impl ConnectionRegistry {
    pub fn new(single_connection_per_participant: bool) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            single_connection_per_participant,
        }
    }

    /// Register a connection and hand back its outbound queue
    ///
    /// Default policy: a later registration for the same participant
    /// replaces the prior one, which is unregistered (its queue closes
    /// and its writer task winds down). With
    /// `single_connection_per_participant` the second registration is
    /// rejected instead.
    pub fn register(
        &self,
        session_id: &str,
        participant_id: &str,
        preferred_language: &str,
    ) -> RelayResult<(ConnectionHandle, mpsc::UnboundedReceiver<OutboundMessage>)> {
        let mut inner = self.inner.write();

        if let Some(&existing) = inner.by_participant.get(participant_id) {
            if self.single_connection_per_participant {
                return Err(RelayError::DuplicateParticipant(
                    participant_id.to_string(),
                ));
            }
            debug!(
                "Replacing existing connection for participant {}",
                participant_id
            );
            Self::remove_locked(&mut inner, existing);
        }

        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        inner.connections.insert(
            id,
            ConnectionEntry {
                session_id: session_id.to_string(),
                participant_id: participant_id.to_string(),
                preferred_language: preferred_language.to_string(),
                tx,
            },
        );
        inner
            .by_session
            .entry(session_id.to_string())
            .or_default()
            .push(id);
        inner.by_participant.insert(participant_id.to_string(), id);

        debug!(
            "Connection registered: session={} participant={} lang={}",
            session_id, participant_id, preferred_language
        );

        Ok((
            ConnectionHandle {
                id,
                session_id: session_id.to_string(),
                participant_id: participant_id.to_string(),
            },
            rx,
        ))
    }

    /// Remove the handle's registration
    ///
    /// Returns false when the registration is already gone - e.g. it was
    /// replaced by a newer connection for the same participant. Callers
    /// use that to skip participant-left bookkeeping for stale sockets.
    pub fn unregister(&self, handle: &ConnectionHandle) -> bool {
        let mut inner = self.inner.write();
        if !inner.connections.contains_key(&handle.id) {
            return false;
        }
        Self::remove_locked(&mut inner, handle.id);
        debug!(
            "Connection unregistered: session={} participant={}",
            handle.session_id, handle.participant_id
        );
        true
    }

    /// Returns false if the connection is no longer registered
    pub fn set_preferred_language(&self, handle: &ConnectionHandle, language: &str) -> bool {
        let mut inner = self.inner.write();
        match inner.connections.get_mut(&handle.id) {
            Some(entry) => {
                entry.preferred_language = language.to_string();
                true
            }
            None => false,
        }
    }

    pub fn preferred_language(&self, handle: &ConnectionHandle) -> Option<String> {
        self.inner
            .read()
            .connections
            .get(&handle.id)
            .map(|e| e.preferred_language.clone())
    }

    /// Deliver one message per distinct preferred language to every
    /// connection in the session
    ///
    /// `build` runs exactly once per language actually present among the
    /// session's current connections, not once per connection. A send
    /// failure removes only the failing connection; delivery to the rest
    /// proceeds. Returns the number of connections reached.
    pub fn broadcast<F>(&self, session_id: &str, mut build: F) -> usize
    where
        F: FnMut(&str) -> OutboundMessage,
    {
        let mut delivered = 0;
        let mut failed: Vec<ConnectionId> = Vec::new();

        {
            let inner = self.inner.read();
            let Some(ids) = inner.by_session.get(session_id) else {
                return 0;
            };

            // Group by preferred language so the builder runs once per
            // distinct language (BTreeMap for deterministic order)
            let mut by_language: BTreeMap<&str, Vec<(ConnectionId, &ConnectionEntry)>> =
                BTreeMap::new();
            for id in ids {
                if let Some(entry) = inner.connections.get(id) {
                    by_language
                        .entry(entry.preferred_language.as_str())
                        .or_default()
                        .push((*id, entry));
                }
            }

            for (language, entries) in by_language {
                let message = build(language);
                for (id, entry) in entries {
                    if entry.tx.send(message.clone()).is_ok() {
                        delivered += 1;
                    } else {
                        failed.push(id);
                    }
                }
            }
        }

        if !failed.is_empty() {
            let mut inner = self.inner.write();
            for id in failed {
                warn!("Dropping connection with closed outbound queue: {}", id);
                Self::remove_locked(&mut inner, id);
            }
        }

        delivered
    }

    /// Direct send to one participant's live connection
    pub fn send_to_participant(
        &self,
        participant_id: &str,
        message: OutboundMessage,
    ) -> RelayResult<()> {
        let failed = {
            let inner = self.inner.read();
            let Some(&id) = inner.by_participant.get(participant_id) else {
                return Err(RelayError::ConnectionClosed(participant_id.to_string()));
            };
            match inner.connections.get(&id) {
                Some(entry) => {
                    if entry.tx.send(message).is_ok() {
                        return Ok(());
                    }
                    id
                }
                None => id,
            }
        };

        Self::remove_locked(&mut self.inner.write(), failed);
        Err(RelayError::ConnectionClosed(participant_id.to_string()))
    }

    pub fn list_participants(&self, session_id: &str) -> Vec<ParticipantSnapshot> {
        let inner = self.inner.read();
        let Some(ids) = inner.by_session.get(session_id) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| inner.connections.get(id))
            .map(|entry| ParticipantSnapshot {
                participant_id: entry.participant_id.clone(),
                preferred_language: entry.preferred_language.clone(),
            })
            .collect()
    }

    pub fn session_connection_count(&self, session_id: &str) -> usize {
        self.inner
            .read()
            .by_session
            .get(session_id)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }

    /// Remove every connection in the session (explicit session end)
    pub fn drain_session(&self, session_id: &str) -> usize {
        let mut inner = self.inner.write();
        let ids = match inner.by_session.get(session_id) {
            Some(ids) => ids.clone(),
            None => return 0,
        };
        for id in &ids {
            Self::remove_locked(&mut inner, *id);
        }
        ids.len()
    }

    /// Remove every connection (process shutdown)
    pub fn drain_all(&self) -> usize {
        let mut inner = self.inner.write();
        let count = inner.connections.len();
        *inner = Inner::default();
        count
    }

    fn remove_locked(inner: &mut Inner, id: ConnectionId) {
        let Some(entry) = inner.connections.remove(&id) else {
            return;
        };

        if let Some(ids) = inner.by_session.get_mut(&entry.session_id) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                inner.by_session.remove(&entry.session_id);
            }
        }

        // Only clear the participant index if it still points at this
        // connection; a replacement may have taken the slot already
        if inner.by_participant.get(&entry.participant_id) == Some(&id) {
            inner.by_participant.remove(&entry.participant_id);
        }
    }
}
