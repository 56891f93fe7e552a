//! Ephemeral per-session state
//!
//! This module tracks who is in a session, which languages the audience
//! currently needs, and the per-session utterance sequence:
//! - `Session` - participants, language preferences, sequence counter
//! - `SessionRegistry` - process-wide map of live sessions, created on
//!   first join and destroyed when the last connection leaves or an
//!   explicit end is requested
//!
//! Sessions never hold connection handles; the connection registry
//! refers to sessions by id only.

mod registry;
mod state;

pub use registry::SessionRegistry;
pub use state::{ParticipantState, Session};
