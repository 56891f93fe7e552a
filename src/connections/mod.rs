//! Live connection tracking and language-filtered broadcast
//!
//! The registry exclusively owns connection handles. Each connection is
//! an unbounded outbound queue drained by that connection's writer task;
//! the registry never awaits while holding its lock, so the broadcast
//! path cannot stall on a slow client. Session state refers to
//! participants by id only and never holds a connection.

mod registry;

pub use registry::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, ParticipantSnapshot,
};
