//! HTTP API and WebSocket transport
//!
//! - GET  /ws/sessions/:session_id - realtime connection (subtitles in
//!   the connection's preferred language)
//! - GET  /sessions/:session_id/participants - live connection snapshot
//! - POST /sessions/:session_id/end - end a session explicitly
//! - GET  /languages - supported subtitle languages
//! - GET  /health - health check

mod handlers;
mod routes;
mod state;
mod ws;

pub use routes::create_router;
pub use state::AppState;
