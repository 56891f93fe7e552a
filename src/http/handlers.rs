use super::state::AppState;
use crate::connections::ParticipantSnapshot;
use crate::translate::languages;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::info;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ParticipantsResponse {
    pub participants: Vec<ParticipantSnapshot>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub session_id: String,
    pub status: String,
    pub connections_closed: usize,
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /sessions/:session_id/participants
/// Current live connections for a session
pub async fn list_participants(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let participants = state.connections.list_participants(&session_id);
    let count = participants.len();

    (
        StatusCode::OK,
        Json(ParticipantsResponse {
            participants,
            count,
        }),
    )
}

/// POST /sessions/:session_id/end
/// End a session explicitly, closing all of its connections
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    if state.sessions.get(&session_id).is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response();
    }

    let connections_before = state.connections.session_connection_count(&session_id);
    state.orchestrator.end_session(&session_id).await;

    info!("Session {} ended via API", session_id);

    (
        StatusCode::OK,
        Json(EndSessionResponse {
            session_id,
            status: "ended".to_string(),
            connections_closed: connections_before,
        }),
    )
        .into_response()
}

/// GET /languages
/// Supported subtitle languages
pub async fn list_languages() -> impl IntoResponse {
    let languages: Vec<LanguageInfo> = languages::SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, name)| LanguageInfo {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect();

    (StatusCode::OK, Json(languages))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
