use super::state::AppState;
use crate::connections::ConnectionHandle;
use crate::protocol::{InboundMessage, OutboundMessage, ParticipantEvent};
use crate::translate::languages;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub participant_id: String,

    /// Display name shown on subtitles; the participant id when absent
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_language")]
    pub preferred_language: String,
}

fn default_language() -> String {
    "ko".to_string()
}

/// GET /ws/sessions/:session_id
/// Realtime connection for one participant
pub async fn ws_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, socket, session_id, params))
}

async fn handle_socket(
    state: AppState,
    mut socket: WebSocket,
    session_id: String,
    params: ConnectParams,
) {
    let participant_id = params.participant_id;
    let language = languages::normalize(&params.preferred_language);
    let display_name = params.name.unwrap_or_else(|| participant_id.clone());

    let (handle, mut outbound_rx) =
        match state
            .connections
            .register(&session_id, &participant_id, &language)
        {
            Ok(registered) => registered,
            Err(e) => {
                warn!(
                    "Connection rejected: session={} participant={} error={}",
                    session_id, participant_id, e
                );
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::POLICY,
                        reason: e.to_string().into(),
                    })))
                    .await;
                return;
            }
        };

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer task: drain the connection's outbound queue onto the
    // socket. Ends when the queue closes (unregistration) or the socket
    // rejects a send.
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if ws_tx.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Failed to encode outbound message: {}", e),
            }
        }
        let _ = ws_tx.close().await;
    });

    let session = state.sessions.get_or_create(&session_id);
    session.add_participant(&participant_id, &display_name, &language);

    info!(
        "WebSocket connected: session={} participant={} lang={}",
        session_id, participant_id, language
    );

    state.connections.broadcast(&session_id, |_| {
        OutboundMessage::ParticipantJoined(ParticipantEvent {
            participant_id: participant_id.clone(),
            preferred_language: language.clone(),
        })
    });

    // Read loop: one control message at a time. Audio/text processing is
    // awaited here, so one participant's segments never overlap.
    while let Some(result) = ws_rx.next().await {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                debug!(
                    "WebSocket read error: session={} participant={} error={}",
                    session_id, participant_id, e
                );
                break;
            }
        };

        match message {
            Message::Text(text) => match serde_json::from_str::<InboundMessage>(&text) {
                Ok(inbound) => {
                    handle_inbound(&state, &handle, &session_id, &participant_id, inbound).await
                }
                Err(e) => {
                    warn!(
                        "Ignoring malformed message: session={} participant={} error={}",
                        session_id, participant_id, e
                    );
                }
            },
            Message::Close(_) => break,
            // Protocol-level ping/pong and binary frames are ignored
            _ => {}
        }
    }

    // The registration may already be gone if a newer connection for
    // the same participant replaced this one; in that case the session
    // membership belongs to the replacement and must be left alone.
    let last_language = state
        .connections
        .preferred_language(&handle)
        .unwrap_or_else(|| language.clone());
    let was_live = state.connections.unregister(&handle);

    if was_live {
        state
            .orchestrator
            .forget_stream(&session_id, &participant_id);
        session.remove_participant(&participant_id);

        state.connections.broadcast(&session_id, |_| {
            OutboundMessage::ParticipantLeft(ParticipantEvent {
                participant_id: participant_id.clone(),
                preferred_language: last_language.clone(),
            })
        });

        if state.connections.session_connection_count(&session_id) == 0 {
            state.sessions.end_session(&session_id);
            info!("Last connection left, session {} freed", session_id);
        }
    }

    let _ = writer.await;

    info!(
        "WebSocket disconnected: session={} participant={}",
        session_id, participant_id
    );
}

async fn handle_inbound(
    state: &AppState,
    handle: &ConnectionHandle,
    session_id: &str,
    participant_id: &str,
    message: InboundMessage,
) {
    match message {
        InboundMessage::Audio { data } => {
            state
                .orchestrator
                .process_audio(session_id, participant_id, &data)
                .await;
        }

        InboundMessage::Text { text, language } => {
            state
                .orchestrator
                .process_text(session_id, participant_id, &text, language.as_deref())
                .await;
        }

        InboundMessage::LanguageChange { language } => {
            let language = languages::normalize(&language);
            if !state.connections.set_preferred_language(handle, &language) {
                return;
            }
            if let Some(session) = state.sessions.get(session_id) {
                session.update_language(participant_id, &language);
            }
            let _ = state.connections.send_to_participant(
                participant_id,
                OutboundMessage::LanguageChanged { language },
            );
        }

        InboundMessage::Ping => {
            let _ = state
                .connections
                .send_to_participant(participant_id, OutboundMessage::Pong);
        }
    }
}
