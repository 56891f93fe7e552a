use super::handlers;
use super::state::AppState;
use super::ws;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Realtime connection
        .route("/ws/sessions/:session_id", get(ws::ws_handler))
        // Session queries and control
        .route(
            "/sessions/:session_id/participants",
            get(handlers::list_participants),
        )
        .route("/sessions/:session_id/end", post(handlers::end_session))
        // Supported subtitle languages
        .route("/languages", get(handlers::list_languages))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
