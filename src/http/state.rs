use crate::config::Config;
use crate::connections::ConnectionRegistry;
use crate::persist::PersistenceSink;
use crate::realtime::RealtimeOrchestrator;
use crate::session::SessionRegistry;
use crate::stt::Transcriber;
use crate::translate::Translator;
use std::sync::Arc;

/// Shared application state for HTTP handlers and WebSocket tasks
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub connections: Arc<ConnectionRegistry>,
    pub orchestrator: Arc<RealtimeOrchestrator>,
}

impl AppState {
    /// Wire the registries and orchestrator around the given
    /// collaborator gateways (real NATS gateways in production, mocks in
    /// tests)
    pub fn new(
        config: Arc<Config>,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        sink: Arc<dyn PersistenceSink>,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new());
        let connections = Arc::new(ConnectionRegistry::new(
            config.realtime.single_connection_per_participant,
        ));
        let orchestrator = Arc::new(RealtimeOrchestrator::new(
            &config,
            Arc::clone(&sessions),
            Arc::clone(&connections),
            transcriber,
            translator,
            sink,
        ));

        Self {
            config,
            sessions,
            connections,
            orchestrator,
        }
    }
}
