use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use subtitle_relay::http::{create_router, AppState};
use subtitle_relay::nats::NatsClient;
use subtitle_relay::persist::NatsPersistence;
use subtitle_relay::stt::NatsTranscriber;
use subtitle_relay::translate::NatsTranslator;
use subtitle_relay::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "subtitle-relay", about = "Realtime multilingual subtitle relay")]
struct Args {
    /// Configuration file (without extension)
    #[arg(long, default_value = "config/subtitle-relay")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Buffer window {}..{}ms, default languages {:?}",
        cfg.audio.min_buffer_ms, cfg.audio.max_buffer_ms, cfg.realtime.default_languages
    );

    let nats = Arc::new(
        NatsClient::connect(
            &cfg.nats.url,
            Duration::from_millis(cfg.nats.request_timeout_ms),
        )
        .await
        .context("Failed to connect to NATS")?,
    );

    let transcriber = Arc::new(NatsTranscriber::new(
        Arc::clone(&nats),
        cfg.audio.sample_rate,
        cfg.audio.channels,
    ));
    let translator = Arc::new(NatsTranslator::new(Arc::clone(&nats)));
    let sink = Arc::new(NatsPersistence::new(Arc::clone(&nats)));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::new(Arc::new(cfg), transcriber, translator, sink);
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Wait for ctrl-c, then drain every live connection so their writer
/// tasks wind down and the server can finish gracefully
async fn shutdown(state: AppState) {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received, draining connections");

    let sessions = state.sessions.drain();
    let connections = state.connections.drain_all();
    info!(
        "Drained {} connections across {} sessions",
        connections,
        sessions.len()
    );
}
