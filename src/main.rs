//! CryptoSage - streaming crypto/finance chat assistant
//!
//! HTTP server hosting the streaming agent-turn orchestrator: user input
//! goes in, fragment operations stream out over SSE, and each completed turn
//! appends exactly one assistant entry to the session transcript.

mod agent;
mod api;
mod orchestrator;
mod render;
mod session;
mod transcript;
mod turn;

use agent::HttpAgentRuntime;
use api::{create_router, AppState};
use orchestrator::TurnOrchestrator;
use session::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cryptosage=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("SAGE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let runtime_url =
        std::env::var("SAGE_RUNTIME_URL").unwrap_or_else(|_| "http://localhost:9800/run".into());

    tracing::info!(runtime_url = %runtime_url, "agent runtime configured");

    let client = reqwest::Client::new();
    let runtime = Arc::new(HttpAgentRuntime::new(client, runtime_url));
    let sessions = SessionManager::new(TurnOrchestrator::new(runtime));
    let state = AppState::new(sessions);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("CryptoSage server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
