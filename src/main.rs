//! finassist - web backend for a conversational financial assistant
//!
//! Serves the chat UI's API: the thinking-step animation, agent dispatch,
//! prompt-based helpers and a health proxy for the remote backend.

mod agent;
mod api;
mod config;
mod health;
mod llm;
mod stock_names;
mod suggestions;
mod thinking;

use agent::AgentClient;
use api::{create_router, AppState};
use config::AppConfig;
use llm::{build_service, LlmConfig};
use std::net::SocketAddr;
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
                .unwrap_or_else(|_| "finassist=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = %config.backend_url,
        agent = %config.agent_api_url,
        char_delay_ms = %config.animation.char_delay.as_millis(),
        step_pause_ms = %config.animation.step_pause.as_millis(),
        completion_delay_ms = %config.animation.completion_delay.as_millis(),
        "Configuration loaded"
    );

    let llm = build_service(&LlmConfig::from_env());
    match &llm {
        Some(service) => tracing::info!(model = %service.model_id(), "LLM service initialized"),
        None => tracing::warn!(
            "No LLM configured. Set ANTHROPIC_API_KEY or LLM_GATEWAY; suggestions are disabled \
             and stock names use the fallback."
        ),
    }

    let agent = AgentClient::new(&config.agent_api_url)?;
    let port = config.port;

    // Create application state
    let state = AppState::new(config, llm, agent);

    // Create router
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
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("finassist server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
