mod config;
mod errors;
mod llm_client;
mod routes;
mod schedule;
mod state;
mod tutor;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{GatewaySettings, GeminiClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mentor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize model gateway
    let gateway = GeminiClient::new(GatewaySettings {
        api_key: config.gemini_api_key.clone(),
        base_url: config.gemini_base_url.clone(),
        model: config.gemini_model.clone(),
        timeout: Duration::from_secs(config.llm_timeout_secs),
    })?;
    info!(
        "Model gateway initialized (model: {}, timeout: {}s, extraction: {:?})",
        config.gemini_model, config.llm_timeout_secs, config.extraction_mode
    );

    let state = AppState {
        gateway: Arc::new(gateway),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
