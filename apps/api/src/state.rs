use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ModelGateway;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable model backend. Default: GeminiClient; tests swap in a scripted gateway.
    pub gateway: Arc<dyn ModelGateway>,
    pub config: Config,
}
