//! HTTP API for the chat front-end

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::agent::AgentClient;
use crate::config::AppConfig;
use crate::llm::LlmService;
use crate::thinking::ThinkingController;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub thinking: Arc<ThinkingController>,
    /// `None` when no LLM is configured
    pub llm: Option<Arc<dyn LlmService>>,
    pub agent: Arc<AgentClient>,
    /// Client for the health probe
    pub http: reqwest::Client,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        llm: Option<Arc<dyn LlmService>>,
        agent: AgentClient,
    ) -> Self {
        Self {
            thinking: Arc::new(ThinkingController::new(config.animation)),
            llm,
            agent: Arc::new(agent),
            http: reqwest::Client::new(),
            config: Arc::new(config),
        }
    }
}
