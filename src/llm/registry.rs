//! LLM configuration and service construction

use super::{AnthropicService, LlmService, LoggingService};
use std::sync::Arc;

/// Configuration for the LLM provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub anthropic_api_key: Option<String>,
    /// exe.dev gateway URL (e.g., `http://169.254.169.254/gateway/llm`)
    pub gateway: Option<String>,
    /// Model used for suggestions and stock-name lookups
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            gateway: std::env::var("LLM_GATEWAY").ok(),
            model: std::env::var("SUGGESTION_MODEL").ok(),
        }
    }
}

/// Build the configured LLM service, wrapped with logging.
///
/// Returns `None` when neither an API key nor a gateway is configured.
pub fn build_service(config: &LlmConfig) -> Option<Arc<dyn LlmService>> {
    // In gateway mode the gateway handles authentication
    let api_key = if config.gateway.is_some() {
        "implicit".to_string()
    } else {
        config
            .anthropic_api_key
            .as_ref()
            .filter(|key| !key.is_empty())?
            .clone()
    };

    match AnthropicService::new(api_key, config.model.as_deref(), config.gateway.as_deref()) {
        Ok(service) => Some(Arc::new(LoggingService::new(Arc::new(service)))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create LLM service");
            None
        }
    }
}
