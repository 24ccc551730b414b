//! API request and response types

use crate::thinking::RunId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request for follow-up suggestions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub chat_history: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<String>,
}

/// Request to send a chat query to the agent
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Agent acknowledgement plus the session the query was sent under
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: String,
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StockNameRequest {
    pub isin: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockNameResponse {
    pub stock_name: String,
}

/// Health of this server and of the remote backend
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub frontend: &'static str,
    pub backend: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

/// Request carrying a list of thinking steps
#[derive(Debug, Deserialize)]
pub struct StepsRequest {
    pub steps: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StartThinkingResponse {
    pub run_id: RunId,
}

/// Response for actions without a payload
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub ok: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
