//! Client for the remote agent API
//!
//! Dispatch only acknowledges the query; the agent's answer is delivered
//! out-of-band.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const SESSION_PREFIX: &str = "session_";
const MIN_SESSION_ID_LEN: usize = 21;
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("agent API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Query forwarded to the agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentRequest {
    pub user_id: String,
    pub session_id: String,
    pub query: String,
}

/// Acknowledgement returned by the agent API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentAck {
    pub status: String,
    pub message: String,
}

/// New client-side session id: `session_<unix millis>_<9 random chars>`
pub fn generate_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{SESSION_PREFIX}{}_{suffix}", Utc::now().timestamp_millis())
}

pub fn is_valid_session_id(id: &str) -> bool {
    id.starts_with(SESSION_PREFIX) && id.len() >= MIN_SESSION_ID_LEN
}

pub struct AgentClient {
    client: Client,
    query_url: String,
}

impl AgentClient {
    pub fn new(base_url: &str) -> Result<Self, AgentError> {
        let client = Client::builder().timeout(DISPATCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            query_url: format!("{}/query", base_url.trim_end_matches('/')),
        })
    }

    /// Forward a query to the agent. Single attempt; errors go to the caller.
    pub async fn dispatch(&self, request: &AgentRequest) -> Result<AgentAck, AgentError> {
        tracing::info!(
            user_id = %request.user_id,
            session_id = %request.session_id,
            "Dispatching query to agent"
        );

        let response = self.client.post(&self.query_url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Agent API rejected query");
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<AgentAck>().await?)
    }
}
