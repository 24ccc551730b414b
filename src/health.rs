//! Remote backend health probe

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of probing the backend's `/health` endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum BackendHealth {
    /// Backend answered 2xx; carries its body (or `"healthy"` if not JSON)
    Healthy(Value),
    Unhealthy(String),
}

pub async fn probe_backend(client: &Client, backend_url: &str) -> BackendHealth {
    let url = format!("{}/health", backend_url.trim_end_matches('/'));

    let response = match client.get(&url).timeout(PROBE_TIMEOUT).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Backend health check failed");
            return BackendHealth::Unhealthy(e.to_string());
        }
    };

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %url, status = status.as_u16(), "Backend reported unhealthy");
        return BackendHealth::Unhealthy(format!("backend returned HTTP {}", status.as_u16()));
    }

    match response.text().await {
        Ok(body) => BackendHealth::Healthy(
            serde_json::from_str(&body).unwrap_or_else(|_| Value::String("healthy".to_string())),
        ),
        Err(e) => BackendHealth::Unhealthy(format!("failed to read backend response: {e}")),
    }
}
