//! Environment configuration

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Timing policy for the thinking animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationConfig {
    /// Pause between revealed characters
    pub char_delay: Duration,
    /// Pause after a step finishes, before the next one starts
    pub step_pause: Duration,
    /// Pause after the last step before the completion callback fires
    pub completion_delay: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            char_delay: Duration::from_millis(30),
            step_pause: Duration::from_millis(800),
            completion_delay: Duration::from_millis(1000),
        }
    }
}

impl AnimationConfig {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            char_delay: millis(&lookup, "FINASSIST_CHAR_DELAY_MS")?.unwrap_or(defaults.char_delay),
            step_pause: millis(&lookup, "FINASSIST_STEP_PAUSE_MS")?.unwrap_or(defaults.step_pause),
            completion_delay: millis(&lookup, "FINASSIST_COMPLETION_DELAY_MS")?
                .unwrap_or(defaults.completion_delay),
        })
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Base URL of the remote backend probed by the health check
    pub backend_url: String,
    /// Base URL of the agent API
    pub agent_api_url: String,
    /// User id sent with agent queries
    pub user_id: String,
    pub animation: AnimationConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match lookup("FINASSIST_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: "FINASSIST_PORT",
                expected: "a port number",
                value,
            })?,
            None => 8000,
        };

        let backend_url = lookup("BACKEND_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let agent_api_url = lookup("AGENT_API_URL")
            .map_or_else(|| backend_url.clone(), |url| url.trim_end_matches('/').to_string());

        Ok(Self {
            port,
            backend_url,
            agent_api_url,
            user_id: lookup("FINASSIST_USER_ID").unwrap_or_else(|| "web-user".to_string()),
            animation: AnimationConfig::from_lookup(&lookup)?,
        })
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Invalid {
                    var,
                    expected: "a whole number of milliseconds",
                    value,
                })
        })
        .transpose()
}
