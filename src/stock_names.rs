//! ISIN to display-name lookup
//!
//! Never fails: any problem falls back to a synthetic name derived from the
//! ISIN itself.

use crate::llm::{LlmRequest, LlmService};
use std::time::Duration;
use tokio::time::timeout;

const STOCK_NAME_PROMPT: &str = "Reply with only the common company or fund name for the \
security with this ISIN, with no punctuation or explanation. If you do not know it, reply UNKNOWN.";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_NAME_LENGTH: usize = 80;

/// `Stock <last 6 chars of isin>`, or the whole ISIN when it is shorter.
/// Surrounding whitespace is ignored.
pub fn fallback_name(isin: &str) -> String {
    let trimmed = isin.trim();
    let count = trimmed.chars().count();
    let tail: String = trimmed.chars().skip(count.saturating_sub(6)).collect();
    format!("Stock {tail}")
}

/// Resolve a human-readable name for `isin`
pub async fn resolve_stock_name(isin: &str, llm: Option<&dyn LlmService>) -> String {
    let Some(llm) = llm else {
        return fallback_name(isin);
    };

    let request = LlmRequest::prompt(Some(STOCK_NAME_PROMPT), isin.trim(), 30);

    match timeout(LOOKUP_TIMEOUT, llm.complete(&request)).await {
        Ok(Ok(response)) => match clean_name(&response.text()) {
            Some(name) => name,
            None => {
                tracing::warn!(isin = %isin, "Stock name lookup returned no usable name");
                fallback_name(isin)
            }
        },
        Ok(Err(e)) => {
            tracing::warn!(isin = %isin, error = %e.message, "Stock name lookup failed");
            fallback_name(isin)
        }
        Err(_) => {
            tracing::warn!(isin = %isin, "Stock name lookup timed out");
            fallback_name(isin)
        }
    }
}

fn clean_name(text: &str) -> Option<String> {
    let name = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())?
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.');

    if name.is_empty() || name.eq_ignore_ascii_case("unknown") || name.chars().count() > MAX_NAME_LENGTH
    {
        return None;
    }
    Some(name.to_string())
}
