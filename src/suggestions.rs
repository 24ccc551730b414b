//! Follow-up question suggestions from the chat so far
//!
//! A single prompt to the configured LLM; failures propagate to the caller.

use crate::llm::{LlmError, LlmRequest, LlmService};
use serde::Deserialize;
use thiserror::Error;

const SUGGESTION_SYSTEM: &str = "You are a helpful financial assistant. Based on the conversation, \
suggest short follow-up questions the user might ask next. Respond with JSON only, \
in the form {\"suggestions\": [\"...\", \"...\"]}, containing 2 or 3 suggestions \
of at most 10 words each.";

const MAX_SUGGESTIONS: usize = 3;
const MAX_HISTORY_CHARS: usize = 4000;

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("LLM output was not valid suggestion JSON: {0}")]
    Malformed(String),
    #[error("LLM returned no usable suggestions")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct SuggestionOutput {
    suggestions: Vec<String>,
}

/// Ask the LLM for 2-3 short follow-up questions given the chat history
pub async fn generate_suggestions(
    chat_history: &str,
    llm: &dyn LlmService,
) -> Result<Vec<String>, SuggestionError> {
    let prompt = format!("Conversation:\n{}", tail_chars(chat_history, MAX_HISTORY_CHARS));
    let request = LlmRequest::prompt(Some(SUGGESTION_SYSTEM), prompt, 200);

    let response = llm.complete(&request).await?;
    let suggestions = parse_suggestions(&response.text())?;

    tracing::debug!(count = suggestions.len(), "Generated suggestions");
    Ok(suggestions)
}

/// Extract the suggestion list from raw LLM output, tolerating prose or
/// code fences around the JSON object
fn parse_suggestions(text: &str) -> Result<Vec<String>, SuggestionError> {
    let json = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text.get(start..=end),
        _ => None,
    }
    .ok_or_else(|| SuggestionError::Malformed("no JSON object found".to_string()))?;

    let output: SuggestionOutput =
        serde_json::from_str(json).map_err(|e| SuggestionError::Malformed(e.to_string()))?;

    let suggestions: Vec<String> = output
        .suggestions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_SUGGESTIONS)
        .collect();

    if suggestions.is_empty() {
        return Err(SuggestionError::Empty);
    }
    Ok(suggestions)
}

/// Keep the most recent part of a long history
fn tail_chars(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    text.char_indices()
        .nth(count - max)
        .and_then(|(idx, _)| text.get(idx..))
        .unwrap_or(text)
}
