//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. Only
//! consistency matters here: the estimate is compared against a ceiling,
//! never sent anywhere.

use rootbound_core::message::ConversationEntry;

/// Fixed cost of every entry: role name, delimiters and formatting markers
/// in the API wire format.
pub const ENTRY_OVERHEAD: usize = 4;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Estimate tokens for a single entry including per-entry overhead.
pub fn estimate_entry_tokens(entry: &ConversationEntry) -> usize {
    let payload = match entry {
        ConversationEntry::User { text } => estimate_tokens(text),
        ConversationEntry::Model { text, tool_calls } => {
            let text_cost = text.as_deref().map_or(0, estimate_tokens);
            let calls_cost: usize = tool_calls
                .iter()
                .map(|c| estimate_tokens(&c.name) + estimate_tokens(&c.arguments.to_string()))
                .sum();
            text_cost + calls_cost
        }
        ConversationEntry::Observation(obs) => {
            estimate_tokens(&obs.tool_name) + estimate_tokens(obs.result.text())
        }
    };
    ENTRY_OVERHEAD + payload
}

/// Estimate tokens for a slice of entries.
pub fn estimate_entries_tokens(entries: &[ConversationEntry]) -> usize {
    entries.iter().map(estimate_entry_tokens).sum()
}
