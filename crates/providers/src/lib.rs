//! Model provider implementations for rootbound.
//!
//! All providers implement the `rootbound_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod gemini;
pub mod openai_compat;
pub mod router;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};

use std::time::Duration;

use rootbound_core::error::ProviderError;
use rootbound_core::message::ConversationEntry;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// The part of `conversation` a transport can send.
///
/// Eviction works from the front, so the window may open with observations
/// whose calls are gone. Both wire formats reject a tool answer with no
/// preceding call, so that leading run is skipped.
pub(crate) fn answered_window(conversation: &[ConversationEntry]) -> &[ConversationEntry] {
    let start = conversation
        .iter()
        .position(|e| !matches!(e, ConversationEntry::Observation(_)))
        .unwrap_or(conversation.len());
    if start > 0 {
        debug!(skipped = start, "Skipping observations whose calls were evicted");
    }
    &conversation[start..]
}

/// Map a non-success HTTP status to the matching `ProviderError`.
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ));
    }

    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, "Provider returned error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}
