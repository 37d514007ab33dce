//! Shared test helpers for agent loop tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use rootbound_core::error::ProviderError;
use rootbound_core::provider::{ModelRequest, ModelResponse, Provider, Usage};
use rootbound_core::tool::ToolCall;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `generate` pops the next response and records the request.
/// Running past the script is an `InvalidResponse` error.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ModelResponse, ProviderError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<ModelResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every response succeeds.
    pub fn ok(responses: Vec<ModelResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::InvalidResponse("script exhausted".into())))
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        response_tokens: 5,
    })
}

/// A final text response.
pub fn text_response(text: &str) -> ModelResponse {
    ModelResponse {
        text: Some(text.into()),
        tool_calls: vec![],
        usage: usage(),
    }
}

/// A response carrying only tool calls.
pub fn call_response(calls: Vec<ToolCall>) -> ModelResponse {
    ModelResponse {
        text: None,
        tool_calls: calls,
        usage: usage(),
    }
}

/// Shorthand for a single tool call.
pub fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall::new(name, arguments)
}
