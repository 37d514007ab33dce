//! Google Gemini provider (`generateContent` API).
//!
//! Gemini has no call ids on the wire, so ids are minted locally and the
//! function name is what links a `functionResponse` back to its call.

use async_trait::async_trait;
use rootbound_core::error::ProviderError;
use rootbound_core::message::ConversationEntry;
use rootbound_core::provider::{ModelRequest, ModelResponse, Provider, Usage};
use rootbound_core::tool::{ToolCall, ToolResult, ToolSpec};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{answered_window, build_http_client, error_for_status};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: build_http_client(),
        }
    }

    /// Point at a different endpoint (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert a request into the Gemini JSON body.
    ///
    /// Consecutive observations are grouped into a single `user` turn, which
    /// is how Gemini expects the answers to a parallel batch of calls.
    pub(crate) fn build_request_body(request: &ModelRequest) -> Value {
        let mut contents: Vec<Value> = Vec::new();
        let mut pending_responses: Vec<Value> = Vec::new();

        for entry in answered_window(&request.conversation) {
            if let ConversationEntry::Observation(obs) = entry {
                let response = match &obs.result {
                    ToolResult::Ok(text) => json!({ "result": text }),
                    ToolResult::Error(text) => json!({ "error": text }),
                };
                pending_responses.push(json!({
                    "functionResponse": { "name": obs.tool_name, "response": response }
                }));
                continue;
            }

            if !pending_responses.is_empty() {
                contents.push(json!({
                    "role": "user",
                    "parts": std::mem::take(&mut pending_responses),
                }));
            }

            match entry {
                ConversationEntry::User { text } => contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": text }],
                })),
                ConversationEntry::Model { text, tool_calls } => {
                    let mut parts = Vec::new();
                    if let Some(text) = text {
                        parts.push(json!({ "text": text }));
                    }
                    for call in tool_calls {
                        parts.push(json!({
                            "functionCall": { "name": call.name, "args": call.arguments }
                        }));
                    }
                    if !parts.is_empty() {
                        contents.push(json!({ "role": "model", "parts": parts }));
                    }
                }
                ConversationEntry::Observation(_) => {}
            }
        }

        if !pending_responses.is_empty() {
            contents.push(json!({ "role": "user", "parts": pending_responses }));
        }

        let mut generation_config = json!({ "temperature": request.temperature });
        if let Some(max) = request.max_output_tokens {
            generation_config["maxOutputTokens"] = json!(max);
        }

        let mut body = json!({
            "contents": contents,
            "systemInstruction": { "parts": [{ "text": request.system_prompt }] },
            "generationConfig": generation_config,
        });

        if !request.tools.is_empty() {
            body["tools"] = json!([{ "functionDeclarations": Self::to_declarations(&request.tools) }]);
        }

        body
    }

    fn to_declarations(tools: &[ToolSpec]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.to_json_schema(),
                })
            })
            .collect()
    }

    /// Pull text, function calls and usage out of the first candidate.
    pub(crate) fn parse_response(parsed: GenerateContentResponse) -> ModelResponse {
        let usage = parsed.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            response_tokens: u.candidates_token_count,
        });

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            warn!(reason = %reason, "Gemini blocked the prompt");
        }

        let parts = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                tool_calls.push(ToolCall::new(fc.name, fc.args.unwrap_or(Value::Null)));
            }
        }

        ModelResponse {
            text: (!text.is_empty()).then_some(text),
            tool_calls,
            usage,
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let body = Self::build_request_body(&request);

        debug!(model = %request.model, entries = request.conversation.len(), "Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = error_for_status(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(Self::parse_response(parsed))
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    args: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rootbound_core::tool::{ParamSpec, ParamType, ToolObservation};

    fn request(conversation: Vec<ConversationEntry>) -> ModelRequest {
        ModelRequest {
            model: "gemini-2.0-flash-001".into(),
            system_prompt: "You are a coding agent.".into(),
            conversation,
            tools: vec![ToolSpec {
                name: "read_file".into(),
                description: "Read a file".into(),
                parameters: vec![ParamSpec::required("file_path", ParamType::String, "Path")],
            }],
            temperature: 0.7,
            max_output_tokens: Some(4096),
        }
    }

    fn observation(name: &str, result: ToolResult) -> ConversationEntry {
        ConversationEntry::Observation(ToolObservation {
            call_id: "id".into(),
            tool_name: name.into(),
            result,
        })
    }

    #[test]
    fn body_carries_system_instruction_and_declarations() {
        let body = GeminiProvider::build_request_body(&request(vec![ConversationEntry::user("hi")]));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are a coding agent.");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        let decl = &body["tools"][0]["functionDeclarations"][0];
        assert_eq!(decl["name"], "read_file");
        assert_eq!(decl["parameters"]["required"], json!(["file_path"]));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn observations_are_grouped_after_the_calls() {
        let calls = vec![
            ToolCall::new("list_directory", json!({})),
            ToolCall::new("read_file", json!({"file_path": "x"})),
        ];
        let body = GeminiProvider::build_request_body(&request(vec![
            ConversationEntry::user("go"),
            ConversationEntry::model_tool_calls(calls),
            observation("list_directory", ToolResult::Ok("a.txt: size=1, is_dir=false".into())),
            observation("read_file", ToolResult::Error("Error: \"x\" not found".into())),
            ConversationEntry::user("again"),
        ]));

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][1]["functionCall"]["name"], "read_file");

        let responses = contents[2]["parts"].as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(
            responses[0]["functionResponse"]["response"]["result"],
            "a.txt: size=1, is_dir=false"
        );
        assert_eq!(
            responses[1]["functionResponse"]["response"]["error"],
            "Error: \"x\" not found"
        );
        assert_eq!(contents[3]["parts"][0]["text"], "again");
    }

    #[test]
    fn parse_function_call_response() {
        let data = r#"{
            "candidates": [{"content": {"role": "model", "parts": [
                {"functionCall": {"name": "run_script", "args": {"file_path": "main.py", "args": ["3 + 5"]}}}
            ]}}],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 9, "totalTokenCount": 129}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(data).unwrap();
        let resp = GeminiProvider::parse_response(parsed);

        assert!(resp.text.is_none());
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.tool_calls[0].name, "run_script");
        assert!(!resp.tool_calls[0].id.is_empty());
        assert_eq!(resp.tool_calls[0].arguments["args"][0], "3 + 5");
        assert_eq!(
            resp.usage,
            Some(Usage { prompt_tokens: 120, response_tokens: 9 })
        );
    }

    #[test]
    fn parse_text_response() {
        let data = r#"{"candidates": [{"content": {"parts": [{"text": "The answer "}, {"text": "is 8."}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(data).unwrap();
        let resp = GeminiProvider::parse_response(parsed);
        assert_eq!(resp.text.as_deref(), Some("The answer is 8."));
        assert!(resp.tool_calls.is_empty());
    }

    #[test]
    fn blocked_prompt_is_an_empty_response() {
        let data = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(data).unwrap();
        assert!(GeminiProvider::parse_response(parsed).is_empty());
    }

    #[test]
    fn candidate_without_content_is_empty() {
        let data = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(data).unwrap();
        assert!(GeminiProvider::parse_response(parsed).is_empty());
    }

    #[test]
    fn function_responses_without_their_call_are_dropped() {
        let call = ToolCall::new("read_file", json!({"file_path": "b.txt"}));
        let body = GeminiProvider::build_request_body(&request(vec![
            observation("read_file", ToolResult::Ok("evicted call".into())),
            observation("list_directory", ToolResult::Ok("a.txt: size=1, is_dir=false".into())),
            ConversationEntry::model_tool_calls(vec![call]),
            observation("read_file", ToolResult::Ok("b".into())),
        ]));

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "model");
        assert_eq!(contents[0]["parts"][0]["functionCall"]["name"], "read_file");
        assert_eq!(contents[1]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(contents[1]["parts"][0]["functionResponse"]["response"]["result"], "b");
    }
}
