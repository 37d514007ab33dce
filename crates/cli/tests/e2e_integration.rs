//! End-to-end integration tests for rootbound.
//!
//! These tests exercise the full pipeline from prompt to outcome: the real
//! tool registry, sandbox, budgeter and agent loop, driven by a scripted
//! provider instead of a live model.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rootbound_agent::{AgentLoop, TerminalState};
use rootbound_core::error::ProviderError;
use rootbound_core::message::{Conversation, ConversationEntry};
use rootbound_core::provider::{ModelRequest, ModelResponse, Provider, Usage};
use rootbound_core::root::WorkingRoot;
use rootbound_core::tool::{ToolCall, ToolObservation, ToolRegistry, ToolResult};
use rootbound_tools::{ToolSettings, default_registry};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: Mutex<Vec<ModelResponse>>,
    call_count: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn generate(&self, _request: ModelRequest) -> Result<ModelResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        if *count >= responses.len() {
            panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                *count,
                responses.len()
            );
        }
        let resp = responses[*count].clone();
        *count += 1;
        Ok(resp)
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        response_tokens: 5,
    })
}

fn text_response(text: &str) -> ModelResponse {
    ModelResponse {
        text: Some(text.into()),
        tool_calls: vec![],
        usage: usage(),
    }
}

fn tool_response(calls: Vec<ToolCall>) -> ModelResponse {
    ModelResponse {
        text: None,
        tool_calls: calls,
        usage: usage(),
    }
}

fn registry(dir: &tempfile::TempDir, settings: &ToolSettings) -> Arc<ToolRegistry> {
    let root = WorkingRoot::new(dir.path()).unwrap();
    Arc::new(default_registry(root, settings))
}

fn observations(conv: &Conversation) -> Vec<&ToolObservation> {
    conv.entries()
        .iter()
        .filter_map(|e| match e {
            ConversationEntry::Observation(obs) => Some(obs),
            _ => None,
        })
        .collect()
}

// ── E2E: Listing ────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_list_files_in_the_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "0123456789").unwrap();
    std::fs::create_dir(dir.path().join("b")).unwrap();
    let dir_size = std::fs::metadata(dir.path().join("b")).unwrap().len();

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![ToolCall::new("list_directory", serde_json::json!({}))]),
        text_response("The root holds a.txt and a directory b."),
    ]));
    let agent = AgentLoop::new(provider.clone(), "mock-model", registry(&dir, &ToolSettings::default()));

    let mut conv = Conversation::new("list files in the root");
    let outcome = agent.run_conversation(&mut conv).await;

    assert_eq!(outcome.status, TerminalState::Success);
    assert_eq!(provider.calls(), 2);

    let obs = observations(&conv);
    assert_eq!(obs.len(), 1);
    assert_eq!(obs[0].tool_name, "list_directory");
    let ToolResult::Ok(listing) = &obs[0].result else {
        panic!("listing failed: {:?}", obs[0].result);
    };
    let lines: HashSet<&str> = listing.lines().collect();
    let expected_dir = format!("b: size={dir_size}, is_dir=true");
    let expected: HashSet<&str> = ["a.txt: size=10, is_dir=false", expected_dir.as_str()]
        .into_iter()
        .collect();
    assert_eq!(lines, expected);
}

#[tokio::test]
async fn e2e_model_cannot_move_the_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("inside.txt"), "x").unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![ToolCall::new(
            "list_directory",
            serde_json::json!({"working_directory": "/", "directory": "."}),
        )]),
        text_response("done"),
    ]));
    let agent = AgentLoop::new(provider, "mock-model", registry(&dir, &ToolSettings::default()));

    let mut conv = Conversation::new("list /");
    agent.run_conversation(&mut conv).await;

    let obs = observations(&conv);
    assert_eq!(obs[0].result, ToolResult::Ok("inside.txt: size=1, is_dir=false".into()));
}

// ── E2E: Sandbox violations become observations ────────────────────────

#[tokio::test]
async fn e2e_escape_attempts_are_reported_not_fatal() {
    let outer = tempfile::tempdir().unwrap();
    let workdir = outer.path().join("work");
    std::fs::create_dir(&workdir).unwrap();
    std::fs::write(outer.path().join("secret.txt"), "top secret").unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![
            ToolCall::new("read_file", serde_json::json!({"file_path": "../secret.txt"})),
            ToolCall::new("write_file", serde_json::json!({"file_path": "/tmp/evil.txt", "content": "x"})),
            ToolCall::new("frobnicate", serde_json::json!({})),
        ]),
        text_response("I cannot access files outside the working directory."),
    ]));
    let root = WorkingRoot::new(&workdir).unwrap();
    let tools = Arc::new(default_registry(root, &ToolSettings::default()));
    let agent = AgentLoop::new(provider, "mock-model", tools);

    let mut conv = Conversation::new("read ../secret.txt");
    let outcome = agent.run_conversation(&mut conv).await;

    assert_eq!(outcome.status, TerminalState::Success);
    let obs = observations(&conv);
    assert_eq!(obs.len(), 3);
    assert!(obs.iter().all(|o| !o.result.is_ok()));
    assert!(obs[0].result.text().contains("outside"));
    assert!(!obs[0].result.text().contains("top secret"));
    assert!(obs[2].result.text().contains("frobnicate"));
}

// ── E2E: Exhaustion ─────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_twenty_one_tool_turns_exhaust_at_twenty() {
    let dir = tempfile::tempdir().unwrap();
    let responses = (0..21)
        .map(|_| tool_response(vec![ToolCall::new("list_directory", serde_json::json!({}))]))
        .collect();
    let provider = Arc::new(ScriptedProvider::new(responses));
    let agent = AgentLoop::new(provider.clone(), "mock-model", registry(&dir, &ToolSettings::default()));

    let outcome = agent.run("keep listing forever").await;

    assert_eq!(outcome.status, TerminalState::Exhausted);
    assert_ne!(outcome.status, TerminalState::Success);
    assert_eq!(outcome.iterations, 20);
    assert_eq!(provider.calls(), 20);
    assert_eq!(outcome.usage_total.prompt_tokens, 200);
}

// ── E2E: Write, run, read ───────────────────────────────────────────────

#[cfg(unix)]
#[tokio::test]
async fn e2e_write_and_run_a_script() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ToolSettings {
        script_interpreter: "sh".into(),
        script_extension: "sh".into(),
        ..ToolSettings::default()
    };

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![ToolCall::new(
            "write_file",
            serde_json::json!({
                "file_path": "tools/add.sh",
                "content": "echo $(($1 + $2))\n",
            }),
        )]),
        tool_response(vec![ToolCall::new(
            "run_script",
            serde_json::json!({"file_path": "tools/add.sh", "args": ["3", "5"]}),
        )]),
        text_response("3 + 5 = 8"),
    ]));
    let agent = AgentLoop::new(provider, "mock-model", registry(&dir, &settings));

    let mut conv = Conversation::new("add 3 and 5 with a script");
    let outcome = agent.run_conversation(&mut conv).await;

    assert_eq!(outcome.status, TerminalState::Success);
    assert_eq!(outcome.text, "3 + 5 = 8");
    let obs = observations(&conv);
    assert_eq!(
        obs[0].result,
        ToolResult::Ok("Successfully wrote to \"tools/add.sh\" (18 characters written)".into())
    );
    assert_eq!(obs[1].result, ToolResult::Ok("STDOUT:\n8\n".into()));
}

// ── Binary surface ──────────────────────────────────────────────────────

#[test]
fn binary_without_prompt_exits_1() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_rootbound"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Please provide a prompt"));
}

#[test]
fn binary_rejects_missing_working_directory() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("does-not-exist");
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_rootbound"))
        .arg("hello")
        .arg("--workdir")
        .arg(&missing)
        .env("HOME", home.path())
        .env("GEMINI_API_KEY", "test-key")
        .env_remove("ROOTBOUND_PROVIDER")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("is not usable"));
}
