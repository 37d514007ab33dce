//! `--confirm`: ask the operator on stdin before each tool call.

use async_trait::async_trait;
use rootbound_agent::Approver;
use rootbound_core::tool::ToolCall;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;
use tracing::warn;

pub struct StdinApprover {
    input: Mutex<BufReader<Stdin>>,
}

impl StdinApprover {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for StdinApprover {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Approver for StdinApprover {
    async fn approve(&self, call: &ToolCall) -> bool {
        let mut input = self.input.lock().await;

        let question = format!("Approve call to {}({})? [y/N] ", call.name, call.arguments);
        let mut stderr = tokio::io::stderr();
        if let Err(e) = stderr.write_all(question.as_bytes()).await {
            warn!(error = %e, "Failed to write approval prompt");
        }
        let _ = stderr.flush().await;

        let mut answer = String::new();
        match input.read_line(&mut answer).await {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                warn!(error = %e, "Failed to read approval answer, declining");
                false
            }
        }
    }
}

/// Only an explicit yes approves; EOF and anything else decline.
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
