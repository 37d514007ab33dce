//! Progress events emitted by the agent loop.
//!
//! The loop never prints. Front ends subscribe through an unbounded channel
//! and decide what to show (the CLI renders them differently with
//! `--verbose`).

use rootbound_core::provider::Usage;
use serde::{Deserialize, Serialize};

use crate::loop_runner::TerminalState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A model call completed.
    ModelCall {
        iteration: u32,
        usage: Option<Usage>,
    },

    /// The model asked for a tool.
    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },

    /// A tool call finished (or was declined).
    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    /// Oldest entries were dropped to fit the context budget.
    Evicted { count: usize, estimate: usize },

    /// The loop reached a terminal state.
    Done {
        status: TerminalState,
        iterations: u32,
    },
}

impl AgentEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ModelCall { .. } => "model_call",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Evicted { .. } => "evicted",
            Self::Done { .. } => "done",
        }
    }
}
