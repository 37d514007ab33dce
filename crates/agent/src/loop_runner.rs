//! The agent reasoning loop implementation.

use std::sync::Arc;

use rootbound_core::error::ToolError;
use rootbound_core::message::{Conversation, ConversationEntry};
use rootbound_core::provider::{ModelRequest, Provider, Usage};
use rootbound_core::tool::{ToolCall, ToolObservation, ToolRegistry, ToolResult};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::approval::{Approver, AutoApprove};
use crate::context::ContextBudgeter;
use crate::event::AgentEvent;
use crate::prompt::DEFAULT_SYSTEM_PROMPT;

pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

pub const EXHAUSTED_TEXT: &str = "Maximum iterations reached without a final answer.";
pub const EMPTY_TEXT: &str = "The model returned an empty response (no text and no function calls).";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    /// The model produced a final answer.
    Success,
    /// The model produced neither text nor tool calls.
    Empty,
    /// The iteration bound was reached.
    Exhausted,
    /// The model call itself failed.
    Fault,
}

/// Result of `AgentLoop::run`. `text` is always set, whatever the status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: TerminalState,
    pub text: String,
    pub iterations: u32,
    pub usage_total: Usage,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TerminalState::Success
    }
}

/// The core agent loop that orchestrates model calls and tool execution.
pub struct AgentLoop {
    /// The model provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Tool registry, bound to the working root
    tools: Arc<ToolRegistry>,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per model response
    max_tokens: Option<u32>,

    /// Maximum model calls per run
    max_iterations: u32,

    budgeter: ContextBudgeter,

    system_prompt: String,

    approver: Arc<dyn Approver>,

    /// Optional observer for progress events
    events: Option<UnboundedSender<AgentEvent>>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            model: model.into(),
            tools,
            temperature: 0.7,
            max_tokens: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            budgeter: ContextBudgeter::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            approver: Arc::new(AutoApprove),
            events: None,
        }
    }

    /// Set the maximum number of model calls per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the context budget ceiling, in estimated tokens.
    pub fn with_context_ceiling(mut self, ceiling: usize) -> Self {
        self.budgeter = ContextBudgeter::new(ceiling);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Ask `approver` before every tool call.
    pub fn with_approver(mut self, approver: Arc<dyn Approver>) -> Self {
        self.approver = approver;
        self
    }

    /// Send progress events to `sender`.
    pub fn with_events(mut self, sender: UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Run the loop on a fresh conversation seeded with `prompt`.
    pub async fn run(&self, prompt: impl Into<String>) -> RunOutcome {
        let mut conversation = Conversation::new(prompt);
        self.run_conversation(&mut conversation).await
    }

    /// Run the loop on an existing conversation, appending to it in place.
    ///
    /// Each iteration: enforce the budget, call the model, then either
    /// dispatch the returned tool calls in order or stop on text, on an
    /// empty response, or on a transport fault.
    pub async fn run_conversation(&self, conversation: &mut Conversation) -> RunOutcome {
        info!(
            conversation_id = %conversation.id,
            model = %self.model,
            max_iterations = self.max_iterations,
            "Starting agent run"
        );

        let specs = self.tools.specs();
        let mut usage_total = Usage::default();

        for iteration in 1..=self.max_iterations {
            let evicted = self.budgeter.enforce(conversation);
            if evicted > 0 {
                self.emit(AgentEvent::Evicted {
                    count: evicted,
                    estimate: self.budgeter.estimate(conversation),
                });
            }

            debug!(
                conversation_id = %conversation.id,
                iteration,
                entries = conversation.len(),
                "Agent loop iteration"
            );

            let request = ModelRequest {
                model: self.model.clone(),
                system_prompt: self.system_prompt.clone(),
                conversation: conversation.entries().to_vec(),
                tools: specs.clone(),
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            };

            let response = match self.provider.generate(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(conversation_id = %conversation.id, error = %e, "Model call failed");
                    return self.finish(TerminalState::Fault, e.to_string(), iteration, usage_total);
                }
            };

            if let Some(usage) = response.usage {
                usage_total += usage;
            }
            self.emit(AgentEvent::ModelCall {
                iteration,
                usage: response.usage,
            });

            if !response.tool_calls.is_empty() {
                conversation.push(ConversationEntry::Model {
                    text: response.text.clone(),
                    tool_calls: response.tool_calls.clone(),
                });
                for call in &response.tool_calls {
                    let observation = self.execute(call).await;
                    conversation.push(ConversationEntry::Observation(observation));
                }
                continue;
            }

            return match response.text.filter(|t| !t.trim().is_empty()) {
                Some(text) => {
                    conversation.push(ConversationEntry::model_text(text.clone()));
                    self.finish(TerminalState::Success, text, iteration, usage_total)
                }
                None => {
                    warn!(conversation_id = %conversation.id, "Model returned an empty response");
                    self.finish(TerminalState::Empty, EMPTY_TEXT.into(), iteration, usage_total)
                }
            };
        }

        warn!(
            conversation_id = %conversation.id,
            iterations = self.max_iterations,
            "Max iterations reached without a final answer"
        );
        self.finish(
            TerminalState::Exhausted,
            EXHAUSTED_TEXT.into(),
            self.max_iterations,
            usage_total,
        )
    }

    /// Approve, dispatch and report one tool call.
    async fn execute(&self, call: &ToolCall) -> ToolObservation {
        self.emit(AgentEvent::ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        });

        let observation = if self.approver.approve(call).await {
            self.tools.dispatch(call).await
        } else {
            info!(tool = %call.name, "Tool call declined");
            ToolObservation {
                call_id: call.id.clone(),
                tool_name: call.name.clone(),
                result: ToolResult::Error(ToolError::Declined(call.name.clone()).to_string()),
            }
        };

        self.emit(AgentEvent::ToolResult {
            id: observation.call_id.clone(),
            name: observation.tool_name.clone(),
            output: observation.result.text().to_string(),
            success: observation.result.is_ok(),
        });
        observation
    }

    fn finish(
        &self,
        status: TerminalState,
        text: String,
        iterations: u32,
        usage_total: Usage,
    ) -> RunOutcome {
        info!(?status, iterations, "Agent run finished");
        self.emit(AgentEvent::Done { status, iterations });
        RunOutcome {
            status,
            text,
            iterations,
            usage_total,
        }
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is watching.
            let _ = tx.send(event);
        }
    }
}
