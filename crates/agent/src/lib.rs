//! The agent loop: the heart of rootbound.
//!
//! The agent follows a **request → act → observe** cycle:
//!
//! 1. **Budget** the conversation (evict oldest entries over the ceiling)
//! 2. **Send** transcript + tool catalog + system prompt to the model
//! 3. **If tool calls**: dispatch each in order, append observations, loop
//! 4. **If text**: that is the answer
//!
//! The loop ends on a final answer, an empty response, a transport fault,
//! or when the iteration bound is reached.

pub mod approval;
pub mod context;
pub mod event;
pub mod loop_runner;
pub mod prompt;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use approval::{Approver, AutoApprove};
pub use context::ContextBudgeter;
pub use event::AgentEvent;
pub use loop_runner::{AgentLoop, RunOutcome, TerminalState};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
