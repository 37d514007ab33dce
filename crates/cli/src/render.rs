//! Turns agent events into the lines printed on stdout.

use rootbound_agent::AgentEvent;

pub struct Renderer {
    verbose: bool,
}

impl Renderer {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Lines to print for `event`; empty when the event is silent at this verbosity.
    pub fn lines(&self, event: &AgentEvent) -> Vec<String> {
        match event {
            AgentEvent::ModelCall {
                usage: Some(usage), ..
            } if self.verbose => vec![
                format!("Prompt tokens: {}", usage.prompt_tokens),
                format!("Response tokens: {}", usage.response_tokens),
            ],
            AgentEvent::ToolCall {
                name, arguments, ..
            } => {
                if self.verbose {
                    vec![format!(" - Calling function: {name}({arguments})")]
                } else {
                    vec![format!(" - Calling function: {name}")]
                }
            }
            AgentEvent::ToolResult { output, .. } if self.verbose => {
                vec![format!("-> {output}")]
            }
            AgentEvent::Evicted { count, estimate } if self.verbose => vec![format!(
                "[context] dropped {count} oldest entries, ~{estimate} tokens remain"
            )],
            _ => Vec::new(),
        }
    }
}
