//! Context budget enforcement.
//!
//! The budget is soft: the oldest entries are evicted until the estimate
//! fits, but the last remaining entry is always kept and sent even if it
//! alone is over the ceiling.

use rootbound_core::message::Conversation;
use tracing::{debug, warn};

use super::token::estimate_entries_tokens;

/// Default ceiling, in estimated tokens.
pub const DEFAULT_CONTEXT_CEILING: usize = 8000;

#[derive(Debug, Clone, Copy)]
pub struct ContextBudgeter {
    ceiling: usize,
}

impl ContextBudgeter {
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Estimated size of the whole conversation.
    pub fn estimate(&self, conversation: &Conversation) -> usize {
        estimate_entries_tokens(conversation.entries())
    }

    /// Evict oldest entries while over the ceiling. Returns how many were evicted.
    pub fn enforce(&self, conversation: &mut Conversation) -> usize {
        let mut estimate = self.estimate(conversation);
        let mut evicted = 0;

        while estimate > self.ceiling && conversation.len() > 1 {
            if conversation.evict_oldest().is_none() {
                break;
            }
            evicted += 1;
            estimate = self.estimate(conversation);
        }

        if evicted > 0 {
            debug!(
                conversation_id = %conversation.id,
                evicted,
                estimate,
                ceiling = self.ceiling,
                "Evicted oldest entries to fit context budget"
            );
        }
        if estimate > self.ceiling {
            warn!(
                conversation_id = %conversation.id,
                estimate,
                ceiling = self.ceiling,
                "Conversation still over budget after eviction, sending anyway"
            );
        }

        evicted
    }
}

impl Default for ContextBudgeter {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_CEILING)
    }
}
