//! Context window management.
//!
//! The whole transcript is resent every turn, so before each model call the
//! budgeter estimates its size and drops entries from the front until it fits.

pub mod budget;
pub mod token;

pub use budget::{ContextBudgeter, DEFAULT_CONTEXT_CEILING};
pub use token::{estimate_entries_tokens, estimate_entry_tokens, estimate_tokens};
