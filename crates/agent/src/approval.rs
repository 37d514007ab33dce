//! Operator approval of tool calls.
//!
//! Consulted once per call, before dispatch. A refused call is never
//! executed; the model sees a `Declined` error observation instead.

use async_trait::async_trait;
use rootbound_core::tool::ToolCall;

#[async_trait]
pub trait Approver: Send + Sync {
    async fn approve(&self, call: &ToolCall) -> bool;
}

/// Approves everything. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl Approver for AutoApprove {
    async fn approve(&self, _call: &ToolCall) -> bool {
        true
    }
}
