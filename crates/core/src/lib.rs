//! # rootbound core
//!
//! Domain types, traits, and error definitions for the rootbound agent.
//! This crate has no framework dependencies. It defines the domain model
//! that the other crates implement against.
//!
//! ## Design
//!
//! The model transport and the tools are traits here. Implementations live in
//! their own crates, which keeps the dependency graph pointing inward and
//! lets tests swap in scripted providers.

pub mod error;
pub mod message;
pub mod provider;
pub mod root;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{Conversation, ConversationEntry, ConversationId};
pub use provider::{ModelRequest, ModelResponse, Provider, Usage};
pub use root::WorkingRoot;
pub use tool::{
    ParamSpec, ParamType, Tool, ToolCall, ToolObservation, ToolRegistry, ToolResult, ToolSpec,
};
