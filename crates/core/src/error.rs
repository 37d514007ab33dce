//! Error types for the rootbound domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// The top-level error type for rootbound operations.
///
/// Only setup can fail this way. Once the loop is running, tool failures are
/// observations and transport failures are a terminal state.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model transport errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Working root ---
    #[error("Working directory {path} is not usable: {source}")]
    WorkingRoot {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failure of the model capability itself. Always fatal to the agent loop.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failure of a single tool call. Never fatal: it becomes an observation.
///
/// The `Display` text is what the model reads, so every variant renders as a
/// complete sentence starting with `Error:`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Error: Cannot access \"{path}\" as it is outside the permitted working directory")]
    OutsideRoot { path: String },

    #[error("Error: File not found or is not a regular file: \"{path}\"")]
    NotFound { path: String },

    #[error("Error: \"{path}\" is not a {expected}")]
    WrongType { path: String, expected: String },

    #[error("Error: Permission denied to access \"{path}\"")]
    PermissionDenied { path: String },

    #[error(
        "Error: Could not decode file \"{path}\". It might not be a text file or uses an unsupported encoding."
    )]
    DecodeError { path: String },

    #[error("Error: execution timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Error: unknown function: {0}")]
    UnknownTool(String),

    #[error("Error: invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Error: {operation} \"{path}\" failed: {reason}")]
    Io {
        operation: String,
        path: String,
        reason: String,
    },

    #[error("Error: executing script \"{path}\": {reason}")]
    Spawn { path: String, reason: String },

    #[error("Error: the call to {0} was declined by the operator")]
    Declined(String),
}

impl ToolError {
    /// Build an `Io` error from a `std::io::Error`, mapping permission
    /// failures to `PermissionDenied`.
    pub fn from_io(operation: &str, path: &str, err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: path.into() },
            std::io::ErrorKind::NotFound => Self::NotFound { path: path.into() },
            _ => Self::Io {
                operation: operation.into(),
                path: path.into(),
                reason: err.to_string(),
            },
        }
    }
}
