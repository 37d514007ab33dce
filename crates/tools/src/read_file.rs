//! File read tool: read text files inside the root, with truncation.

use async_trait::async_trait;
use rootbound_core::error::ToolError;
use rootbound_core::root::WorkingRoot;
use rootbound_core::tool::{parse_arguments, ParamSpec, ParamType, Tool};
use serde::Deserialize;
use tracing::debug;

/// Default character limit before content is truncated.
pub const DEFAULT_MAX_READ_CHARS: usize = 10_000;

pub struct ReadFileTool {
    max_chars: usize,
}

impl ReadFileTool {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_READ_CHARS)
    }
}

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    file_path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads the content of a specified file, constrained to the working directory. Returns the file's content or an error."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "file_path",
            ParamType::String,
            "The path to the file to read, relative to the working directory. Must be a regular file.",
        )]
    }

    async fn execute(
        &self,
        root: &WorkingRoot,
        arguments: serde_json::Value,
    ) -> Result<String, ToolError> {
        let args: ReadFileArgs = parse_arguments(self.name(), arguments)?;
        read_file(root, &args.file_path, self.max_chars).await
    }
}

/// Read `file_path` as UTF-8 text, truncating after `max_chars` characters.
pub async fn read_file(
    root: &WorkingRoot,
    file_path: &str,
    max_chars: usize,
) -> Result<String, ToolError> {
    let target = rootbound_security::resolve(root, file_path)?;
    if !target.is_file() {
        return Err(ToolError::NotFound {
            path: file_path.into(),
        });
    }

    let bytes = tokio::fs::read(&target)
        .await
        .map_err(|e| ToolError::from_io("read", file_path, &e))?;
    let mut content = String::from_utf8(bytes).map_err(|_| ToolError::DecodeError {
        path: file_path.into(),
    })?;

    if let Some((cut, _)) = content.char_indices().nth(max_chars) {
        debug!(path = %file_path, limit = max_chars, "Truncating file content");
        content.truncate(cut);
        content.push_str(&format!(
            "[...File \"{file_path}\" truncated at {max_chars} characters]"
        ));
    }

    Ok(content)
}
