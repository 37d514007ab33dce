//! File write tool: create or overwrite files inside the root.

use async_trait::async_trait;
use rootbound_core::error::ToolError;
use rootbound_core::root::WorkingRoot;
use rootbound_core::tool::{parse_arguments, ParamSpec, ParamType, Tool};
use serde::Deserialize;
use tracing::debug;

pub struct WriteFileTool;

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    file_path: String,
    content: String,
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a file within the working directory. Creates the file if it doesn't exist and overwrites if it does. Returns a success or error message."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required(
                "file_path",
                ParamType::String,
                "The path to the file to write, relative to the working directory.",
            ),
            ParamSpec::required(
                "content",
                ParamType::String,
                "The content string to write into the file.",
            ),
        ]
    }

    async fn execute(
        &self,
        root: &WorkingRoot,
        arguments: serde_json::Value,
    ) -> Result<String, ToolError> {
        let args: WriteFileArgs = parse_arguments(self.name(), arguments)?;
        write_file(root, &args.file_path, &args.content).await
    }
}

/// Write `content` verbatim to `file_path`, creating missing parent directories.
pub async fn write_file(
    root: &WorkingRoot,
    file_path: &str,
    content: &str,
) -> Result<String, ToolError> {
    let target = rootbound_security::resolve(root, file_path)?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ToolError::from_io("create directory for", file_path, &e))?;
    }

    tokio::fs::write(&target, content)
        .await
        .map_err(|e| ToolError::from_io("write", file_path, &e))?;

    let written = content.chars().count();
    debug!(path = %file_path, chars = written, "Wrote file");
    Ok(format!(
        "Successfully wrote to \"{file_path}\" ({written} characters written)"
    ))
}
