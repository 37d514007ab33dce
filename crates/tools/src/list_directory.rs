//! Directory listing tool: one line per entry with size and kind.

use async_trait::async_trait;
use rootbound_core::error::ToolError;
use rootbound_core::root::WorkingRoot;
use rootbound_core::tool::{parse_arguments, ParamSpec, ParamType, Tool};
use serde::Deserialize;
use tracing::debug;

pub struct ListDirectoryTool;

#[derive(Debug, Deserialize)]
struct ListDirectoryArgs {
    #[serde(default = "default_directory")]
    directory: String,
}

fn default_directory() -> String {
    ".".into()
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "Lists files in the specified directory along with their sizes, constrained to the working directory."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::optional(
            "directory",
            ParamType::String,
            "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself.",
        )]
    }

    async fn execute(
        &self,
        root: &WorkingRoot,
        arguments: serde_json::Value,
    ) -> Result<String, ToolError> {
        let args: ListDirectoryArgs = parse_arguments(self.name(), arguments)?;
        list_directory(root, &args.directory).await
    }
}

/// List `directory` (relative to `root`).
///
/// Sizes come from each entry's metadata, so directories report their own
/// inode size rather than the size of their contents. Entry order is whatever
/// the platform enumerates.
pub async fn list_directory(root: &WorkingRoot, directory: &str) -> Result<String, ToolError> {
    let target = rootbound_security::resolve(root, directory)?;
    if !target.is_dir() {
        return Err(ToolError::WrongType {
            path: directory.into(),
            expected: "directory".into(),
        });
    }

    let mut entries = tokio::fs::read_dir(&target)
        .await
        .map_err(|e| ToolError::from_io("list", directory, &e))?;

    let mut lines = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ToolError::from_io("list", directory, &e))?
    {
        // Follow symlinks like a plain stat; dangling links fall back to the link itself.
        let metadata = match tokio::fs::metadata(entry.path()).await {
            Ok(m) => m,
            Err(_) => entry
                .metadata()
                .await
                .map_err(|e| ToolError::from_io("list", directory, &e))?,
        };
        lines.push(format!(
            "{}: size={}, is_dir={}",
            entry.file_name().to_string_lossy(),
            metadata.len(),
            metadata.is_dir()
        ));
    }

    debug!(directory = %directory, entries = lines.len(), "Listed directory");
    Ok(lines.join("\n"))
}
