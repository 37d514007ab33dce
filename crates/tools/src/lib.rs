//! Built-in tool implementations for rootbound.
//!
//! Tools give the agent the ability to work inside its working root:
//! list directories, read and write files, and run scripts. Every path
//! argument goes through [`rootbound_security::resolve`] first.

pub mod list_directory;
pub mod read_file;
pub mod run_script;
pub mod write_file;

use std::time::Duration;

use rootbound_core::root::WorkingRoot;
use rootbound_core::tool::ToolRegistry;

pub use list_directory::ListDirectoryTool;
pub use read_file::ReadFileTool;
pub use run_script::RunScriptTool;
pub use write_file::WriteFileTool;

/// Tunables for the built-in tools.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Characters returned by `read_file` before truncation
    pub max_read_chars: usize,
    /// Interpreter binary `run_script` launches
    pub script_interpreter: String,
    /// Extension a script must have, without the dot
    pub script_extension: String,
    /// Wall-clock limit for one script run
    pub script_timeout: Duration,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            max_read_chars: read_file::DEFAULT_MAX_READ_CHARS,
            script_interpreter: run_script::DEFAULT_SCRIPT_INTERPRETER.into(),
            script_extension: run_script::DEFAULT_SCRIPT_EXTENSION.into(),
            script_timeout: run_script::DEFAULT_SCRIPT_TIMEOUT,
        }
    }
}

/// Create the registry with the four built-in tools, bound to `root`.
///
/// Catalog order: `list_directory`, `read_file`, `run_script`, `write_file`.
pub fn default_registry(root: WorkingRoot, settings: &ToolSettings) -> ToolRegistry {
    let mut registry = ToolRegistry::new(root);
    registry.register(Box::new(ListDirectoryTool));
    registry.register(Box::new(ReadFileTool::new(settings.max_read_chars)));
    registry.register(Box::new(RunScriptTool::new(
        settings.script_interpreter.clone(),
        settings.script_extension.clone(),
        settings.script_timeout,
    )));
    registry.register(Box::new(WriteFileTool));
    registry
}
