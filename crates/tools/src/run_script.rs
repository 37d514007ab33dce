//! Script tool: run a script file inside the root as a child process.
//!
//! The script is passed to a fixed interpreter with its arguments as a plain
//! argv (no shell), with the working root as its cwd, and is killed and
//! reaped if it outlives the timeout.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use rootbound_core::error::ToolError;
use rootbound_core::root::WorkingRoot;
use rootbound_core::tool::{parse_arguments, ParamSpec, ParamType, Tool};
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SCRIPT_EXTENSION: &str = "py";
pub const DEFAULT_SCRIPT_INTERPRETER: &str = "python3";

/// Execute script files with a hard wall-clock timeout.
pub struct RunScriptTool {
    interpreter: String,
    /// Required file extension, without the dot
    extension: String,
    timeout: Duration,
}

impl RunScriptTool {
    pub fn new(
        interpreter: impl Into<String>,
        extension: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
            timeout,
        }
    }

    /// Validate and run `file_path` with `args`.
    pub async fn run(
        &self,
        root: &WorkingRoot,
        file_path: &str,
        args: &[String],
    ) -> Result<String, ToolError> {
        let script = rootbound_security::resolve(root, file_path)?;
        if !script.exists() {
            return Err(ToolError::NotFound {
                path: file_path.into(),
            });
        }
        if script.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return Err(ToolError::WrongType {
                path: file_path.into(),
                expected: format!(".{} script", self.extension),
            });
        }

        debug!(
            interpreter = %self.interpreter,
            script = %file_path,
            args = args.len(),
            "Running script"
        );

        let mut child = Command::new(&self.interpreter)
            .arg(&script)
            .args(args)
            .current_dir(root.as_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::Spawn {
                path: file_path.into(),
                reason: e.to_string(),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let finished = tokio::time::timeout(self.timeout, async {
            let (out, err, status) = tokio::join!(read_pipe(stdout), read_pipe(stderr), child.wait());
            status.map(|status| (out, err, status))
        })
        .await;

        match finished {
            Ok(Ok((out, err, status))) => Ok(format_output(&out, &err, status)),
            Ok(Err(e)) => Err(ToolError::Spawn {
                path: file_path.into(),
                reason: e.to_string(),
            }),
            Err(_) => {
                warn!(script = %file_path, timeout_secs = self.timeout.as_secs(), "Script timed out, killing");
                // kill() also waits, so the child is reaped before we return.
                if let Err(e) = child.kill().await {
                    warn!(script = %file_path, error = %e, "Failed to kill timed-out script");
                }
                Err(ToolError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

impl Default for RunScriptTool {
    fn default() -> Self {
        Self::new(
            DEFAULT_SCRIPT_INTERPRETER,
            DEFAULT_SCRIPT_EXTENSION,
            DEFAULT_SCRIPT_TIMEOUT,
        )
    }
}

#[derive(Debug, Deserialize)]
struct RunScriptArgs {
    file_path: String,
    #[serde(default)]
    args: Vec<String>,
}

#[async_trait]
impl Tool for RunScriptTool {
    fn name(&self) -> &str {
        "run_script"
    }

    fn description(&self) -> &str {
        "Executes a script securely within the working directory. Returns the script's stdout, stderr, and exit code, or an error."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required(
                "file_path",
                ParamType::String,
                "The path to the script to execute, relative to the working directory.",
            ),
            ParamSpec::optional(
                "args",
                ParamType::Array,
                "Optional: A list of string arguments to pass to the script.",
            ),
        ]
    }

    async fn execute(
        &self,
        root: &WorkingRoot,
        arguments: serde_json::Value,
    ) -> Result<String, ToolError> {
        let args: RunScriptArgs = parse_arguments(self.name(), arguments)?;
        self.run(root, &args.file_path, &args.args).await
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe
        && let Err(e) = pipe.read_to_end(&mut buf).await
    {
        warn!(error = %e, "Failed to read script output");
    }
    buf
}

/// Render captured output: stdout section, stderr section, non-zero exit line.
fn format_output(stdout: &[u8], stderr: &[u8], status: ExitStatus) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    let mut parts = Vec::new();
    if !stdout.is_empty() {
        parts.push(format!("STDOUT:\n{stdout}"));
    }
    if !stderr.is_empty() {
        parts.push(format!("STDERR:\n{stderr}"));
    }
    match status.code() {
        Some(0) => {}
        Some(code) => parts.push(format!("Process exited with code {code}")),
        None => parts.push("Process was terminated by a signal".to_string()),
    }

    if parts.is_empty() {
        "No output produced.".to_string()
    } else {
        parts.join("\n")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn fixture(scripts: &[(&str, &str)]) -> (tempfile::TempDir, WorkingRoot) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in scripts {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let root = WorkingRoot::new(dir.path()).unwrap();
        (dir, root)
    }

    fn sh(timeout: Duration) -> RunScriptTool {
        RunScriptTool::new("sh", "sh", timeout)
    }

    #[test]
    fn tool_definition() {
        let schema = RunScriptTool::default().to_spec().to_json_schema();
        assert_eq!(schema["required"], serde_json::json!(["file_path"]));
        assert_eq!(schema["properties"]["args"]["type"], "array");
    }

    #[tokio::test]
    async fn captures_stdout() {
        let (_dir, root) = fixture(&[("hello.sh", "echo hello\n")]);
        let output = sh(DEFAULT_SCRIPT_TIMEOUT)
            .execute(&root, serde_json::json!({"file_path": "hello.sh"}))
            .await
            .unwrap();
        assert_eq!(output, "STDOUT:\nhello\n");
    }

    #[tokio::test]
    async fn both_streams_and_exit_code() {
        let (_dir, root) = fixture(&[("fail.sh", "echo out\necho err 1>&2\nexit 3\n")]);
        let output = sh(DEFAULT_SCRIPT_TIMEOUT)
            .run(&root, "fail.sh", &[])
            .await
            .unwrap();
        assert!(output.contains("STDOUT:\nout\n"));
        assert!(output.contains("STDERR:\nerr\n"));
        assert!(output.contains("Process exited with code 3"));
    }

    #[tokio::test]
    async fn silent_success_reports_no_output() {
        let (_dir, root) = fixture(&[("quiet.sh", "true\n")]);
        let output = sh(DEFAULT_SCRIPT_TIMEOUT).run(&root, "quiet.sh", &[]).await.unwrap();
        assert_eq!(output, "No output produced.");
    }

    #[tokio::test]
    async fn arguments_are_not_shell_interpreted() {
        let (_dir, root) = fixture(&[("args.sh", "printf '%s|%s' \"$1\" \"$2\"\n")]);
        let output = sh(DEFAULT_SCRIPT_TIMEOUT)
            .execute(
                &root,
                serde_json::json!({"file_path": "args.sh", "args": ["a b; rm -rf /", "$HOME"]}),
            )
            .await
            .unwrap();
        assert_eq!(output, "STDOUT:\na b; rm -rf /|$HOME");
    }

    #[tokio::test]
    async fn runs_in_the_working_root() {
        let (dir, root) = fixture(&[("pwd.sh", "pwd\n")]);
        let output = sh(DEFAULT_SCRIPT_TIMEOUT).run(&root, "pwd.sh", &[]).await.unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(output, format!("STDOUT:\n{}\n", expected.display()));
    }

    #[tokio::test]
    async fn timeout_kills_and_reaps_the_child() {
        let (dir, root) = fixture(&[("slow.sh", "echo $$ > pid.txt\nexec sleep 30\n")]);
        let err = sh(Duration::from_secs(1))
            .run(&root, "slow.sh", &[])
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::Timeout { timeout_secs: 1 });
        assert_eq!(err.to_string(), "Error: execution timed out after 1 seconds");

        let pid = std::fs::read_to_string(dir.path().join("pid.txt")).unwrap();
        if cfg!(target_os = "linux") {
            let proc_entry = std::path::PathBuf::from(format!("/proc/{}", pid.trim()));
            assert!(!proc_entry.exists(), "child {pid} still running");
        }
    }

    #[tokio::test]
    async fn missing_script_is_not_found() {
        let (_dir, root) = fixture(&[]);
        let err = sh(DEFAULT_SCRIPT_TIMEOUT).run(&root, "nope.sh", &[]).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }

    #[tokio::test]
    async fn wrong_extension_rejected() {
        let (_dir, root) = fixture(&[("notes.txt", "echo hi\n")]);
        let err = sh(DEFAULT_SCRIPT_TIMEOUT).run(&root, "notes.txt", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "Error: \"notes.txt\" is not a .sh script");
    }

    #[tokio::test]
    async fn outside_root_checked_before_existence() {
        let (_dir, root) = fixture(&[]);
        let err = sh(DEFAULT_SCRIPT_TIMEOUT)
            .run(&root, "../../definitely/missing.sh", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::OutsideRoot { .. }));
    }

    #[tokio::test]
    async fn missing_interpreter_is_a_spawn_error() {
        let (_dir, root) = fixture(&[("x.sh", "echo hi\n")]);
        let tool = RunScriptTool::new("rootbound-no-such-interpreter", "sh", DEFAULT_SCRIPT_TIMEOUT);
        let err = tool.run(&root, "x.sh", &[]).await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
