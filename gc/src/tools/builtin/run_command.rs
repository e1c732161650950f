//! run_command tool - execute shell commands

use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

const DEFAULT_TIMEOUT_MS: u64 = 120_000;
const MAX_OUTPUT_CHARS: usize = 30_000;

/// Arguments for the `run_command` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunCommandArgs {
    pub command: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        "run_command",
        "Run a command in the shell from the working directory and return its output.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to execute"
                },
                "timeout_ms": {
                    "type": "integer",
                    "description": "Timeout in milliseconds (default: 120000)"
                }
            },
            "required": ["command"]
        }),
    )
}

fn truncate(output: String) -> String {
    if output.chars().count() > MAX_OUTPUT_CHARS {
        let head: String = output.chars().take(MAX_OUTPUT_CHARS).collect();
        format!("{}...\n[truncated, {} chars total]", head, output.chars().count())
    } else {
        output
    }
}

/// Execute the `run_command` tool
///
/// A non-zero exit status is reported as `CommandFailed` carrying stderr.
pub async fn run(args: &RunCommandArgs, ctx: &ToolContext) -> Result<String, ToolError> {
    debug!(command = %args.command, "run_command::run: called");
    let timeout_ms = args.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);

    let output = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&args.command)
            .current_dir(&ctx.worktree)
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| ToolError::CommandTimeout { timeout_ms })?
    .map_err(|e| ToolError::Io {
        path: ctx.worktree.clone(),
        source: e,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    debug!(status = ?output.status, stdout_len = %stdout.len(), stderr_len = %stderr.len(), "run_command::run: completed");

    if !output.status.success() {
        return Err(ToolError::CommandFailed {
            code: output.status.code().unwrap_or(-1),
            output: truncate(stderr),
        });
    }

    let combined = if stderr.is_empty() {
        stdout
    } else if stdout.is_empty() {
        stderr
    } else {
        format!("{}\n\nSTDERR:\n{}", stdout, stderr)
    };

    Ok(truncate(combined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(command: &str) -> RunCommandArgs {
        RunCommandArgs {
            command: command.to_string(),
            timeout_ms: None,
        }
    }

    #[tokio::test]
    async fn test_run_command_basic() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());

        let output = run(&args("echo hello"), &ctx).await.unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_command_uses_worktree() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("marker.txt"), "").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());

        let output = run(&args("ls"), &ctx).await.unwrap();
        assert!(output.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_run_command_failure_reports_code_and_stderr() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());

        let err = run(&args("echo oops >&2; exit 3"), &ctx).await.unwrap_err();
        match err {
            ToolError::CommandFailed { code, output } => {
                assert_eq!(code, 3);
                assert!(output.contains("oops"));
            }
            other => panic!("Expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_command_timeout() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());

        let err = run(
            &RunCommandArgs {
                command: "sleep 5".to_string(),
                timeout_ms: Some(50),
            },
            &ctx,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ToolError::CommandTimeout { timeout_ms: 50 }));
    }
}
