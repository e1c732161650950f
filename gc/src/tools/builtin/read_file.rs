//! read tool - read file contents with line numbers

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

const DEFAULT_LIMIT: usize = 2000;
const MAX_LINE_CHARS: usize = 2000;

/// Arguments for the `read` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReadArgs {
    pub path: String,
    /// Line number to start from (1-based)
    #[serde(default)]
    pub offset: Option<usize>,
    /// Max lines to return
    #[serde(default)]
    pub limit: Option<usize>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        "read",
        "Read a file's contents with line numbers.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, relative to the working directory"
                },
                "offset": {
                    "type": "integer",
                    "description": "Line number to start reading from (1-indexed)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Max lines to read (default: 2000)"
                }
            },
            "required": ["path"]
        }),
    )
}

/// Read a whole file as UTF-8 text
///
/// Fails with `NotFound` for a missing path and `Io` for anything else
/// (permissions, directories, invalid UTF-8).
pub async fn read(path: &Path) -> Result<String, ToolError> {
    debug!(?path, "read: called");
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ToolError::from_io(path, e))
}

/// Execute the `read` tool: resolve, read, and number the lines (cat -n style)
pub async fn run(args: &ReadArgs, ctx: &ToolContext) -> Result<String, ToolError> {
    debug!(?args, "read_file::run: called");
    let full_path = ctx.validate_path(Path::new(&args.path))?;
    let content = read(&full_path).await?;

    let offset = args.offset.unwrap_or(1).max(1);
    let limit = args.limit.unwrap_or(DEFAULT_LIMIT);

    if content.is_empty() {
        return Ok(format!("{} is empty", args.path));
    }

    let lines: Vec<String> = content
        .lines()
        .enumerate()
        .skip(offset - 1)
        .take(limit)
        .map(|(i, line)| {
            let shown = if line.chars().count() > MAX_LINE_CHARS {
                format!("{}...", line.chars().take(MAX_LINE_CHARS).collect::<String>())
            } else {
                line.to_string()
            };
            format!("{:>6}│{}", i + 1, shown)
        })
        .collect();

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(path: &str) -> ReadArgs {
        ReadArgs {
            path: path.to_string(),
            offset: None,
            limit: None,
        }
    }

    #[tokio::test]
    async fn test_read_returns_exact_contents() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("test.txt");
        fs::write(&file_path, "line 1\nline 2\n").unwrap();

        assert_eq!(read(&file_path).await.unwrap(), "line 1\nline 2\n");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let temp = tempdir().unwrap();
        let result = read(&temp.path().join("nonexistent.txt")).await;
        assert!(matches!(result, Err(ToolError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_read_invalid_utf8_is_io_error() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("binary.bin");
        fs::write(&file_path, [0xff, 0xfe, 0x00, 0x81]).unwrap();

        let result = read(&file_path).await;
        assert!(matches!(result, Err(ToolError::Io { .. })));
    }

    #[tokio::test]
    async fn test_run_numbers_lines() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "line 1\nline 2\nline 3").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let output = run(&args("test.txt"), &ctx).await.unwrap();

        assert!(output.contains("     1│line 1"));
        assert!(output.contains("     3│line 3"));
    }

    #[tokio::test]
    async fn test_run_with_offset_and_limit() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "line 1\nline 2\nline 3\nline 4").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let output = run(
            &ReadArgs {
                path: "test.txt".to_string(),
                offset: Some(2),
                limit: Some(2),
            },
            &ctx,
        )
        .await
        .unwrap();

        assert!(!output.contains("│line 1"));
        assert!(output.contains("     2│line 2"));
        assert!(output.contains("     3│line 3"));
        assert!(!output.contains("line 4"));
    }

    #[tokio::test]
    async fn test_run_empty_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("empty.txt"), "").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf());
        let output = run(&args("empty.txt"), &ctx).await.unwrap();
        assert!(output.contains("is empty"));
    }
}
