//! replace tool - literal substitution within a file

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

/// Arguments for the `replace` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplaceArgs {
    pub path: String,
    /// Exact text to find
    #[serde(rename = "match")]
    pub target: String,
    pub replacement: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        "replace",
        "Replace every occurrence of an exact string in a file. Reports how many \
         replacements were made; zero matches leaves the file untouched.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, relative to the working directory"
                },
                "match": {
                    "type": "string",
                    "description": "Exact text to find, including whitespace"
                },
                "replacement": {
                    "type": "string",
                    "description": "Text to substitute for each match"
                }
            },
            "required": ["path", "match", "replacement"]
        }),
    )
}

/// Replace all occurrences of `target` in `path`, returning the count
///
/// Zero occurrences is a successful no-op; the file is not rewritten.
pub async fn replace(path: &Path, target: &str, replacement: &str) -> Result<usize, ToolError> {
    debug!(?path, "replace: called");
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ToolError::from_io(path, e))?;

    if target.is_empty() {
        return Err(ToolError::InvalidArgument("match must not be empty".to_string()));
    }

    let count = content.matches(target).count();
    debug!(%count, "replace: occurrence count");
    if count == 0 {
        return Ok(0);
    }

    let new_content = content.replace(target, replacement);
    tokio::fs::write(path, new_content)
        .await
        .map_err(|e| ToolError::from_io(path, e))?;

    Ok(count)
}

/// Execute the `replace` tool
pub async fn run(args: &ReplaceArgs, ctx: &ToolContext) -> Result<String, ToolError> {
    let full_path = ctx.validate_path(Path::new(&args.path))?;
    let count = replace(&full_path, &args.target, &args.replacement).await?;
    Ok(format!("Replaced {} occurrence(s) in {}", count, args.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_replace_all_occurrences() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("test.txt");
        fs::write(&file_path, "hello hello hello").unwrap();

        let count = replace(&file_path, "hello", "hi").await.unwrap();

        assert_eq!(count, 3);
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "hi hi hi");
    }

    #[tokio::test]
    async fn test_replace_no_match_leaves_bytes_unchanged() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("test.txt");
        let original: &[u8] = b"hello world\r\n\tindented\n";
        fs::write(&file_path, original).unwrap();
        let modified_before = fs::metadata(&file_path).unwrap().modified().unwrap();

        let count = replace(&file_path, "notfound", "x").await.unwrap();

        assert_eq!(count, 0);
        assert_eq!(fs::read(&file_path).unwrap(), original);
        assert_eq!(fs::metadata(&file_path).unwrap().modified().unwrap(), modified_before);
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let temp = tempdir().unwrap();
        let result = replace(&temp.path().join("missing.txt"), "a", "b").await;
        assert!(matches!(result, Err(ToolError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_replace_missing_with_empty_target_is_not_found() {
        let temp = tempdir().unwrap();
        let result = replace(&temp.path().join("missing.txt"), "", "b").await;
        assert!(matches!(result, Err(ToolError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_replace_empty_target_rejected() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("test.txt");
        fs::write(&file_path, "abc").unwrap();

        let result = replace(&file_path, "", "x").await;
        assert!(matches!(result, Err(ToolError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_run_reports_count() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("lib.rs"), "fn old() {}\nfn old_two() {}").unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());

        let args: ReplaceArgs = serde_json::from_value(serde_json::json!({
            "path": "lib.rs",
            "match": "old",
            "replacement": "new"
        }))
        .unwrap();
        let output = run(&args, &ctx).await.unwrap();

        assert!(output.contains("Replaced 2 occurrence(s)"));
        assert_eq!(
            fs::read_to_string(temp.path().join("lib.rs")).unwrap(),
            "fn new() {}\nfn new_two() {}"
        );
    }
}
