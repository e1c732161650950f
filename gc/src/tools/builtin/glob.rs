//! glob tool - find files matching a pattern

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

const DEFAULT_MAX_RESULTS: usize = 1000;

/// Arguments for the `glob` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlobArgs {
    pub pattern: String,
    /// Base directory (default: working directory)
    #[serde(default)]
    pub path: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        "glob",
        "Find files matching a glob pattern (e.g., *.py, **/*.rs). Returns one path per line.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern, relative to the base directory"
                },
                "path": {
                    "type": "string",
                    "description": "Base directory (default: '.')"
                }
            },
            "required": ["pattern"]
        }),
    )
}

/// Lazily list the files under `root` matching `pattern`
///
/// The pattern is relative to `root`; `*` stays within one directory level
/// and `**` recurses. Directories are never yielded.
pub fn glob(pattern: &str, root: &Path) -> Result<impl Iterator<Item = PathBuf>, ToolError> {
    debug!(%pattern, ?root, "glob: called");
    if Path::new(pattern).is_absolute() {
        return Err(ToolError::InvalidArgument(format!(
            "glob pattern must be relative to the base directory: {}",
            pattern
        )));
    }

    let root_str = root
        .to_str()
        .ok_or_else(|| ToolError::InvalidArgument(format!("base path is not valid UTF-8: {}", root.display())))?;

    // Escape the root so directory names like `[draft]` are taken literally
    let full_pattern = Path::new(&glob::Pattern::escape(root_str))
        .join(pattern)
        .to_string_lossy()
        .to_string();

    let paths = glob::glob(&full_pattern)
        .map_err(|e| ToolError::InvalidArgument(format!("Invalid glob pattern: {}", e)))?;

    Ok(paths
        .filter_map(|r| match r {
            Ok(p) => Some(p),
            Err(e) => {
                debug!(%e, "glob: skipping unreadable path");
                None
            }
        })
        .filter(|p| p.is_file()))
}

/// Execute the `glob` tool
pub fn run(args: &GlobArgs, ctx: &ToolContext) -> Result<String, ToolError> {
    debug!(?args, "glob::run: called");
    let base = ctx.validate_path(Path::new(args.path.as_deref().unwrap_or(".")))?;
    if !base.exists() {
        return Err(ToolError::NotFound { path: base });
    }

    let matches: Vec<String> = glob(&args.pattern, &base)?
        .filter(|p| !ctx.sandbox_enabled || ctx.validate_path(p).is_ok())
        .take(DEFAULT_MAX_RESULTS)
        .map(|p| ctx.display_path(&p))
        .collect();

    debug!(matches_count = %matches.len(), "glob::run: matches found");

    if matches.is_empty() {
        Ok("No matches found".to_string())
    } else {
        Ok(matches.join("\n"))
    }
}
