//! Tool error types

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Path {path} escapes working directory {worktree}")]
    SandboxViolation { path: PathBuf, worktree: PathBuf },

    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Command timed out after {timeout_ms}ms")]
    CommandTimeout { timeout_ms: u64 },

    #[error("Process exited with code {code}.\n{output}")]
    CommandFailed { code: i32, output: String },
}

impl ToolError {
    /// Classify an IO failure on `path`, splitting out missing files
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ToolError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ToolError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
