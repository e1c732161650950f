//! ToolContext - execution context for tools

use std::path::{Path, PathBuf};
use tracing::debug;

use super::ToolError;

/// Execution context for tools
///
/// Relative tool paths resolve against `worktree` (the directory the
/// assistant was started in). With the sandbox enabled, resolved paths must
/// stay inside it.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Working directory - relative paths are joined onto this
    pub worktree: PathBuf,

    /// Whether sandbox mode is enabled
    pub sandbox_enabled: bool,
}

impl ToolContext {
    /// Create a sandboxed tool context
    pub fn new(worktree: PathBuf) -> Self {
        debug!(?worktree, "ToolContext::new: called");
        Self {
            worktree,
            sandbox_enabled: true,
        }
    }

    /// Create a context with sandbox disabled
    pub fn new_unsandboxed(worktree: PathBuf) -> Self {
        debug!(?worktree, "ToolContext::new_unsandboxed: called");
        Self {
            worktree,
            sandbox_enabled: false,
        }
    }

    /// Normalize a path relative to worktree
    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.worktree.join(path)
        }
    }

    /// Resolve a tool path, enforcing the sandbox when enabled
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        debug!(?path, "ToolContext::validate_path: called");
        let normalized = self.normalize_path(path);

        if !self.sandbox_enabled {
            return Ok(normalized);
        }

        // Existing paths are canonicalized to resolve symlinks and `..`;
        // new files are checked through their parent directory
        let canonical = if normalized.exists() {
            normalized.canonicalize().unwrap_or_else(|_| normalized.clone())
        } else {
            match normalized.parent() {
                Some(parent) if parent.exists() => {
                    let canonical_parent = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
                    canonical_parent.join(normalized.file_name().unwrap_or_default())
                }
                _ => normalized.clone(),
            }
        };

        let worktree_canonical = self.worktree.canonicalize().unwrap_or_else(|_| self.worktree.clone());

        if canonical.starts_with(&worktree_canonical) {
            Ok(canonical)
        } else {
            debug!("ToolContext::validate_path: sandbox violation detected");
            Err(ToolError::SandboxViolation {
                path: path.to_path_buf(),
                worktree: self.worktree.clone(),
            })
        }
    }

    /// Render a path for output, relative to the worktree where possible
    pub fn display_path(&self, path: &Path) -> String {
        let worktree_canonical = self.worktree.canonicalize().ok();
        let relative = path
            .strip_prefix(&self.worktree)
            .ok()
            .or_else(|| worktree_canonical.as_deref().and_then(|w| path.strip_prefix(w).ok()));

        match relative {
            Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Some(rel) => rel.to_string_lossy().to_string(),
            None => path.to_string_lossy().to_string(),
        }
    }
}
