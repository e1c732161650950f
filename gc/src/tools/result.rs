//! ToolResult - what a tool call hands back to the conversation

use tracing::debug;

use super::ToolError;

/// Result of a tool execution, rendered as text for the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

impl From<Result<String, ToolError>> for ToolResult {
    fn from(outcome: Result<String, ToolError>) -> Self {
        match outcome {
            Ok(content) => Self::success(content),
            Err(e) => {
                debug!(error = %e, "ToolResult::from: tool failed");
                Self::error(e.to_string())
            }
        }
    }
}
