//! ToolRequest - a model tool call, validated into a closed set of variants

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::llm::ToolCall;

use super::ToolError;
use super::builtin::{EditArgs, GlobArgs, GrepArgs, ReadArgs, ReplaceArgs, RunCommandArgs};

/// Every tool the assistant can run, with typed arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    Read(ReadArgs),
    Edit(EditArgs),
    Replace(ReplaceArgs),
    Grep(GrepArgs),
    Glob(GlobArgs),
    RunCommand(RunCommandArgs),
}

impl ToolRequest {
    /// Parse a raw tool call from the model
    ///
    /// Unknown names fail with `UnknownTool`; missing or ill-typed arguments
    /// fail with `InvalidArgument`.
    pub fn parse(call: &ToolCall) -> Result<Self, ToolError> {
        debug!(name = %call.name, "ToolRequest::parse: called");
        match call.name.as_str() {
            "read" => decode(call).map(Self::Read),
            "edit" => decode(call).map(Self::Edit),
            "replace" => decode(call).map(Self::Replace),
            "grep" => decode(call).map(Self::Grep),
            "glob" => decode(call).map(Self::Glob),
            "run_command" => decode(call).map(Self::RunCommand),
            other => Err(ToolError::UnknownTool { name: other.to_string() }),
        }
    }

    /// Tool name as the model sees it
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read(_) => "read",
            Self::Edit(_) => "edit",
            Self::Replace(_) => "replace",
            Self::Grep(_) => "grep",
            Self::Glob(_) => "glob",
            Self::RunCommand(_) => "run_command",
        }
    }

    /// One-line description for terminal output
    pub fn summary(&self) -> String {
        match self {
            Self::Read(a) => a.path.clone(),
            Self::Edit(a) => a.path.clone(),
            Self::Replace(a) => a.path.clone(),
            Self::Grep(a) => format!("{} in {}", a.pattern, a.path.as_deref().unwrap_or(".")),
            Self::Glob(a) => format!("{} in {}", a.pattern, a.path.as_deref().unwrap_or(".")),
            Self::RunCommand(a) => a.command.clone(),
        }
    }
}

fn decode<T: DeserializeOwned>(call: &ToolCall) -> Result<T, ToolError> {
    serde_json::from_value(call.input.clone())
        .map_err(|e| ToolError::InvalidArgument(format!("{}: {}", call.name, e)))
}
