//! ToolExecutor - dispatches model tool calls to the built-in tools

use tracing::{debug, info};

use crate::llm::{ToolCall, ToolDefinition};

use super::builtin::{edit_file, glob, grep, read_file, replace, run_command};
use super::{ToolContext, ToolError, ToolRequest, ToolResult};

/// Dispatches tool calls for a session
///
/// The tool set is closed: `ToolRequest` enumerates it and `dispatch`
/// matches on it exhaustively.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolExecutor;

impl ToolExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Tool definitions sent to the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            read_file::definition(),
            edit_file::definition(),
            replace::definition(),
            grep::definition(),
            glob::definition(),
            run_command::definition(),
        ]
    }

    /// Run an already-validated request
    pub async fn dispatch(&self, request: &ToolRequest, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(tool = %request.name(), "ToolExecutor::dispatch: called");
        match request {
            ToolRequest::Read(args) => read_file::run(args, ctx).await,
            ToolRequest::Edit(args) => edit_file::run(args, ctx).await,
            ToolRequest::Replace(args) => replace::run(args, ctx).await,
            ToolRequest::Grep(args) => grep::run(args, ctx),
            ToolRequest::Glob(args) => glob::run(args, ctx),
            ToolRequest::RunCommand(args) => run_command::run(args, ctx).await,
        }
    }

    /// Parse and run a raw tool call, rendering any failure as an error result
    pub async fn execute(&self, tool_call: &ToolCall, ctx: &ToolContext) -> ToolResult {
        let outcome = match ToolRequest::parse(tool_call) {
            Ok(request) => {
                info!(tool = %request.name(), target = %request.summary(), "Executing tool");
                self.dispatch(&request, ctx).await
            }
            Err(e) => Err(e),
        };
        ToolResult::from(outcome)
    }
}
