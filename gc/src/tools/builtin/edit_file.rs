//! edit tool - overwrite an existing file

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

/// Arguments for the `edit` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditArgs {
    pub path: String,
    /// Complete new file content
    pub content: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        "edit",
        "Overwrite an existing file with new content. The file must already exist; \
         use replace for targeted substitutions.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, relative to the working directory"
                },
                "content": {
                    "type": "string",
                    "description": "Complete new content of the file"
                }
            },
            "required": ["path", "content"]
        }),
    )
}

/// Overwrite `path` with `content`, returning the number of bytes written
///
/// Never creates files: a missing path fails with `NotFound`.
pub async fn edit(path: &Path, content: &str) -> Result<usize, ToolError> {
    debug!(?path, content_len = %content.len(), "edit: called");
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ToolError::from_io(path, e))?;

    if !metadata.is_file() {
        return Err(ToolError::InvalidArgument(format!("{} is not a regular file", path.display())));
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| ToolError::from_io(path, e))?;

    Ok(content.len())
}

/// Execute the `edit` tool
pub async fn run(args: &EditArgs, ctx: &ToolContext) -> Result<String, ToolError> {
    debug!(path = %args.path, "edit_file::run: called");
    let full_path = ctx.validate_path(Path::new(&args.path))?;
    let bytes = edit(&full_path, &args.content).await?;
    Ok(format!("Wrote {} bytes to {}", bytes, args.path))
}
