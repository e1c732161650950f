//! Tool system for the assistant
//!
//! Tools give the model file access (read, edit, replace), search (grep,
//! glob) and shell execution. Raw model tool calls are validated into a
//! `ToolRequest` before anything runs; failures come back as error
//! `ToolResult`s so the model can react to them.

mod context;
mod error;
mod executor;
mod request;
mod result;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use executor::ToolExecutor;
pub use request::ToolRequest;
pub use result::ToolResult;
