//! gptcode - a minimal terminal coding assistant
//!
//! A REPL sends the user's messages, with the full conversation history, to
//! an OpenAI chat model. The model answers in text or asks for tools, which
//! run against the local filesystem and feed their results back.
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`tools`] - File, search and shell tools plus the dispatcher
//! - [`repl`] - Interactive session, conversation and slash commands
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod repl;
pub mod tools;

pub use config::Config;
pub use llm::{LlmClient, LlmError, Message, OpenAIClient, ToolCall};
pub use repl::{Conversation, ReplSession, ReplState, run_interactive};
pub use tools::{ToolContext, ToolError, ToolExecutor, ToolRequest, ToolResult};
