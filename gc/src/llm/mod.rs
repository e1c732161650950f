//! LLM client module for gptcode
//!
//! Provides the provider-agnostic request/response types, the `LlmClient`
//! trait and the OpenAI Chat Completions implementation.

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{
    CompletionRequest, CompletionResponse, Message, Role, StopReason, StreamChunk, TokenUsage, ToolCall,
    ToolDefinition,
};
