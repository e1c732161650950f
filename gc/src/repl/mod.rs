//! Interactive REPL for gptcode
//!
//! Reads user input, streams model output, dispatches tool calls and
//! handles the local slash commands.

mod commands;
mod conversation;
mod session;

pub use commands::{COMMANDS, CommandInfo, SlashCommand};
pub use conversation::Conversation;
pub use session::{ReplSession, ReplState, build_system_prompt};

use std::sync::Arc;

use eyre::{Context, Result};

use crate::config::Config;
use crate::llm::{LlmClient, OpenAIClient};

/// Run the interactive REPL in the current directory
pub async fn run_interactive(config: &Config, initial_task: Option<String>) -> Result<()> {
    // Fail before the first prompt rather than on the first request
    config.validate()?;

    let llm: Arc<dyn LlmClient> =
        Arc::new(OpenAIClient::from_config(&config.llm).context("Failed to create LLM client")?);

    let worktree = std::env::current_dir().context("Failed to determine working directory")?;

    let mut session = ReplSession::new(llm, worktree, config);
    session.run(initial_task).await
}
