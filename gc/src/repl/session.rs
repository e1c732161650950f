//! REPL session management

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::commands::{COMMANDS, SlashCommand};
use super::conversation::Conversation;
use crate::config::Config;
use crate::llm::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, Role, StopReason, StreamChunk, ToolCall,
};
use crate::tools::{ToolContext, ToolExecutor, ToolRequest};

const DISPLAY_LIMIT: usize = 2000;

/// Where the session is in its input/model/tool cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ReplState {
    /// Waiting for the user
    Idle,
    /// A request with the full history is in flight
    AwaitingModelResponse,
    /// The model asked for these tools, in order
    DispatchingTools(Vec<ToolCall>),
    /// Terminal
    Exited,
}

/// Interactive REPL session
pub struct ReplSession {
    llm: Arc<dyn LlmClient>,
    tool_executor: ToolExecutor,
    tool_context: ToolContext,
    conversation: Conversation,
    system_prompt: String,
    worktree: PathBuf,
    max_tokens: u32,
    max_tool_rounds: usize,
}

impl ReplSession {
    /// Create a new REPL session
    pub fn new(llm: Arc<dyn LlmClient>, worktree: PathBuf, config: &Config) -> Self {
        debug!(worktree = %worktree.display(), "ReplSession::new: called");
        let tool_context = if config.repl.sandbox {
            ToolContext::new(worktree.clone())
        } else {
            ToolContext::new_unsandboxed(worktree.clone())
        };

        Self {
            llm,
            tool_executor: ToolExecutor::new(),
            tool_context,
            conversation: Conversation::new(),
            system_prompt: build_system_prompt(&worktree),
            worktree,
            max_tokens: config.llm.max_tokens,
            max_tool_rounds: config.repl.max_tool_rounds.max(1),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial_task: Option<String>) -> Result<()> {
        info!("REPL session started");
        self.print_welcome();

        if let Some(task) = initial_task {
            println!("{} {}", ">".bright_green(), task);
            if self.handle_input(&task).await == ReplState::Exited {
                println!("Goodbye!");
                return Ok(());
            }
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if self.handle_input(input).await == ReplState::Exited {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C drops the current line only
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        info!("REPL session ended");
        println!("Goodbye!");
        Ok(())
    }

    /// Handle one line of input from the Idle state
    ///
    /// Returns `Exited` for an exit command, otherwise `Idle` once any model
    /// and tool rounds have finished.
    pub async fn handle_input(&mut self, input: &str) -> ReplState {
        let input = input.trim();
        if input.is_empty() {
            return ReplState::Idle;
        }

        match SlashCommand::parse(input) {
            Some(command) => self.handle_slash_command(command),
            None => self.process_user_input(input).await,
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "gptcode".bright_cyan().bold());
        println!("Working directory: {}", self.worktree.display());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/exit".yellow());
        println!();
    }

    fn handle_slash_command(&mut self, command: SlashCommand) -> ReplState {
        debug!(?command, "handle_slash_command: called");
        match command {
            SlashCommand::Help => self.print_help(),
            SlashCommand::Clear => {
                self.conversation.clear();
                println!("{}", "Conversation cleared.".dimmed());
            }
            SlashCommand::History => self.print_history(),
            SlashCommand::Exit => return ReplState::Exited,
            SlashCommand::Unknown(name) => {
                println!("{} Unknown command: {}", "?".yellow(), name);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        ReplState::Idle
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        for info in COMMANDS {
            let label = if info.aliases.is_empty() {
                info.name.to_string()
            } else {
                format!("{} ({})", info.name, info.aliases.join(", "))
            };
            println!("  {:22} {}", label.yellow(), info.description);
        }
        println!();
        println!("{}", "Available Tools:".bright_cyan());
        for def in self.tool_executor.definitions() {
            println!("  {:22} {}", def.name.yellow(), def.description);
        }
        println!();
    }

    fn print_history(&self) {
        if self.conversation.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, msg) in self.conversation.history().iter().enumerate() {
            let role = match msg.role {
                Role::System => "System".normal(),
                Role::User => "User".bright_green(),
                Role::Assistant => "Assistant".bright_blue(),
                Role::Tool => "Tool".bright_yellow(),
            };
            let preview = if msg.has_tool_calls() {
                let names: Vec<&str> = msg.tool_calls.iter().map(|tc| tc.name.as_str()).collect();
                format!("[calls {}]", names.join(", "))
            } else {
                let head: String = msg.content.chars().take(50).collect();
                if msg.content.chars().count() > 50 { format!("{}...", head) } else { head }
            };
            println!("  {}. {}: {}", i + 1, role, preview.replace('\n', " "));
        }
        println!();
    }

    /// Drive the model/tool cycle for one user message
    async fn process_user_input(&mut self, input: &str) -> ReplState {
        self.conversation.append(Message::user(input));

        let mut rounds = 0;
        let mut state = ReplState::AwaitingModelResponse;

        let done = loop {
            state = match state {
                ReplState::AwaitingModelResponse => match self.call_llm_streaming().await {
                    Ok(response) => self.record_response(response),
                    Err(e) => {
                        warn!(error = %e, "Model request failed");
                        println!("\n{} {}", "Error:".red(), e);
                        ReplState::Idle
                    }
                },
                ReplState::DispatchingTools(calls) => {
                    self.dispatch_tools(&calls).await;
                    rounds += 1;
                    if rounds >= self.max_tool_rounds {
                        info!(rounds, "Tool round limit reached");
                        println!(
                            "{}",
                            format!("[Stopped after {} tool rounds - send a message to continue]", rounds).yellow()
                        );
                        ReplState::Idle
                    } else {
                        ReplState::AwaitingModelResponse
                    }
                }
                finished @ (ReplState::Idle | ReplState::Exited) => break finished,
            };
        };

        println!();
        done
    }

    /// Append the assistant message and pick the next state
    fn record_response(&mut self, response: CompletionResponse) -> ReplState {
        debug!(stop_reason = ?response.stop_reason, tool_calls = %response.tool_calls.len(), usage = %response.usage.total(), "record_response: called");
        match response.stop_reason {
            StopReason::MaxTokens => println!("{}", "\n[Response truncated - max tokens reached]".yellow()),
            StopReason::ContentFilter => println!("{}", "\n[Response stopped by content filter]".yellow()),
            StopReason::EndTurn | StopReason::ToolUse => {}
        }

        let text = response.content.unwrap_or_default();
        if response.tool_calls.is_empty() {
            self.conversation.append(Message::assistant(text));
            ReplState::Idle
        } else {
            self.conversation
                .append(Message::assistant_with_tools(text, response.tool_calls.clone()));
            ReplState::DispatchingTools(response.tool_calls)
        }
    }

    /// Run each tool call in order and append its result
    async fn dispatch_tools(&mut self, calls: &[ToolCall]) {
        for tc in calls {
            println!();
            let target = ToolRequest::parse(tc).map(|r| r.summary()).unwrap_or_default();
            println!("{} {} {}", "Tool:".bright_yellow(), tc.name.bright_white(), target.dimmed());

            let result = self.tool_executor.execute(tc, &self.tool_context).await;

            if result.is_error {
                println!("{} {}", "Error:".red(), result.content);
            } else {
                println!("{}", preview(&result.content).dimmed());
            }

            self.conversation.append(Message::tool(&tc.id, result.content));
        }
    }

    /// Call the model with streaming output
    async fn call_llm_streaming(&self) -> Result<CompletionResponse, LlmError> {
        let request = CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            messages: self.conversation.history().to_vec(),
            tools: self.tool_executor.definitions(),
            max_tokens: self.max_tokens,
        };

        let (tx, mut rx) = mpsc::channel::<StreamChunk>(100);

        let print_handle = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                match chunk {
                    StreamChunk::TextDelta(text) => {
                        print!("{}", text);
                        let _ = io::stdout().flush();
                    }
                    StreamChunk::ToolUseStart { name, .. } => {
                        print!("\n{} ", format!("[calling {}]", name).dimmed());
                        let _ = io::stdout().flush();
                    }
                    StreamChunk::ToolUseDelta { .. } | StreamChunk::ToolUseEnd { .. } => {}
                    StreamChunk::MessageDone { .. } => {}
                    StreamChunk::Error(err) => {
                        eprintln!("\n{} {}", "Stream error:".red(), err);
                    }
                }
            }
        });

        let response = self.llm.stream(request, tx).await;

        let _ = print_handle.await;
        response
    }
}

fn preview(content: &str) -> String {
    let total = content.chars().count();
    if total > DISPLAY_LIMIT {
        let head: String = content.chars().take(DISPLAY_LIMIT).collect();
        format!("{}... ({} chars total)", head, total)
    } else {
        content.to_string()
    }
}

/// System prompt naming the working directory and its entries
pub fn build_system_prompt(worktree: &Path) -> String {
    let mut entries: Vec<String> = std::fs::read_dir(worktree)
        .map(|dir| {
            dir.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    entries.sort();

    format!(
        r#"You are a coding assistant working in the user's terminal.

You have access to the following tools:
- read: Read file contents with line numbers
- edit: Overwrite an existing file with new content
- replace: Replace every occurrence of a string in a file
- grep: Search file contents with a regex
- glob: Find files matching a pattern
- run_command: Execute a shell command

Guidelines:
- Use tools directly when needed - don't ask for permission
- Read a file before editing it
- Be concise in your responses

Current working directory: {}
Directory contents: {}"#,
        worktree.display(),
        entries.join(", ")
    )
}
