//! Slash commands handled locally by the REPL

/// A registered slash command, for help output
#[derive(Debug, Clone, Copy)]
pub struct CommandInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
}

/// Every slash command the REPL understands
pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "/help",
        aliases: &["/h"],
        description: "Show available commands and tools",
    },
    CommandInfo {
        name: "/clear",
        aliases: &["/c"],
        description: "Clear the conversation history",
    },
    CommandInfo {
        name: "/history",
        aliases: &[],
        description: "Show the conversation history",
    },
    CommandInfo {
        name: "/exit",
        aliases: &["/quit", "/q"],
        description: "Exit the assistant",
    },
];

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Clear,
    History,
    Exit,
    Unknown(String),
}

impl SlashCommand {
    /// Parse a line of input; `None` when it is not a slash command
    ///
    /// Only the first word is significant, trailing arguments are ignored.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if !input.starts_with('/') {
            return None;
        }
        let word = input.split_whitespace().next().unwrap_or(input);

        let command = match word {
            "/help" | "/h" => Self::Help,
            "/clear" | "/c" => Self::Clear,
            "/history" => Self::History,
            "/exit" | "/quit" | "/q" => Self::Exit,
            other => Self::Unknown(other.to_string()),
        };
        Some(command)
    }
}
