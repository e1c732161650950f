//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

/// gptcode - terminal coding assistant
#[derive(Debug, Parser)]
#[command(
    name = "gc",
    about = "Terminal coding assistant with file, search and shell tools",
    version = env!("CARGO_PKG_VERSION"),
    after_help = "Logs are written to: ~/.local/share/gptcode/logs/gptcode.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)")]
    pub log_level: Option<String>,

    /// Prompt to send before the first interactive read
    #[arg(trailing_var_arg = true, value_name = "PROMPT")]
    pub prompt: Vec<String>,
}

impl Cli {
    /// The trailing words joined into one prompt, if any were given
    pub fn initial_prompt(&self) -> Option<String> {
        let prompt = self.prompt.join(" ");
        let prompt = prompt.trim();
        if prompt.is_empty() { None } else { Some(prompt.to_string()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["gc"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.log_level.is_none());
        assert_eq!(cli.initial_prompt(), None);
    }

    #[test]
    fn test_parse_options_and_prompt() {
        let cli = Cli::try_parse_from(["gc", "-c", "custom.yml", "--log-level", "debug", "fix", "the", "tests"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.yml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.initial_prompt(), Some("fix the tests".to_string()));
    }

    #[test]
    fn test_blank_prompt_is_none() {
        let cli = Cli::try_parse_from(["gc", "  "]).unwrap();
        assert_eq!(cli.initial_prompt(), None);
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
