//! Built-in tools
//!
//! Each tool module exposes its typed arguments, its schema `definition()`
//! for the model, the plain filesystem operation, and a `run` wrapper that
//! resolves paths through the `ToolContext` and renders text output.

pub mod edit_file;
pub mod glob;
pub mod grep;
pub mod read_file;
pub mod replace;
pub mod run_command;

pub use self::edit_file::{EditArgs, edit};
pub use self::glob::{GlobArgs, glob};
pub use self::grep::{GrepArgs, GrepMatch, GrepMatches, GrepOptions, grep, grep_with};
pub use self::read_file::{ReadArgs, read};
pub use self::replace::{ReplaceArgs, replace};
pub use self::run_command::RunCommandArgs;
