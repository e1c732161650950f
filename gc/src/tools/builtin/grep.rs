//! grep tool - search file contents using the ripgrep libraries

use std::path::{Path, PathBuf};

use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use grep_searcher::sinks::Lossy;
use grep_searcher::{BinaryDetection, Searcher, SearcherBuilder};
use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::llm::ToolDefinition;
use crate::tools::{ToolContext, ToolError};

const DEFAULT_MAX_RESULTS: usize = 100;

/// Arguments for the `grep` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GrepArgs {
    pub pattern: String,
    /// File or directory to search (default: working directory)
    #[serde(default)]
    pub path: Option<String>,
    /// Glob applied to file names, e.g. `*.rs`
    #[serde(default)]
    pub file_pattern: Option<String>,
    #[serde(default)]
    pub case_insensitive: bool,
    /// Treat `pattern` as a plain string instead of a regex
    #[serde(default)]
    pub literal: bool,
    #[serde(default)]
    pub max_results: Option<usize>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(
        "grep",
        "Search file contents for a regex (or literal string). Returns path:line:text for each matching line.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to search for"
                },
                "path": {
                    "type": "string",
                    "description": "File or directory to search in (default: '.')"
                },
                "file_pattern": {
                    "type": "string",
                    "description": "Glob pattern to filter file names (e.g., '*.rs', '*.py')"
                },
                "case_insensitive": {
                    "type": "boolean",
                    "description": "Case-insensitive search (default: false)"
                },
                "literal": {
                    "type": "boolean",
                    "description": "Match the pattern as a plain string (default: false)"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of matching lines to return (default: 100)"
                }
            },
            "required": ["pattern"]
        }),
    )
}

/// One matching line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepMatch {
    pub path: PathBuf,
    /// 1-based line number
    pub line_number: u64,
    pub line: String,
}

/// Search options beyond the pattern itself
#[derive(Debug, Clone, Default)]
pub struct GrepOptions {
    pub case_insensitive: bool,
    pub literal: bool,
    pub file_pattern: Option<glob::Pattern>,
}

/// Lazy iterator over the matches under a root
///
/// Files are visited in sorted walk order and searched one at a time as the
/// iterator is advanced.
pub struct GrepMatches {
    files: Box<dyn Iterator<Item = PathBuf> + Send>,
    matcher: RegexMatcher,
    searcher: Searcher,
    pending: std::vec::IntoIter<GrepMatch>,
}

impl GrepMatches {
    fn search_file(&mut self, path: &Path) -> Vec<GrepMatch> {
        let mut hits = Vec::new();
        let result = self.searcher.search_path(
            &self.matcher,
            path,
            Lossy(|line_number, line| {
                hits.push(GrepMatch {
                    path: path.to_path_buf(),
                    line_number,
                    line: line.trim_end_matches(['\r', '\n']).to_string(),
                });
                Ok(true)
            }),
        );

        // Lines matched before a read error are still reported
        if let Err(e) = result {
            debug!(?path, %e, hits = %hits.len(), "GrepMatches::search_file: search stopped early");
        }
        hits
    }
}

impl Iterator for GrepMatches {
    type Item = GrepMatch;

    fn next(&mut self) -> Option<GrepMatch> {
        loop {
            if let Some(hit) = self.pending.next() {
                return Some(hit);
            }
            let file = self.files.next()?;
            self.pending = self.search_file(&file).into_iter();
        }
    }
}

/// Search every file under `root` for lines matching `pattern`
pub fn grep(pattern: &str, root: &Path) -> Result<GrepMatches, ToolError> {
    grep_with(pattern, root, GrepOptions::default())
}

/// Search with explicit options
pub fn grep_with(pattern: &str, root: &Path, options: GrepOptions) -> Result<GrepMatches, ToolError> {
    debug!(%pattern, ?root, ?options, "grep_with: called");
    if !root.exists() {
        return Err(ToolError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let expr = if options.literal {
        regex::escape(pattern)
    } else {
        pattern.to_string()
    };
    let matcher = RegexMatcherBuilder::new()
        .case_insensitive(options.case_insensitive)
        .build(&expr)
        .map_err(|e| ToolError::InvalidArgument(format!("Invalid regex pattern: {}", e)))?;

    let searcher = SearcherBuilder::new()
        .binary_detection(BinaryDetection::quit(b'\x00'))
        .line_number(true)
        .build();

    let files: Box<dyn Iterator<Item = PathBuf> + Send> = if root.is_file() {
        Box::new(std::iter::once(root.to_path_buf()))
    } else {
        let file_pattern = options.file_pattern;
        Box::new(
            WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(move |e| match &file_pattern {
                    Some(glob) => e.file_name().to_str().is_some_and(|name| glob.matches(name)),
                    None => true,
                })
                .map(|e| e.into_path()),
        )
    };

    Ok(GrepMatches {
        files,
        matcher,
        searcher,
        pending: Vec::new().into_iter(),
    })
}

/// Execute the `grep` tool
pub fn run(args: &GrepArgs, ctx: &ToolContext) -> Result<String, ToolError> {
    debug!(?args, "grep::run: called");
    let root = ctx.validate_path(Path::new(args.path.as_deref().unwrap_or(".")))?;

    let file_pattern = args
        .file_pattern
        .as_deref()
        .map(glob::Pattern::new)
        .transpose()
        .map_err(|e| ToolError::InvalidArgument(format!("Invalid file pattern: {}", e)))?;

    let options = GrepOptions {
        case_insensitive: args.case_insensitive,
        literal: args.literal,
        file_pattern,
    };
    let max_results = args.max_results.unwrap_or(DEFAULT_MAX_RESULTS);

    // One extra to know whether the output was cut short
    let hits: Vec<GrepMatch> = grep_with(&args.pattern, &root, options)?.take(max_results + 1).collect();
    debug!(hit_count = %hits.len(), "grep::run: search complete");

    if hits.is_empty() {
        return Ok("No matches found.".to_string());
    }

    let truncated = hits.len() > max_results;
    let mut lines: Vec<String> = hits
        .iter()
        .take(max_results)
        .map(|m| format!("{}:{}:{}", ctx.display_path(&m.path), m.line_number, m.line))
        .collect();

    if truncated {
        lines.push(format!("... (truncated at {} matches)", max_results));
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args(pattern: &str) -> GrepArgs {
        GrepArgs {
            pattern: pattern.to_string(),
            path: None,
            file_pattern: None,
            case_insensitive: false,
            literal: false,
            max_results: None,
        }
    }

    #[test]
    fn test_grep_line_numbers_are_one_based() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "foo\nbar\nxfoox\nbaz\n").unwrap();

        let hits: Vec<GrepMatch> = grep("foo", temp.path()).unwrap().collect();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].line_number, 1);
        assert_eq!(hits[0].line, "foo");
        assert_eq!(hits[1].line_number, 3);
        assert_eq!(hits[1].line, "xfoox");
    }

    #[test]
    fn test_grep_recurses_into_subdirectories() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src").join("lib.rs"), "fn foo() {}\n").unwrap();
        fs::write(temp.path().join("top.txt"), "no match here\n").unwrap();

        let hits: Vec<GrepMatch> = grep("foo", temp.path()).unwrap().collect();

        assert_eq!(hits.len(), 1);
        assert!(hits[0].path.ends_with("src/lib.rs"));
    }

    #[test]
    fn test_grep_literal_mode_escapes_regex() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "a.b\naxb\n").unwrap();

        let options = GrepOptions {
            literal: true,
            ..Default::default()
        };
        let hits: Vec<GrepMatch> = grep_with("a.b", temp.path(), options).unwrap().collect();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, "a.b");
    }

    #[test]
    fn test_grep_reports_non_utf8_lines() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("latin1.txt"), b"foo\ncaf\xe9 foo\nfoo again\n").unwrap();

        let hits: Vec<GrepMatch> = grep("foo", temp.path()).unwrap().collect();

        let lines: Vec<u64> = hits.iter().map(|m| m.line_number).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert_eq!(hits[1].line, "caf\u{fffd} foo");
    }

    #[test]
    fn test_grep_skips_binary_files() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("blob.bin"), b"\x00\nfoo\n").unwrap();
        fs::write(temp.path().join("text.txt"), "foo\n").unwrap();

        let hits: Vec<GrepMatch> = grep("foo", temp.path()).unwrap().collect();

        assert!(hits.iter().all(|m| m.path.ends_with("text.txt")));
    }

    #[test]
    fn test_grep_missing_root_is_not_found() {
        let temp = tempdir().unwrap();
        let result = grep("foo", &temp.path().join("nope"));
        assert!(matches!(result, Err(ToolError::NotFound { .. })));
    }

    #[test]
    fn test_grep_invalid_regex() {
        let temp = tempdir().unwrap();
        let result = grep("[invalid", temp.path());
        assert!(matches!(result, Err(ToolError::InvalidArgument(ref m)) if m.contains("Invalid regex")));
    }

    #[test]
    fn test_run_formats_and_filters() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());
        fs::write(temp.path().join("test.rs"), "fn main() { hello }").unwrap();
        fs::write(temp.path().join("test.txt"), "hello world").unwrap();

        let output = run(
            &GrepArgs {
                file_pattern: Some("*.rs".to_string()),
                ..args("hello")
            },
            &ctx,
        )
        .unwrap();

        assert_eq!(output, "test.rs:1:fn main() { hello }");
    }

    #[test]
    fn test_run_case_insensitive() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());
        fs::write(temp.path().join("test.txt"), "Hello World\nHELLO AGAIN").unwrap();

        let output = run(
            &GrepArgs {
                case_insensitive: true,
                ..args("hello")
            },
            &ctx,
        )
        .unwrap();

        assert!(output.contains("Hello"));
        assert!(output.contains("HELLO"));
    }

    #[test]
    fn test_run_no_matches() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());
        fs::write(temp.path().join("test.txt"), "foo bar baz").unwrap();

        assert_eq!(run(&args("notfound"), &ctx).unwrap(), "No matches found.");
    }

    #[test]
    fn test_run_truncates() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf());
        fs::write(temp.path().join("test.txt"), "x\nx\nx\nx\n").unwrap();

        let output = run(
            &GrepArgs {
                max_results: Some(2),
                ..args("x")
            },
            &ctx,
        )
        .unwrap();

        assert_eq!(output.lines().count(), 3);
        assert!(output.contains("truncated at 2 matches"));
    }
}
