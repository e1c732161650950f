//! Integration tests for gptcode
//!
//! These tests drive the public tool API and the `gc` binary end to end.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use gptcode::tools::builtin::{self, GrepOptions};
use gptcode::{ToolCall, ToolContext, ToolError, ToolExecutor};

// =============================================================================
// File Tool Tests
// =============================================================================

#[tokio::test]
async fn test_read_and_edit_missing_file_fail_with_not_found() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    for name in ["missing.txt", "nested/missing.rs", ".hidden"] {
        let path = temp_dir.path().join(name);

        let err = builtin::read(&path).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }), "read {name}: {err:?}");

        let err = builtin::edit(&path, "content").await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }), "edit {name}: {err:?}");
        assert!(!path.exists(), "edit must not create {name}");
    }
}

#[tokio::test]
async fn test_edit_then_read_returns_new_content() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("main.rs");
    fs::write(&path, "fn main() {}\n").unwrap();

    let written = builtin::edit(&path, "fn main() { println!(\"hi\"); }\n").await.unwrap();
    assert_eq!(written, 30);
    assert_eq!(builtin::read(&path).await.unwrap(), "fn main() { println!(\"hi\"); }\n");
}

#[tokio::test]
async fn test_replace_without_match_leaves_file_unchanged() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.toml");
    let original = b"name = \"demo\"\r\nversion = 1\n\xe2\x9c\x93\n";
    fs::write(&path, original).unwrap();

    let count = builtin::replace(&path, "missing", "present").await.unwrap();

    assert_eq!(count, 0);
    assert_eq!(fs::read(&path).unwrap(), original);
}

#[tokio::test]
async fn test_replace_counts_every_occurrence() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("lib.rs");
    fs::write(&path, "foo bar foo\nfoo\n").unwrap();

    let count = builtin::replace(&path, "foo", "baz").await.unwrap();

    assert_eq!(count, 3);
    assert_eq!(fs::read_to_string(&path).unwrap(), "baz bar baz\nbaz\n");
}

// =============================================================================
// Search Tool Tests
// =============================================================================

#[test]
fn test_glob_matches_direct_children_only() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    fs::write(root.join("a.py"), "").unwrap();
    fs::write(root.join("b.py"), "").unwrap();
    fs::write(root.join("c.rs"), "").unwrap();
    fs::create_dir(root.join("pkg")).unwrap();
    fs::write(root.join("pkg").join("d.py"), "").unwrap();
    fs::create_dir(root.join("dir.py")).unwrap();

    let mut first: Vec<PathBuf> = builtin::glob("*.py", root).unwrap().collect();
    let mut second: Vec<PathBuf> = builtin::glob("*.py", root).unwrap().collect();
    first.sort();
    second.sort();

    assert_eq!(first, vec![root.join("a.py"), root.join("b.py")]);
    assert_eq!(first, second);
}

#[test]
fn test_grep_reports_one_based_line_numbers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    fs::write(root.join("one.txt"), "foo\nbar\nfoo again\n").unwrap();
    fs::create_dir(root.join("sub")).unwrap();
    fs::write(root.join("sub").join("two.txt"), "nothing\nnothing\nfood\n").unwrap();

    let mut found: Vec<(PathBuf, u64)> = builtin::grep("foo", root)
        .unwrap()
        .map(|m| (m.path, m.line_number))
        .collect();
    found.sort();

    assert_eq!(
        found,
        vec![
            (root.join("one.txt"), 1),
            (root.join("one.txt"), 3),
            (root.join("sub").join("two.txt"), 3),
        ]
    );
}

#[test]
fn test_grep_literal_and_case_insensitive() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    fs::write(root.join("calc.txt"), "a+b\nA+B\naab\n").unwrap();

    let options = GrepOptions {
        case_insensitive: true,
        literal: true,
        file_pattern: None,
    };
    let lines: Vec<u64> = builtin::grep_with("a+b", root, options)
        .unwrap()
        .map(|m| m.line_number)
        .collect();

    assert_eq!(lines, vec![1, 2]);
}

// =============================================================================
// Dispatcher Tests
// =============================================================================

#[tokio::test]
async fn test_executor_renders_errors_as_results() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let ctx = ToolContext::new(temp_dir.path().to_path_buf());
    let executor = ToolExecutor::new();

    let unknown = executor
        .execute(&ToolCall::new("call_1", "format_disk", json!({})), &ctx)
        .await;
    assert!(unknown.is_error);
    assert!(unknown.content.contains("Unknown tool"));

    let invalid = executor
        .execute(&ToolCall::new("call_2", "replace", json!({"path": "x"})), &ctx)
        .await;
    assert!(invalid.is_error);
    assert!(invalid.content.contains("Invalid argument"));
}

// =============================================================================
// Binary Tests
// =============================================================================

fn gc(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gc").expect("binary should build");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("XDG_DATA_HOME", home.path().join(".local/share"));
    cmd
}

#[test]
fn test_binary_fails_fast_without_api_key() {
    let home = TempDir::new().expect("Failed to create temp dir");

    gc(&home)
        .env_remove("OPENAI_API_KEY")
        .write_stdin("/exit\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_binary_exits_cleanly_on_exit_command() {
    let home = TempDir::new().expect("Failed to create temp dir");

    gc(&home)
        .env("OPENAI_API_KEY", "sk-test")
        .write_stdin("/help\n/exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Available Commands"))
        .stdout(predicate::str::contains("Goodbye!"));
}

#[test]
fn test_binary_exits_on_end_of_input() {
    let home = TempDir::new().expect("Failed to create temp dir");

    gc(&home)
        .env("OPENAI_API_KEY", "sk-test")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Goodbye!"));
}

#[test]
fn test_binary_reads_key_from_dotenv() {
    let home = TempDir::new().expect("Failed to create temp dir");
    fs::write(home.path().join(".env"), "OPENAI_API_KEY=sk-from-dotenv\n").unwrap();

    gc(&home)
        .env_remove("OPENAI_API_KEY")
        .write_stdin("/exit\n")
        .assert()
        .success();
}
