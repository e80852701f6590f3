use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn docqa(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docqa"))
        .args(args)
        .current_dir(dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run docqa")
}

#[test]
fn test_init_command() {
    let temp_dir = TempDir::new().unwrap();

    let output = docqa(temp_dir.path(), &["init"]);
    assert!(output.status.success());

    let config_path = temp_dir.path().join(".docqa/settings.toml");
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("version = 1"));
    assert!(content.contains("[retrieval]"));
    assert!(content.contains("[chunking]"));

    // Second init without --force fails
    let output = docqa(temp_dir.path(), &["init"]);
    assert_eq!(output.status.code(), Some(1));

    let output = docqa(temp_dir.path(), &["init", "--force"]);
    assert!(output.status.success());
}

#[test]
fn test_config_command_masks_key() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.toml");
    std::fs::write(
        &config_path,
        "[openai]\napi_key = \"sk-very-secret-abcd\"\n\n[llm]\nmodel = \"gpt-4o\"\n",
    )
    .unwrap();

    let output = docqa(temp_dir.path(), &["--config", "custom.toml", "config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("model = \"gpt-4o\""));
    assert!(stdout.contains("****abcd"));
    assert!(!stdout.contains("very-secret"));
}

#[test]
fn test_collections_on_empty_store() {
    let temp_dir = TempDir::new().unwrap();

    let output = docqa(temp_dir.path(), &["collections", "--json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, serde_json::json!({}));

    let output = docqa(temp_dir.path(), &["collections"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No collections"));
}

#[test]
fn test_failures_exit_with_one() {
    let temp_dir = TempDir::new().unwrap();

    let output = docqa(temp_dir.path(), &["delete", "ghost"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ghost"));

    let output = docqa(temp_dir.path(), &["stats", "ghost"]);
    assert_eq!(output.status.code(), Some(1));

    // No API key available
    std::fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();
    let output = docqa(temp_dir.path(), &["ingest", "notes", "notes.txt", "--no-progress"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_API_KEY"));
}
