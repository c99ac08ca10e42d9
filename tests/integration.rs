//! Integration tests for webbot
//!
//! Note: Full integration tests require a Chromium install.
//! These tests focus on CLI parsing and pre-flight validation.

use std::process::Command;

fn run_webbot(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--quiet", "--"])
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("Failed to execute command")
}

/// Test that the binary can show help
#[test]
fn test_help_command() {
    let output = run_webbot(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("webbot") || stdout.contains("smoke"),
        "Help should mention webbot"
    );
}

/// Test that version command works
#[test]
fn test_version_command() {
    let output = run_webbot(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0."), "Version should be shown");
}

/// A URL without an http(s) scheme is rejected before any run starts
#[test]
fn test_rejects_url_without_scheme() {
    let output = run_webbot(&["example.com"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("http://"), "Error should mention the required scheme");
}

/// Bot counts outside 1..=10 are rejected
#[test]
fn test_rejects_bot_count_out_of_range() {
    let output = run_webbot(&["https://example.com", "--bots=0"]);
    assert_eq!(output.status.code(), Some(1));

    let output = run_webbot(&["https://example.com", "--bots=11"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("between 1 and 10"));
}

/// A missing actions file is a fatal error
#[test]
fn test_missing_actions_file_is_fatal() {
    let output = run_webbot(&[
        "https://example.com",
        "--actions",
        "/nonexistent/actions.json",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Fatal error"));
}
