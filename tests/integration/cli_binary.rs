//! End-to-end tests driving the lakelog binary.

use lakelog::Lake;
use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn command(workspace: &Path, args: &[&str]) -> Command {
    let bin = env!("CARGO_BIN_EXE_lakelog");
    let mut command = Command::new(bin);
    command
        .env("XDG_CONFIG_HOME", workspace.join("xdg_config"))
        .env("XDG_DATA_HOME", workspace.join("xdg_data"))
        .env_remove("LAKELOG_LOG")
        .env_remove("LAKELOG_LAKE")
        .env_remove("LAKELOG_TOKEN")
        .arg("--workspace")
        .arg(workspace)
        .arg("--lake")
        .arg(workspace.join("lake"))
        .args(args);
    command
}

fn lakelog(workspace: &Path, args: &[&str]) -> Output {
    command(workspace, args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn ok(workspace: &Path, args: &[&str]) -> String {
    let output = lakelog(workspace, args);
    assert!(
        output.status.success(),
        "lakelog {:?} failed: stderr={}",
        args,
        stderr(&output)
    );
    stdout(&output)
}

#[test]
fn test_use_with_head_unset() {
    let temp_dir = TempDir::new().unwrap();
    let output = lakelog(temp_dir.path(), &["use"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("default pool and branch unset"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_use_too_many_arguments() {
    let temp_dir = TempDir::new().unwrap();
    let output = lakelog(temp_dir.path(), &["use", "a", "b"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("too many arguments"));
    // The lake was never created or opened.
    assert!(!temp_dir.path().join("lake").exists());
}

#[test]
fn test_use_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let ws = temp_dir.path();
    ok(ws, &["init"]);
    ok(ws, &["create", "logs"]);

    let out = ok(ws, &["use", "logs"]);
    assert_eq!(out, "Switched to branch \"main\" on pool \"logs\"\n");

    let out = ok(ws, &["use"]);
    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("HEAD at logs@main"));
    assert_eq!(
        lines.next().map(str::to_string),
        Some(format!("Lake at {}", ws.join("lake").display()))
    );

    let head = fs::read_to_string(ws.join(".lakelog_head")).unwrap();
    assert!(head.contains("pool = \"logs\""));
    assert!(head.contains("branch = \"main\""));
}

#[test]
fn test_quiet_use_prints_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let ws = temp_dir.path();
    ok(ws, &["init"]);
    ok(ws, &["create", "logs"]);
    assert_eq!(ok(ws, &["-q", "use", "logs"]), "");
    assert!(ok(ws, &["use"]).starts_with("HEAD at logs@main"));
}

#[test]
fn test_use_unknown_branch_keeps_head() {
    let temp_dir = TempDir::new().unwrap();
    let ws = temp_dir.path();
    ok(ws, &["init"]);
    ok(ws, &["create", "logs"]);
    ok(ws, &["use", "logs"]);
    let before = fs::read_to_string(ws.join(".lakelog_head")).unwrap();

    let output = lakelog(ws, &["use", "@nope"]);
    assert!(!output.status.success());
    assert_eq!(fs::read_to_string(ws.join(".lakelog_head")).unwrap(), before);
}

#[test]
fn test_commit_and_log_json() {
    let temp_dir = TempDir::new().unwrap();
    let ws = temp_dir.path();
    ok(ws, &["init"]);
    ok(ws, &["create", "logs"]);
    ok(ws, &["use", "logs"]);
    ok(ws, &["commit", "-m", "load", "--user", "alice", "--add", "10:2", "--meta", "k=v"]);

    let out = ok(ws, &["log", "--format", "json"]);
    let records: Vec<serde_json::Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["message"], "load");
    assert_eq!(records[0]["author"], "alice");
    assert_eq!(records[0]["actions"][1]["type"], "meta");
    assert_eq!(records[1]["message"], "initialized pool");
}

#[test]
fn test_log_without_lake() {
    let temp_dir = TempDir::new().unwrap();
    let output = lakelog(temp_dir.path(), &["--use", "logs", "log"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no lake"));
}

#[test]
fn test_verbose_logs_to_stderr_only() {
    let temp_dir = TempDir::new().unwrap();
    let ws = temp_dir.path();
    let output = lakelog(ws, &["--verbose", "init"]);
    assert!(output.status.success());
    assert!(!stderr(&output).trim().is_empty(), "verbose mode should emit logs to stderr");
    assert!(stdout(&output).starts_with("Lake at "));
}

#[test]
fn test_lake_held_by_another_process() {
    let temp_dir = TempDir::new().unwrap();
    let ws = temp_dir.path();
    let held = Lake::init(&ws.join("lake")).unwrap();
    held.create_pool("logs").unwrap();

    let output = lakelog(ws, &["--timeout", "1", "--use", "logs", "log"]);
    assert_eq!(output.status.code(), Some(75));
    assert!(stderr(&output).contains("in use by another process"));

    drop(held);
    let out = ok(ws, &["--use", "logs", "log", "--format", "json"]);
    assert_eq!(out.lines().count(), 1);
}

#[cfg(target_os = "linux")]
#[test]
fn test_unwritable_stdout_fails() {
    let temp_dir = TempDir::new().unwrap();
    let full = fs::OpenOptions::new().write(true).open("/dev/full").unwrap();
    let output = command(temp_dir.path(), &["init"])
        .stdout(Stdio::from(full))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(!stderr(&output).is_empty());
}
