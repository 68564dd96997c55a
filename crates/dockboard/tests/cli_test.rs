//! Integration tests for the `dockboard` CLI binary.
//!
//! Argument parsing, help output, shell completions, config handling and
//! error exit codes, all without a live Home Assistant host.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `dockboard` binary with env isolation.
///
/// Clears the `DOCKBOARD_*` variables and points config directories at a
/// nonexistent path so tests never read the user's configuration.
fn dockboard_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("dockboard");
    cmd.env("HOME", "/tmp/dockboard-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/dockboard-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("DOCKBOARD_PROFILE")
        .env_remove("DOCKBOARD_CONFIG")
        .env_remove("DOCKBOARD_URL")
        .env_remove("DOCKBOARD_TOKEN")
        .env_remove("DOCKBOARD_OUTPUT")
        .env_remove("DOCKBOARD_INSECURE")
        .env_remove("DOCKBOARD_TIMEOUT");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Config file with a single `home` profile.
fn config_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"default_profile = "home"

[defaults]
output = "table"

[profiles.home]
url = "http://ha.example.test:8123"
token = "plaintext-token"
"#
    )
    .unwrap();
    file
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = dockboard_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    dockboard_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Home Assistant")
            .and(predicate::str::contains("containers"))
            .and(predicate::str::contains("images"))
            .and(predicate::str::contains("volumes")),
    );
}

#[test]
fn test_version_flag() {
    dockboard_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dockboard"));
}

#[test]
fn test_invalid_subcommand() {
    dockboard_cmd()
        .arg("nonexistent")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_containers_help_lists_actions() {
    dockboard_cmd().args(["containers", "--help"]).assert().success().stdout(
        predicate::str::contains("start")
            .and(predicate::str::contains("restart"))
            .and(predicate::str::contains("logs"))
            .and(predicate::str::contains("create")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    dockboard_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    dockboard_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    dockboard_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dockboard"));
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_no_config_is_a_config_error() {
    let output = dockboard_cmd().args(["containers", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(7), "Expected config exit code");
    let text = combined_output(&output);
    assert!(text.contains("No host configured"), "Unexpected output:\n{text}");
}

#[test]
fn test_unknown_profile() {
    let file = config_file();
    let output = dockboard_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["--profile", "missing", "view"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    let text = combined_output(&output);
    assert!(text.contains("missing"), "Unexpected output:\n{text}");
}

#[test]
fn test_config_show_hides_token() {
    let file = config_file();
    dockboard_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("http://ha.example.test:8123")
                .and(predicate::str::contains("* home"))
                .and(predicate::str::contains("plaintext-token").not()),
        );
}

#[test]
fn test_config_show_json() {
    let file = config_file();
    let output = dockboard_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["--output", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["active_profile"], "home");
    assert_eq!(value["profiles"][0]["url"], "http://ha.example.test:8123");
}

// ── Host errors ─────────────────────────────────────────────────────

#[test]
fn test_non_http_url_is_rejected() {
    dockboard_cmd()
        .args(["--url", "ftp://ha.example.test", "--token", "t", "view"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_unreachable_host_is_a_connection_error() {
    let output = dockboard_cmd()
        .args(["--url", "http://127.0.0.1:1", "--token", "t", "--timeout", "5", "view"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5), "{}", combined_output(&output));
}

#[test]
fn test_invalid_output_format() {
    dockboard_cmd()
        .args(["--output", "csv", "view"])
        .assert()
        .failure()
        .code(2);
}
