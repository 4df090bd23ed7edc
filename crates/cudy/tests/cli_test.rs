//! Integration tests for the `cudy` CLI binary.
//!
//! These tests cover argument parsing, help output, shell completions,
//! config management, and error handling without a live router.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `cudy` binary with env isolation.
///
/// Clears all `CUDY_*` env vars and points the config file at `config`
/// so tests never touch the user's real configuration.
fn cudy_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("cudy");
    cmd.env("HOME", "/tmp/cudy-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/cudy-cli-test-nonexistent")
        .env("CUDY_CONFIG", config)
        .env_remove("CUDY_PROFILE")
        .env_remove("CUDY_HOST")
        .env_remove("CUDY_USERNAME")
        .env_remove("CUDY_PASSWORD")
        .env_remove("CUDY_OUTPUT")
        .env_remove("CUDY_INSECURE")
        .env_remove("CUDY_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn isolated() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, config) = isolated();
    let output = cudy_cmd(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_dir, config) = isolated();
    cudy_cmd(&config).arg("--help").assert().success().stdout(
        predicate::str::contains("Cudy routers")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("mesh"))
            .and(predicate::str::contains("restart-5g")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, config) = isolated();
    cudy_cmd(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cudy"));
}

#[test]
fn test_invalid_subcommand() {
    let (_dir, config) = isolated();
    let output = cudy_cmd(&config).arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("frobnicate"));
}

#[test]
fn test_invalid_output_format() {
    let (_dir, config) = isolated();
    let output = cudy_cmd(&config)
        .args(["--output", "xml", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("xml"));
}

// ── Subcommand help ─────────────────────────────────────────────────

#[test]
fn test_mesh_help_lists_actions() {
    let (_dir, config) = isolated();
    cudy_cmd(&config).args(["mesh", "--help"]).assert().success().stdout(
        predicate::str::contains("list")
            .and(predicate::str::contains("reboot"))
            .and(predicate::str::contains("led")),
    );
}

#[test]
fn test_config_help_lists_actions() {
    let (_dir, config) = isolated();
    cudy_cmd(&config)
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("set-password"))
                .and(predicate::str::contains("profiles")),
        );
}

#[test]
fn test_sms_requires_message() {
    let (_dir, config) = isolated();
    let output = cudy_cmd(&config)
        .args(["sms", "+15550100"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let (_dir, config) = isolated();
    cudy_cmd(&config)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let (_dir, config) = isolated();
    cudy_cmd(&config)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config management ───────────────────────────────────────────────

#[test]
fn test_config_show_without_file() {
    let (_dir, config) = isolated();
    cudy_cmd(&config)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"default_profile\""));
}

#[test]
fn test_config_set_then_show() {
    let (_dir, config) = isolated();
    cudy_cmd(&config)
        .args(["config", "set", "host", "192.168.20.1"])
        .assert()
        .success();
    cudy_cmd(&config)
        .args(["config", "set", "modules", "lan,wan"])
        .assert()
        .success();

    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("192.168.20.1"), "config file:\n{written}");

    cudy_cmd(&config)
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("192.168.20.1").and(predicate::str::contains("wan")));

    cudy_cmd(&config)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_set_unknown_key() {
    let (_dir, config) = isolated();
    let output = cudy_cmd(&config)
        .args(["config", "set", "colour", "red"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("colour"));
}

#[test]
fn test_config_use_unknown_profile() {
    let (_dir, config) = isolated();
    let output = cudy_cmd(&config)
        .args(["config", "use", "attic"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("attic"));
}

// ── Router-bound commands without a router ──────────────────────────

#[test]
fn test_status_without_config() {
    let (_dir, config) = isolated();
    let output = cudy_cmd(&config).arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output).to_lowercase();
    assert!(text.contains("config"), "Expected config hint:\n{text}");
}

#[test]
fn test_unknown_profile_flag() {
    let (_dir, config) = isolated();
    let output = cudy_cmd(&config)
        .args(["--profile", "attic", "sensors"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_unreachable_router() {
    let (_dir, config) = isolated();
    let output = cudy_cmd(&config)
        .env("CUDY_PASSWORD", "secret")
        .args(["--host", "http://127.0.0.1:1", "--timeout", "2", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}
