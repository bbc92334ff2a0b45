//! CLI integration tests for the Warden command-line interface.
//!
//! These run the real binary: argument parsing, config loading, and a short
//! soak run against an in-process cache.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

/// Get a command for the warden binary with no ambient config.
fn warden() -> Command {
    let mut cmd = Command::cargo_bin("warden").unwrap();
    cmd.env_remove("WARDEN_CONFIG");
    cmd
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    warden()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("soak"));
}

#[test]
fn test_version_displays() {
    warden()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("warden"));
}

#[test]
fn test_unknown_subcommand_rejected() {
    warden().arg("frobnicate").assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_defaults() {
    warden()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No config file loaded"))
        .stdout(predicate::str::contains("1000"))
        .stdout(predicate::str::contains("86400s"));
}

#[test]
fn test_config_show_reads_file() {
    let file = config_file("[cache]\nmax_size = 42\n");
    warden()
        .args(["--config"])
        .arg(file.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file:"))
        .stdout(predicate::str::contains("42"));
}

#[test]
fn test_config_from_env() {
    let file = config_file("[cache]\nmax_size = 77\n");
    warden()
        .env("WARDEN_CONFIG", file.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("77"));
}

#[test]
fn test_invalid_config_rejected() {
    let file = config_file("[cache]\nmax_size = 0\n");
    warden()
        .args(["--config"])
        .arg(file.path())
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_size"));
}

#[test]
fn test_missing_config_file_rejected() {
    warden()
        .args(["--config", "/nonexistent/warden.toml", "config", "show"])
        .assert()
        .failure();
}

#[test]
fn test_config_init_prints_sections() {
    warden()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[cache]"))
        .stdout(predicate::str::contains("[logging]"))
        .stdout(predicate::str::contains("max_size = 1000"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Soak Command Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_soak_short_run_passes() {
    warden()
        .args([
            "soak",
            "--writers",
            "2",
            "--readers",
            "2",
            "--duration-ms",
            "200",
            "--max-size",
            "50",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("violations:"))
        .stdout(predicate::str::contains("/50"));
}

#[test]
fn test_soak_uses_configured_cleanup_period() {
    let file = config_file("[cache]\ncleanup_period_secs = 2\n");
    warden()
        .args(["--config"])
        .arg(file.path())
        .args(["soak", "--writers", "1", "--readers", "1", "--duration-ms", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("every 2000ms"));
}

#[test]
fn test_soak_cleanup_period_override() {
    warden()
        .args([
            "soak",
            "--writers",
            "1",
            "--readers",
            "1",
            "--duration-ms",
            "100",
            "--cleanup-period-ms",
            "25",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("every 25ms"));
}

#[test]
fn test_soak_respects_disabled_cleanup() {
    let file = config_file("[cache]\nenable_cleanup_task = false\n");
    warden()
        .args(["--config"])
        .arg(file.path())
        .args(["soak", "--writers", "1", "--readers", "1", "--duration-ms", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));
}

#[test]
fn test_soak_rejects_bad_number() {
    warden()
        .args(["soak", "--writers", "many"])
        .assert()
        .failure();
}
