//! Integration tests for the `firetap` CLI binary.
//!
//! These tests validate argument parsing, payload normalization, replay,
//! history management and error handling against temporary directories.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `firetap` binary with env isolation.
///
/// Clears all `FIRETAP_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn firetap_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("firetap");
    cmd.env("HOME", "/tmp/firetap-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/firetap-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/firetap-cli-test-nonexistent")
        .env("FIRETAP_CONFIG", "/tmp/firetap-cli-test-nonexistent/config.toml")
        .env("NO_COLOR", "1")
        .env_remove("FIRETAP_OUTPUT")
        .env_remove("FIRETAP_STORAGE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_json(dir: &Path, name: &str, value: &Value) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
    path
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = firetap_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    firetap_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("normalize")
            .and(predicate::str::contains("replay"))
            .and(predicate::str::contains("history")),
    );
}

#[test]
fn test_version_flag() {
    firetap_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("firetap"));
}

#[test]
fn test_completions_bash() {
    firetap_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Normalize ───────────────────────────────────────────────────────

#[test]
fn test_normalize_legacy_payload() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "payload.json",
        &json!({
            "mq2": { "analog": 310, "status": "Smoke Detected", "timestamp": 1_700_000_000_000_i64 },
            "dht": { "temperature": 24.5, "humidity": 51 },
            "status": { "state": "idle" }
        }),
    );

    let output = firetap_cmd()
        .args(["normalize", "-o", "json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let reading = stdout_json(&output);
    assert_eq!(reading["status"], "Smoke Detected");
    assert_eq!(reading["smokeDetected"], true);
    assert_eq!(reading["temperature"], 24.5);
    assert_eq!(reading["timestamp"], "2023-11-14T22:13:20Z");
}

#[test]
fn test_normalize_with_archive_key() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(
        dir.path(),
        "entry.json",
        &json!({ "smokeLevel": 12, "status": { "state": "alert" }, "lastSeen": 1_700_000_000_000_i64 }),
    );

    let output = firetap_cmd()
        .args(["normalize", "--archive-key=-Nabc", "--output", "json-compact"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let reading = stdout_json(&output);
    assert_eq!(reading["id"], "-Nabc");
    assert_eq!(reading["status"], "Alert");
    assert_eq!(reading["buttonEvent"], "ALERT");
    assert_eq!(reading["message"], "alert triggered");
}

#[test]
fn test_normalize_table_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(dir.path(), "p.json", &json!({ "smokeLevel": 5 }));

    firetap_cmd()
        .arg("normalize")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status:").and(predicate::str::contains("Safe")));
}

#[test]
fn test_normalize_invalid_json_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("broken.json");
    std::fs::write(&file, "{ not json").unwrap();

    let output = firetap_cmd().arg("normalize").arg(&file).output().unwrap();
    assert_eq!(output.status.code(), Some(65));
    assert!(combined_output(&output).contains("not valid JSON"));
}

#[test]
fn test_normalize_missing_file_fails() {
    let output = firetap_cmd()
        .args(["normalize", "/tmp/firetap-cli-test-nonexistent/absent.json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Could not read"));
}

// ── Replay + history ────────────────────────────────────────────────

#[test]
fn test_replay_persists_history() {
    let dir = tempfile::tempdir().unwrap();
    let storage = dir.path().join("history");
    let script = write_json(
        dir.path(),
        "script.json",
        &json!([
            {
                "path": "devices/d1",
                "value": {
                    "smokeLevel": 40,
                    "temperature": 30,
                    "lastSeen": 1_700_000_000_000_i64,
                    "readings": {
                        "-r1": { "smokeLevel": 20, "lastSeen": 1_699_999_000_000_i64 }
                    }
                }
            },
            {
                "path": "devices/d1/statusHistory/-a1",
                "value": { "timestamp": 1_700_000_000_500_i64, "message": "Help requested" }
            }
        ]),
    );

    let output = firetap_cmd()
        .args(["replay", "--device", "d1", "-o", "json", "--storage-dir"])
        .arg(&storage)
        .arg(&script)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let report = stdout_json(&output);
    assert_eq!(report["device"], "d1");
    assert_eq!(report["phase"], "live");
    assert_eq!(report["latest"]["smokeAnalog"], 40.0);
    assert_eq!(report["timeline"].as_array().unwrap().len(), 2);
    assert_eq!(report["alertCards"][0]["message"], "Help requested");

    let output = firetap_cmd()
        .args(["history", "show", "d1", "-o", "plain", "--storage-dir"])
        .arg(&storage)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "1700000000000\n1699999000000"
    );

    firetap_cmd()
        .args(["history", "clear", "d1", "--storage-dir"])
        .arg(&storage)
        .assert()
        .success();

    let output = firetap_cmd()
        .args(["history", "show", "d1", "--storage-dir"])
        .arg(&storage)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_replay_rejects_bad_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_json(
        dir.path(),
        "script.json",
        &json!([{ "path": "devices/d1", "error": "exploded" }]),
    );

    let output = firetap_cmd()
        .args(["replay", "-d", "d1", "--storage-dir"])
        .arg(dir.path())
        .arg(&script)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(65));
    assert!(combined_output(&output).contains("unknown error kind"));
}

#[test]
fn test_invalid_device_id_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = firetap_cmd()
        .args(["history", "show", "a/b", "--storage-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_env() {
    firetap_cmd()
        .args(["config", "path"])
        .env("FIRETAP_CONFIG", "/tmp/elsewhere/firetap.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/elsewhere/firetap.toml"));
}

#[test]
fn test_config_show_reads_file_and_env() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[monitor]\nhistory_limit = 42\n").unwrap();

    let output = firetap_cmd()
        .args(["config", "show", "-o", "json"])
        .env("FIRETAP_CONFIG", &config)
        .env("FIRETAP_MONITOR__ALERT_CARD_LIMIT", "3")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let shown = stdout_json(&output);
    assert_eq!(shown["monitor"]["history_limit"], 42);
    assert_eq!(shown["monitor"]["alert_card_limit"], 3);
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[monitor]\nhistory_limit = 0\n").unwrap();

    let output = firetap_cmd()
        .args(["config", "show"])
        .env("FIRETAP_CONFIG", &config)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("history_limit"));
}
