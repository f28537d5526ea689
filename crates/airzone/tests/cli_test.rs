//! Integration tests for the `airzone` CLI binary.
//!
//! Argument parsing, help output, completions, config and backup commands
//! run offline. Webserver-bound commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `airzone` binary with env isolation.
///
/// Clears all `AIRZONE_*` env vars and points every platform directory
/// into `home` so tests never touch the user's real config, cache, or
/// backups.
fn airzone_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("airzone");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("AIRZONE_PROFILE")
        .env_remove("AIRZONE_IP")
        .env_remove("AIRZONE_PORT")
        .env_remove("AIRZONE_OUTPUT")
        .env_remove("AIRZONE_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn backup_doc() -> Value {
    json!({
        "version": 1,
        "createdAt": "2024-05-01T10:00:00Z",
        "device": { "alias": "Casa", "mac": "AA:BB:CC:DD:EE:FF", "host": "10.0.0.5", "port": 3000 },
        "systems": [{ "systemID": 1 }],
        "zones": [{ "systemID": 1, "zoneID": 1, "name": "Salon", "on": 1, "setpoint": 22.5, "mode": 2 }]
    })
}

fn write_json(path: &Path, doc: &Value) {
    std::fs::write(path, serde_json::to_vec_pretty(doc).unwrap()).unwrap();
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = airzone_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    airzone_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("Airzone")
            .and(predicate::str::contains("control"))
            .and(predicate::str::contains("backup"))
            .and(predicate::str::contains("iaq")),
    );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    airzone_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("airzone"));
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    airzone_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = airzone_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_mode_out_of_range_is_rejected_before_connecting() {
    let home = tempfile::tempdir().unwrap();
    airzone_cmd(home.path())
        .args(["control", "-s", "1", "-z", "1", "--mode", "7"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    let output = airzone_cmd(home.path())
        .args(["-p", "nowhere", "status", "-s", "1", "-z", "1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("nowhere"));
}

#[test]
fn test_unreachable_webserver() {
    let home = tempfile::tempdir().unwrap();
    airzone_cmd(home.path())
        .args(["--host", "127.0.0.1", "--port", "1", "--no-cache", "--timeout", "2"])
        .args(["status", "-s", "1", "-z", "1"])
        .assert()
        .code(predicate::in_iter([7, 8]));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path() {
    let home = tempfile::tempdir().unwrap();
    airzone_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    airzone_cmd(home.path())
        .args(["config", "set", "host", "10.0.0.9"])
        .assert()
        .success();
    airzone_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("host = \"10.0.0.9\""));
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    airzone_cmd(home.path())
        .args(["config", "use", "attic"])
        .assert()
        .code(4);
}

// ── Backups ─────────────────────────────────────────────────────────

#[test]
fn test_backup_list_empty() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("backups");
    airzone_cmd(home.path())
        .args(["backup", "list", "--dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups"));
}

#[test]
fn test_backup_validate_valid_file() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("good.json");
    write_json(&file, &backup_doc());

    airzone_cmd(home.path())
        .args(["backup", "validate"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid backup"));
}

#[test]
fn test_backup_validate_reports_field_path() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("bad.json");
    let mut doc = backup_doc();
    doc["zones"][0]["zoneID"] = json!("x");
    write_json(&file, &doc);

    airzone_cmd(home.path())
        .args(["backup", "validate"])
        .arg(&file)
        .assert()
        .code(5)
        .stdout(predicate::str::contains("zones[0].zoneID"));
}

#[test]
fn test_backup_validate_missing_file() {
    let home = tempfile::tempdir().unwrap();
    airzone_cmd(home.path())
        .args(["backup", "validate", "does-not-exist.json", "--dir"])
        .arg(home.path())
        .assert()
        .code(4);
}

// ── Against a mock webserver ────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_reads_zone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/hvac"))
        .and(body_json(json!({ "systemID": 1, "zoneID": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "systemID": 1, "zoneID": 2, "name": "Salon", "on": 1,
                "roomTemp": 23.4, "setpoint": 22.0, "mode": 2, "units": 0
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let port = server.address().port().to_string();
    let output = airzone_cmd(home.path())
        .args(["--host", "127.0.0.1", "--port", &port, "--no-cache"])
        .args(["status", "-s", "1", "-z", "2", "-o", "json"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let zone: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(zone["name"], "Salon");
    assert_eq!(zone["zoneID"], 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_device_error_maps_to_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/hvac"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "zone": "zone not found" }]
        })))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let port = server.address().port().to_string();
    airzone_cmd(home.path())
        .args(["--host", "127.0.0.1", "--port", &port, "--no-cache"])
        .args(["status", "-s", "1", "-z", "9"])
        .assert()
        .code(3);
}
