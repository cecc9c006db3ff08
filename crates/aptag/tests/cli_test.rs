//! Integration tests for the `aptag` binary.
//!
//! Everything here runs without a broker or a controller: `check` and
//! `render` never open a connection, and `run` is only exercised on paths
//! that fail before connecting.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/config.json");

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `aptag` binary with env isolation.
fn aptag_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("aptag");
    cmd.env_remove("APTAG_CONFIG")
        .env_remove("APTAG_MQTT__TOPIC")
        .env_remove("APTAG_MQTT__BROKER")
        .env_remove("APTAG_NETCONF__TIMEOUT_SECS")
        .env_remove("WLC_USER")
        .env_remove("WLC_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// `aptag_cmd` with controller credentials set.
fn aptag_with_credentials() -> assert_cmd::Command {
    let mut cmd = aptag_cmd();
    cmd.env("WLC_USER", "netops").env("WLC_PASSWORD", "hunter2");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = aptag_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    aptag_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("run")
            .and(predicate::str::contains("check"))
            .and(predicate::str::contains("render")),
    );
}

#[test]
fn test_version_flag() {
    aptag_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("aptag"));
}

// ── check ───────────────────────────────────────────────────────────

#[test]
fn test_check_summarizes_config() {
    aptag_with_credentials()
        .args(["--config", FIXTURE, "check"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("controllers: 2")
                .and(predicate::str::contains("mapped APs:  2"))
                .and(predicate::str::contains("topic 'aps/announce'"))
                .and(predicate::str::contains("host key pinned"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_check_missing_config_file() {
    aptag_with_credentials()
        .args(["--config", "/nonexistent/aptag.json", "check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_check_without_password_is_auth_error() {
    aptag_cmd()
        .env("WLC_USER", "netops")
        .args(["--config", FIXTURE, "check"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("WLC_PASSWORD"));
}

#[test]
fn test_check_rejects_empty_topic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let fixture = std::fs::read_to_string(FIXTURE).unwrap();
    std::fs::write(&path, fixture.replace("aps/announce", "")).unwrap();

    aptag_with_credentials()
        .arg("--config")
        .arg(&path)
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("mqtt.topic"));
}

#[test]
fn test_env_overrides_config_file() {
    aptag_with_credentials()
        .env("APTAG_MQTT__TOPIC", "aps/other")
        .args(["--config", FIXTURE, "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("topic 'aps/other'"));
}

// ── render ──────────────────────────────────────────────────────────

#[test]
fn test_render_mapped_mac() {
    aptag_cmd()
        .args(["--config", FIXTURE, "render", "--mac", "aa:bb:cc:dd:ee:ff"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(
                "<ap-tag><ap-mac>aa:bb:cc:dd:ee:ff</ap-mac><policy-tag>P1</policy-tag><site-tag>S1</site-tag><rf-tag>R1</rf-tag></ap-tag>",
            )
            .and(predicate::str::contains(
                r#"<cisco-ia:save-config xmlns:cisco-ia="http://cisco.com/yang/cisco-ia"/>"#,
            )),
        );
}

#[test]
fn test_render_uses_fixed_netconf_port() {
    aptag_cmd()
        .args([
            "--config",
            FIXTURE,
            "render",
            "--mac",
            "00:11:22:33:44:55",
            "--wlc",
            "wlc2.example.net",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("target: wlc2.example.net:830"));
}

#[test]
fn test_render_honors_controller_port_override() {
    aptag_cmd()
        .env("APTAG_NETCONF__HONOR_CONTROLLER_PORT", "true")
        .args([
            "--config",
            FIXTURE,
            "render",
            "--mac",
            "00:11:22:33:44:55",
            "--wlc",
            "wlc2.example.net",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("target: wlc2.example.net:2022"));
}

#[test]
fn test_render_unmapped_mac_is_not_found() {
    aptag_cmd()
        .args(["--config", FIXTURE, "render", "--mac", "AA:BB:CC:DD:EE:FF"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("ap-tag-map"));
}

#[test]
fn test_render_unknown_controller_is_not_found() {
    aptag_cmd()
        .args([
            "--config",
            FIXTURE,
            "render",
            "--mac",
            "aa:bb:cc:dd:ee:ff",
            "--wlc",
            "wlc9",
        ])
        .assert()
        .code(4);
}

// ── run ─────────────────────────────────────────────────────────────

#[test]
fn test_run_requires_credentials() {
    aptag_cmd()
        .args(["--config", FIXTURE, "run"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("WLC_USER"));
}
