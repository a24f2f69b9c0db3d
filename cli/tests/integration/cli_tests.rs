//! Integration tests for the gatewayctl command surface

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn gatewayctl() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gatewayctl"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    // clap with arg_required_else_help shows help on stderr and exits 2.
    // An env-supplied global flag counts as an argument, so drop NO_COLOR.
    gatewayctl()
        .env_remove("NO_COLOR")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Provision and supervise a containerized gateway node",
        ));
}

#[test]
fn test_cli_accepts_conventional_no_color_values() {
    for value in ["1", "true", "0", ""] {
        gatewayctl()
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains("gatewayctl"));
    }
}

#[test]
fn test_cli_help_lists_lifecycle_commands() {
    let assert = gatewayctl().arg("--help").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    for command in [
        "install-runtime",
        "start",
        "stop",
        "env",
        "domain",
        "deploy-proxy",
        "load-wallet",
        "manifest",
        "open-ports",
        "status",
        "serve",
    ] {
        assert!(out.contains(command), "missing {command} in:\n{out}");
    }
    assert!(!out.contains("_acme"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    gatewayctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gatewayctl"));
}

#[test]
fn test_version_command_shows_version() {
    gatewayctl()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "gatewayctl ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let assert = gatewayctl().args(["version", "--json"]).assert().success();
    let value: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid JSON");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_command_fails() {
    gatewayctl()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// --- Certificate hooks ---

#[test]
fn test_auth_hook_without_challenge_env_fails() {
    gatewayctl()
        .arg("_acme-auth-hook")
        .env_remove("CERTBOT_DOMAIN")
        .env_remove("CERTBOT_VALIDATION")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CERTBOT_DOMAIN"));
}

#[test]
fn test_cleanup_hook_never_fails() {
    gatewayctl()
        .arg("_acme-cleanup-hook")
        .env_remove("CERTBOT_DOMAIN")
        .assert()
        .success();
}
