//! Integration tests for commands that only touch the node directory.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A throwaway home with a config file pointing at `<home>/node`.
struct Node {
    home: TempDir,
}

impl Node {
    fn new() -> Self {
        let home = tempfile::tempdir().expect("tempdir");
        let node = home.path().join("node");
        std::fs::create_dir_all(&node).expect("node dir");
        std::fs::write(
            home.path().join("config.yaml"),
            format!("node_dir: {}\n", node.display()),
        )
        .expect("config");
        Self { home }
    }

    fn dir(&self) -> PathBuf {
        self.home.path().join("node")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir().join(name);
        std::fs::write(&path, content).expect("write");
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gatewayctl"));
        cmd.env("NO_COLOR", "1")
            .env("HOME", self.home.path())
            .env("GATEWAY_CONFIG", self.home.path().join("config.yaml"))
            .env_remove("GATEWAY_API_KEY");
        cmd
    }
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is one JSON document")
}

// --- env ---

#[test]
fn test_env_show_prints_file_in_order() {
    let node = Node::new();
    node.write(".env", "AR_IO_WALLET=abc\n# comment\nGRAPHQL_HOST=arweave.net\n");

    node.cmd()
        .args(["env", "show"])
        .assert()
        .success()
        .stdout("AR_IO_WALLET=abc\nGRAPHQL_HOST=arweave.net\n");
}

#[test]
fn test_env_show_json_is_an_object() {
    let node = Node::new();
    node.write(".env", "AR_IO_WALLET=abc\n");

    let assert = node.cmd().args(["env", "show", "--json"]).assert().success();
    let value = stdout_json(assert.get_output());
    assert_eq!(value["AR_IO_WALLET"], "abc");
}

#[test]
fn test_env_set_rejects_malformed_assignment() {
    let node = Node::new();
    node.cmd()
        .args(["env", "set", "no-equals-sign"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("KEY=VALUE"));
}

// --- domain ---

#[test]
fn test_domain_show_json_without_domain_is_null() {
    let node = Node::new();
    let assert = node
        .cmd()
        .args(["domain", "show", "--json"])
        .assert()
        .success();
    assert_eq!(stdout_json(assert.get_output())["domain"], serde_json::Value::Null);
}

#[test]
fn test_domain_set_rejects_invalid_name() {
    let node = Node::new();
    node.cmd()
        .args(["domain", "set", "bad_name.example"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not save the domain"));
    assert!(!node.dir().join(".domain").exists());
}

#[test]
fn test_domain_check_without_domain_fails() {
    let node = Node::new();
    node.cmd()
        .args(["domain", "check"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No domain saved"));
}

// --- wallet ---

#[test]
fn test_load_wallet_stores_key_and_sets_observer() {
    let node = Node::new();
    node.write(".env", "AR_IO_WALLET=\n");
    let jwk = node.write("key.json", r#"{"kty":"RSA","n":"AQAB","e":"AQAB"}"#);

    let assert = node
        .cmd()
        .args(["load-wallet", "--json"])
        .arg(&jwk)
        .assert()
        .success();
    let address = stdout_json(assert.get_output())["address"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(address.len(), 43);

    let stored = node.dir().join("wallets").join(format!("{address}.json"));
    assert!(stored.exists());
    let env = std::fs::read_to_string(node.dir().join(".env")).unwrap();
    assert!(env.contains(&format!("OBSERVER_WALLET={address}")));
}

#[test]
fn test_load_wallet_rejects_non_rsa_file() {
    let node = Node::new();
    let bogus = node.write("key.json", r#"{"kty":"RSA"}"#);

    node.cmd()
        .arg("load-wallet")
        .arg(&bogus)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not load the wallet file"));
    assert!(!node.dir().join("wallets").exists());
}

// --- manifest ---

#[test]
fn test_manifest_apply_without_pending_update_succeeds() {
    let node = Node::new();
    let assert = node
        .cmd()
        .args(["manifest", "apply", "--json"])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());
    assert_eq!(value["command"], "manifest apply");
    assert_eq!(value["ok"], true);
}

#[test]
fn test_manifest_discard_keeps_local_copy() {
    let node = Node::new();
    node.write("docker-compose.yaml", "services: {}\n");
    node.write("docker-compose.yaml.pending", "services: {a: {}}\n");

    node.cmd().args(["manifest", "discard"]).assert().success();

    assert!(!node.dir().join("docker-compose.yaml.pending").exists());
    assert_eq!(
        std::fs::read_to_string(node.dir().join("docker-compose.yaml")).unwrap(),
        "services: {}\n"
    );
}
