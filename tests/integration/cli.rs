//! Tests of the `routeload` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// The binary with an isolated home directory and no config override.
fn routeload(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("routeload").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("ROUTELOAD_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    routeload(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("parse"));
}

#[test]
fn test_parse_prints_context() {
    let home = TempDir::new().unwrap();
    let output = routeload(&home)
        .args(["parse", "/users/:userId/addresses/:addressId", "-p", "addressId=20"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["storeToParam"]["users"], "userId");
    assert_eq!(value["idValues"]["addresses"], 20);
    assert!(value["idValues"]["users"].is_null());
}

#[test]
fn test_orphan_parameter_fails() {
    let home = TempDir::new().unwrap();
    routeload(&home)
        .args(["parse", "/:userId"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("userId"));
}

#[test]
fn test_list_template_ending_in_param_fails() {
    let home = TempDir::new().unwrap();
    routeload(&home)
        .args(["parse", "/users/:userId", "--list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("drop --list"));
}

#[test]
fn test_resolve_requires_base_url() {
    let home = TempDir::new().unwrap();
    routeload(&home)
        .args(["resolve", "/users/:userId", "-p", "userId=10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("base_url"));
}

#[test]
fn test_resolve_reads_config_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("routeload.toml");
    std::fs::write(&config, "cache_ttl_ms = 0\n").unwrap();

    routeload(&home)
        .args(["--config"])
        .arg(&config)
        .args(["resolve", "/users/:userId", "--base-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cache_ttl_ms"));
}

#[test]
fn test_resolve_reports_unreachable_store() {
    let home = TempDir::new().unwrap();
    routeload(&home)
        .args(["resolve", "/users/:userId", "-p", "userId=10", "--base-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("http://127.0.0.1:9/users/10"));
}

#[test]
fn test_resolve_without_ids_is_unresolvable() {
    let home = TempDir::new().unwrap();
    routeload(&home)
        .args(["resolve", "/users/:userId", "--base-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no id for stores: users"));
}
