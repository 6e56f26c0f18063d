use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("logsink").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("logsink").unwrap();
    cmd.arg("serve").arg("--help").assert().success().stdout(predicate::str::contains("port"));
}

#[test]
fn test_cli_migrate_help() {
    let mut cmd = Command::cargo_bin("logsink").unwrap();
    cmd.arg("migrate").arg("--help").assert().success();
}

#[test]
fn test_cli_missing_subcommand_fails() {
    let mut cmd = Command::cargo_bin("logsink").unwrap();
    cmd.assert().failure();
}
