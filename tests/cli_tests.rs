use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

fn pipepool() -> Command {
    Command::cargo_bin("pipepool").expect("binary built")
}

#[test]
fn help_lists_subcommands() {
    pipepool()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run").and(predicate::str::contains("check")));
}

#[test]
fn check_accepts_valid_config() {
    let file = write_temp_config("[pool]\nmax_connections = 3\n");

    pipepool()
        .args(["check", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Pool: 3 connections"));
}

#[test]
fn check_without_file_validates_defaults() {
    pipepool()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("checking defaults"));
}

#[test]
fn check_returns_nonzero_on_config_error() {
    let file = write_temp_config("[pool]\ncheck_interval_ms = 0\n");

    pipepool()
        .args(["check", "-c"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value for pool.check_interval_ms"));
}

#[test]
fn run_with_zero_messages_prints_json_report() {
    pipepool()
        .args(["run", "--messages", "0", "--json", "--log-level", "error"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\":0"))
        .stdout(predicate::str::contains("\"pool\""));
}

#[test]
fn run_rejects_zero_rate() {
    pipepool()
        .args(["run", "--rate", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("limiter.rate"));
}
