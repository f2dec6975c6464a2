//! End-to-end tests for the stackctl binary against the in-process backend.
//!
//! Each test runs in its own temporary directory so no `.stackctl/config.toml`
//! from the surrounding checkout is discovered.

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::TempDir;

const TEMPLATE: &str = r#"{
  "AWSTemplateFormatVersion": "2010-09-09",
  "Parameters": {
    "KeyName": { "Type": "String" }
  },
  "Resources": {
    "SampleNotificationTopic": { "Type": "AWS::SNS::Topic" },
    "SampleQueue": { "Type": "AWS::SQS::Queue" }
  }
}"#;

fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    // Stop config discovery at the temp dir
    fs::create_dir(dir.path().join(".git")).unwrap();
    let template = dir.path().join("template.json");
    fs::write(&template, TEMPLATE).unwrap();
    (dir, template)
}

fn stackctl(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stackctl"));
    cmd.current_dir(dir.path())
        .env_remove("STACKCTL_BACKEND")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    cmd
}

fn offline(dir: &TempDir) -> Command {
    let mut cmd = stackctl(dir);
    cmd.args(["--backend", "memory", "--interval-secs", "0"]);
    cmd
}

#[test]
fn help_lists_subcommands() {
    let (dir, _) = workspace();
    stackctl(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn run_round_trip_prints_console_contract() {
    let (dir, template) = workspace();
    offline(&dir)
        .args(["run", "Sample", "-p", "KeyName=test-key", "-l", "SampleNotificationTopic"])
        .arg("-t")
        .arg(&template)
        .assert()
        .success()
        .stdout(predicate::str::contains("Creating a group called Sample.\nWaiting"))
        .stdout(predicate::str::contains(
            "Group Sample completed with CREATE_COMPLETE ()",
        ))
        .stdout(predicate::str::contains("Group : Sample [CREATE_COMPLETE]"))
        .stdout(predicate::str::contains(
            "Looking up resource name SampleNotificationTopic from group Sample",
        ))
        .stdout(predicate::str::contains("Deleting the group called Sample."))
        .stdout(predicate::str::contains(
            "Group Sample completed with NO_SUCH_GROUP (group has been deleted)",
        ));
}

#[test]
fn run_json_is_one_document() {
    let (dir, template) = workspace();
    let output = offline(&dir)
        .args(["run", "Sample", "-p", "KeyName=test-key", "--json"])
        .arg("-t")
        .arg(&template)
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["creation"]["status"], "CREATE_COMPLETE");
    assert_eq!(report["deletion"]["status"], "NO_SUCH_GROUP");
    assert_eq!(report["resolution"], serde_json::Value::Null);
}

#[test]
fn malformed_template_exits_service_rejected() {
    let (dir, template) = workspace();
    fs::write(&template, "{ this is not a template").unwrap();
    offline(&dir)
        .args(["run", "Sample"])
        .arg("-t")
        .arg(&template)
        .assert()
        .code(71)
        .stderr(predicate::str::contains("rejected"))
        .stdout(predicate::str::contains("Waiting").not());
}

#[test]
fn missing_required_parameter_exits_service_rejected() {
    let (dir, template) = workspace();
    offline(&dir)
        .args(["create", "-g", "Sample", "--wait"])
        .arg("-t")
        .arg(&template)
        .assert()
        .code(71)
        .stderr(predicate::str::contains("KeyName"));
}

#[test]
fn invalid_group_name_exits_cli_args() {
    let (dir, template) = workspace();
    offline(&dir)
        .args(["create", "-g", "1-not-a-name"])
        .arg("-t")
        .arg(&template)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("group_name"));
}

#[test]
fn unknown_backend_exits_cli_args() {
    let (dir, _) = workspace();
    stackctl(&dir)
        .args(["list", "--backend", "carrier-pigeon"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("carrier-pigeon"));
}

#[test]
fn unreadable_template_exits_cli_args() {
    let (dir, _) = workspace();
    offline(&dir)
        .args(["create", "-g", "Sample", "-t", "does-not-exist.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does-not-exist.json"));
}

#[test]
fn wait_on_unknown_group_reports_deleted() {
    let (dir, _) = workspace();
    let output = offline(&dir).args(["wait", "Ghost", "--json"]).output().unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["group"], "Ghost");
    assert_eq!(report["status"], "NO_SUCH_GROUP");
    assert_eq!(report["reason"], "group has been deleted");
}

#[test]
fn list_with_no_groups_prints_nothing() {
    let (dir, _) = workspace();
    offline(&dir).arg("list").assert().success().stdout("");
}

#[test]
fn config_file_values_are_attributed() {
    let (dir, template) = workspace();
    fs::create_dir(dir.path().join(".stackctl")).unwrap();
    fs::write(
        dir.path().join(".stackctl/config.toml"),
        format!(
            r#"
[group]
name = "FromFile"
template = "{}"

[wait]
interval_secs = 10
"#,
            template.display()
        ),
    )
    .unwrap();

    stackctl(&dir)
        .args(["config", "--backend", "memory"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"group_name\s+= FromFile \(config\)").unwrap())
        .stdout(predicate::str::is_match(r"interval_secs\s+= 10 \(config\)").unwrap())
        .stdout(predicate::str::is_match(r"backend\s+= memory \(cli\)").unwrap())
        .stdout(predicate::str::is_match(r"timeout_secs\s+= 3600 \(default\)").unwrap());
}

#[test]
fn backend_env_var_is_attributed() {
    let (dir, _) = workspace();
    stackctl(&dir)
        .env("STACKCTL_BACKEND", "memory")
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""source": "env""#));
}

#[test]
fn broken_config_file_exits_cli_args() {
    let (dir, _) = workspace();
    fs::create_dir(dir.path().join(".stackctl")).unwrap();
    fs::write(dir.path().join(".stackctl/config.toml"), "[group\nname =").unwrap();

    stackctl(&dir)
        .arg("config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration"));
}
