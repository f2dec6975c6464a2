use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tempfile::NamedTempFile;

use super::*;
use crate::service::{InMemoryService, Operation, ScriptedObservation};
use crate::types::{GroupSummary, LifecycleStatus, Parameter, Resource, ResourceGroup};
use crate::{CancelHandle, CancelToken, Config, ExitCode, StackError};
use stackctl_utils::test_support::SAMPLE_TEMPLATE;

fn template_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

fn sample_config(template: &NamedTempFile) -> Config {
    Config::builder()
        .group_name("Sample")
        .template(template.path())
        .parameter(Parameter::new("KeyName", "test-key"))
        .logical_resource("SampleNotificationTopic")
        .backend("memory")
        .interval_secs(5)
        .build()
        .unwrap()
}

fn group_config(name: &str) -> Config {
    Config::builder()
        .group_name(name)
        .backend("memory")
        .interval_secs(5)
        .build()
        .unwrap()
}

fn context<'a>(
    config: &'a Config,
    service: &Arc<InMemoryService>,
    json: bool,
) -> CommandContext<'a> {
    CommandContext {
        config,
        service: service.clone(),
        cancel: CancelToken::never(),
        json,
    }
}

fn seeded(name: &str) -> ResourceGroup {
    ResourceGroup {
        summary: GroupSummary::new(name, LifecycleStatus::CreateComplete),
        resources: vec![Resource::new(
            "Notification::Topic",
            "Topic",
            Some("arn:123".to_string()),
        )],
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_walks_the_whole_lifecycle() {
    let template = template_file(SAMPLE_TEMPLATE);
    let config = sample_config(&template);
    let service = Arc::new(InMemoryService::new(2));
    let mut out = Vec::new();

    let code = execute_run_command(&context(&config, &service, false), false, &mut out)
        .await
        .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Creating a group called Sample.");
    assert_eq!(lines[1], "Waiting...done");
    assert_eq!(lines[2], "Group Sample completed with CREATE_COMPLETE ()");
    assert_eq!(lines[3], "Group : Sample [CREATE_COMPLETE]");
    assert!(lines[4].starts_with("    AWS::SNS::Topic"));
    assert!(lines[5].starts_with("    AWS::SQS::Queue"));
    assert_eq!(
        lines[6],
        "Looking up resource name SampleNotificationTopic from group Sample"
    );
    assert!(lines[7].contains("SampleNotificationTopic"));
    assert_eq!(lines[8], "Deleting the group called Sample.");
    assert_eq!(lines[9], "Waiting...done");
    assert_eq!(
        lines[10],
        "Group Sample completed with NO_SUCH_GROUP (group has been deleted)"
    );
    assert_eq!(lines.len(), 11);
    assert_eq!(service.calls(Operation::Delete), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_keep_leaves_group_in_place() {
    let template = template_file(SAMPLE_TEMPLATE);
    let config = sample_config(&template);
    let service = Arc::new(InMemoryService::new(0));
    let mut out = Vec::new();

    let code = execute_run_command(&context(&config, &service, false), true, &mut out)
        .await
        .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(service.calls(Operation::Delete), 0);
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("Deleting the group"));

    let mut listing = Vec::new();
    execute_list_command(&context(&config, &service, false), &mut listing)
        .await
        .unwrap();
    assert!(String::from_utf8(listing).unwrap().starts_with("Group : Sample [CREATE_COMPLETE]\n"));
}

#[tokio::test(start_paused = true)]
async fn test_run_json_reports_every_phase() {
    let template = template_file(SAMPLE_TEMPLATE);
    let config = sample_config(&template);
    let service = Arc::new(InMemoryService::new(1));
    let mut out = Vec::new();

    execute_run_command(&context(&config, &service, true), false, &mut out)
        .await
        .unwrap();

    let report: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["group"], "Sample");
    assert_eq!(report["creation"]["status"], "CREATE_COMPLETE");
    assert_eq!(report["creation"]["polls"], 2);
    assert_eq!(report["groups"][0]["name"], "Sample");
    assert_eq!(
        report["resolution"]["resources"][0]["logical_name"],
        "SampleNotificationTopic"
    );
    assert_eq!(report["deletion"]["status"], "NO_SUCH_GROUP");
    assert_eq!(report["state"], "deleted");
}

#[tokio::test(start_paused = true)]
async fn test_malformed_template_is_rejected_without_polling() {
    let template = template_file("{ not json");
    let config = sample_config(&template);
    let service = Arc::new(InMemoryService::new(0));
    let mut out = Vec::new();

    let err = execute_run_command(&context(&config, &service, false), false, &mut out)
        .await
        .unwrap_err();

    assert_eq!(err.to_exit_code(), ExitCode::SERVICE_REJECTED);
    assert_eq!(service.calls(Operation::Describe), 0);
    assert_eq!(String::from_utf8(out).unwrap(), "Creating a group called Sample.\n");
}

#[tokio::test(start_paused = true)]
async fn test_create_without_wait_only_submits() {
    let template = template_file(SAMPLE_TEMPLATE);
    let config = sample_config(&template);
    let service = Arc::new(InMemoryService::new(0));
    let mut out = Vec::new();

    let code = execute_create_command(&context(&config, &service, false), false, &mut out)
        .await
        .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(String::from_utf8(out).unwrap(), "Creating a group called Sample.\n");
    assert_eq!(service.calls(Operation::Create), 1);
    assert_eq!(service.calls(Operation::Describe), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_on_failed_group_exits_group_failed() {
    let config = group_config("Broken");
    let service = Arc::new(InMemoryService::new(0));
    service.script_statuses(
        "Broken",
        vec![
            ScriptedObservation::status(LifecycleStatus::CreateInProgress),
            ScriptedObservation::Present(
                LifecycleStatus::CreateFailed,
                Some("Resource creation cancelled".to_string()),
            ),
        ],
    );
    let mut out = Vec::new();

    let code = execute_wait_command(&context(&config, &service, false), &mut out)
        .await
        .unwrap();

    assert_eq!(code, ExitCode::GROUP_FAILED);
    assert!(
        String::from_utf8(out)
            .unwrap()
            .ends_with("Group Broken completed with CREATE_FAILED (Resource creation cancelled)\n")
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_on_missing_group_settles_immediately() {
    let config = group_config("Ghost");
    let service = Arc::new(InMemoryService::new(0));
    let mut out = Vec::new();

    let code = execute_wait_command(&context(&config, &service, true), &mut out)
        .await
        .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    let report: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["group"], "Ghost");
    assert_eq!(report["status"], "NO_SUCH_GROUP");
    assert_eq!(report["waited_ms"], 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_cancelled_by_interrupt() {
    let config = group_config("Slow");
    let service = Arc::new(InMemoryService::new(0));
    service.script_statuses(
        "Slow",
        vec![ScriptedObservation::status(LifecycleStatus::CreateInProgress)],
    );
    let (handle, token) = CancelHandle::pair();
    handle.cancel();
    let ctx = CommandContext {
        cancel: token,
        ..context(&config, &service, false)
    };
    let mut out = Vec::new();

    let err = execute_wait_command(&ctx, &mut out).await.unwrap_err();

    assert!(matches!(err, StackError::Cancelled { .. }));
    assert_eq!(err.to_exit_code(), ExitCode::CANCELLED);
    assert_eq!(String::from_utf8(out).unwrap(), "Waiting.\n");
}

#[tokio::test(start_paused = true)]
async fn test_delete_existing_group_and_wait() {
    let config = group_config("Seeded");
    let service = Arc::new(InMemoryService::new(1));
    service.seed_group(seeded("Seeded"));
    let mut out = Vec::new();

    let code = execute_delete_command(&context(&config, &service, false), true, &mut out)
        .await
        .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Deleting the group called Seeded.\nWaiting..done\n\
         Group Seeded completed with NO_SUCH_GROUP (group has been deleted)\n"
    );
}

#[tokio::test(start_paused = true)]
async fn test_delete_missing_group_sends_nothing() {
    let config = group_config("Ghost");
    let service = Arc::new(InMemoryService::new(0));
    let mut out = Vec::new();

    let code = execute_delete_command(&context(&config, &service, false), true, &mut out)
        .await
        .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(String::from_utf8(out).unwrap(), "Group Ghost does not exist.\n");
    assert_eq!(service.calls(Operation::Delete), 0);
}

#[tokio::test(start_paused = true)]
async fn test_delete_refused_while_provisioning() {
    let config = group_config("Busy");
    let service = Arc::new(InMemoryService::new(0));
    service.script_statuses(
        "Busy",
        vec![ScriptedObservation::status(LifecycleStatus::CreateInProgress)],
    );
    let mut out = Vec::new();

    let err = execute_delete_command(&context(&config, &service, false), false, &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, StackError::InvalidTransition { .. }));
    assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
    assert_eq!(service.calls(Operation::Delete), 0);
}

#[tokio::test(start_paused = true)]
async fn test_resolve_prints_matching_record() {
    let config = Config::builder()
        .group_name("Seeded")
        .logical_resource("Topic")
        .backend("memory")
        .build()
        .unwrap();
    let service = Arc::new(InMemoryService::new(0));
    service.seed_group(seeded("Seeded"));
    let mut out = Vec::new();

    execute_resolve_command(&context(&config, &service, true), &mut out)
        .await
        .unwrap();

    let report: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(report["logical_name"], "Topic");
    assert_eq!(report["resources"][0]["resource_type"], "Notification::Topic");
    assert_eq!(report["resources"][0]["physical_id"], "arn:123");
    assert_eq!(report["resources"].as_array().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resolve_on_missing_group_is_rejected() {
    let config = Config::builder()
        .group_name("Ghost")
        .logical_resource("Topic")
        .backend("memory")
        .build()
        .unwrap();
    let service = Arc::new(InMemoryService::new(0));
    let mut out = Vec::new();

    let err = execute_resolve_command(&context(&config, &service, false), &mut out)
        .await
        .unwrap_err();

    assert_eq!(err.to_exit_code(), ExitCode::SERVICE_REJECTED);
}

#[tokio::test(start_paused = true)]
async fn test_list_is_stable_across_calls() {
    let config = group_config("Seeded");
    let service = Arc::new(InMemoryService::new(0));
    service.seed_group(seeded("Seeded"));
    let ctx = context(&config, &service, false);

    let mut first = Vec::new();
    let mut second = Vec::new();
    execute_list_command(&ctx, &mut first).await.unwrap();
    execute_list_command(&ctx, &mut second).await.unwrap();

    assert_eq!(first, second);
    assert!(String::from_utf8(first).unwrap().starts_with("Group : Seeded [CREATE_COMPLETE]\n"));
}

#[tokio::test(start_paused = true)]
async fn test_create_wait_times_out() {
    let template = template_file(SAMPLE_TEMPLATE);
    let config = Config::builder()
        .group_name("Sample")
        .template(template.path())
        .parameter(Parameter::new("KeyName", "k"))
        .backend("memory")
        .interval_secs(5)
        .timeout_secs(10)
        .build()
        .unwrap();
    let service = Arc::new(InMemoryService::new(100));
    let mut out = Vec::new();

    let started = tokio::time::Instant::now();
    let err = execute_create_command(&context(&config, &service, false), true, &mut out)
        .await
        .unwrap_err();

    assert_eq!(err.to_exit_code(), ExitCode::WAIT_TIMEOUT);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}
