//! In-process orchestration service
//!
//! Simulates the parts of CloudFormation the lifecycle driver touches, so the
//! CLI can run offline and tests can script exact status sequences.
//!
//! Time does not exist here: a group advances one step each time it is
//! described. A created group reports `CREATE_IN_PROGRESS` for
//! `settle_polls` observations, then `CREATE_COMPLETE`; a deleted group
//! reports `DELETE_IN_PROGRESS` for `settle_polls` observations and then
//! disappears from every listing.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use stackctl_utils::error::ServiceError;
use stackctl_utils::types::{
    CreateGroupRequest, GroupSummary, LifecycleStatus, Parameter, Resource, ResourceGroup,
};

use crate::OrchestrationService;

const VALIDATION_ERROR: &str = "ValidationError";
const ALREADY_EXISTS: &str = "AlreadyExistsException";
const USER_INITIATED: &str = "User Initiated";

/// Service calls that can be counted or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Describe,
    ListResources,
    Delete,
}

impl Operation {
    fn api_name(self) -> &'static str {
        match self {
            Self::Create => "CreateStack",
            Self::Describe => "DescribeStacks",
            Self::ListResources => "DescribeStackResources",
            Self::Delete => "DeleteStack",
        }
    }
}

/// One scripted answer to a describe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedObservation {
    /// The group is listed with this status and optional reason.
    Present(LifecycleStatus, Option<String>),
    /// The group is not listed.
    Absent,
}

impl ScriptedObservation {
    #[must_use]
    pub fn status(status: LifecycleStatus) -> Self {
        Self::Present(status, None)
    }
}

#[derive(Debug)]
enum Phase {
    Creating { remaining: u32 },
    Deleting { remaining: u32 },
    Settled,
    /// Answers come from the queue; the last entry repeats.
    Scripted(VecDeque<ScriptedObservation>),
}

#[derive(Debug)]
struct GroupRecord {
    summary: GroupSummary,
    resources: Vec<Resource>,
    phase: Phase,
}

#[derive(Debug, Default)]
struct State {
    groups: Vec<GroupRecord>,
    failures: Vec<(Operation, ServiceError)>,
    calls: Vec<Operation>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn request_id(&mut self) -> String {
        format!("memory-{:08x}", self.next_id())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.summary.name == name)
    }

    fn take_failure(&mut self, operation: Operation) -> Option<ServiceError> {
        let index = self.failures.iter().position(|(op, _)| *op == operation)?;
        Some(self.failures.remove(index).1)
    }

    fn reject(&mut self, operation: Operation, code: &str, message: String) -> ServiceError {
        let request_id = self.request_id();
        ServiceError::rejected(operation.api_name(), message, 400, code, Some(request_id))
    }

    /// Advance the group at `index` one observation and report it, or `None`
    /// if it is no longer visible.
    fn observe(&mut self, index: usize) -> Option<GroupSummary> {
        enum Step {
            Report,
            Complete,
            Remove,
            Script(Option<ScriptedObservation>),
        }

        let step = match &mut self.groups[index].phase {
            Phase::Settled => Step::Report,
            Phase::Creating { remaining } | Phase::Deleting { remaining } if *remaining > 0 => {
                *remaining -= 1;
                Step::Report
            }
            Phase::Creating { .. } => Step::Complete,
            Phase::Deleting { .. } => Step::Remove,
            Phase::Scripted(queue) => Step::Script(if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }),
        };

        match step {
            Step::Report => {}
            Step::Complete => self.complete_creation(index),
            Step::Remove => {
                self.groups.remove(index);
                return None;
            }
            Step::Script(Some(ScriptedObservation::Present(status, reason))) => {
                let summary = &mut self.groups[index].summary;
                summary.status = status;
                summary.status_reason = reason;
            }
            Step::Script(_) => return None,
        }
        Some(self.groups[index].summary.clone())
    }

    /// Mark the group created and give every resource a physical id.
    fn complete_creation(&mut self, index: usize) {
        let first_id = self.next_id;
        self.next_id += self.groups[index].resources.len() as u64;

        let record = &mut self.groups[index];
        record.summary.status = LifecycleStatus::CreateComplete;
        record.summary.status_reason = None;
        record.phase = Phase::Settled;
        for (offset, resource) in record.resources.iter_mut().enumerate() {
            resource.physical_id = Some(format!(
                "{}-{}-{:012X}",
                record.summary.name,
                resource.logical_name,
                first_id + offset as u64 + 1
            ));
        }
    }
}

/// In-memory [`OrchestrationService`].
///
/// Cheap to construct; all state lives behind one mutex and no lock is held
/// across an await point.
#[derive(Debug)]
pub struct InMemoryService {
    settle_polls: u32,
    state: Mutex<State>,
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self::new(2)
    }
}

impl InMemoryService {
    /// `settle_polls` is how many observations a group stays `*_IN_PROGRESS`.
    #[must_use]
    pub fn new(settle_polls: u32) -> Self {
        Self {
            settle_polls,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a settled group as if it had been created earlier.
    pub fn seed_group(&self, group: ResourceGroup) {
        let mut state = self.state();
        if let Some(index) = state.position(&group.summary.name) {
            state.groups.remove(index);
        }
        state.groups.push(GroupRecord {
            summary: group.summary,
            resources: group.resources,
            phase: Phase::Settled,
        });
    }

    /// Make future describe calls for `name` answer from `observations`, in
    /// order, repeating the last one.
    ///
    /// The group is registered if it does not exist yet, with no resources.
    pub fn script_statuses(&self, name: &str, observations: Vec<ScriptedObservation>) {
        let mut state = self.state();
        let queue = VecDeque::from(observations);
        match state.position(name) {
            Some(index) => state.groups[index].phase = Phase::Scripted(queue),
            None => state.groups.push(GroupRecord {
                summary: GroupSummary::new(name, LifecycleStatus::CreateInProgress),
                resources: Vec::new(),
                phase: Phase::Scripted(queue),
            }),
        }
    }

    /// Fail the next call of `operation` with `error`. Failures queue up.
    pub fn fail_next(&self, operation: Operation, error: ServiceError) {
        self.state().failures.push((operation, error));
    }

    /// Number of calls of `operation` issued so far, failed ones included.
    #[must_use]
    pub fn calls(&self, operation: Operation) -> usize {
        self.state().calls.iter().filter(|op| **op == operation).count()
    }

    fn begin(&self, operation: Operation) -> Result<MutexGuard<'_, State>, ServiceError> {
        let mut state = self.state();
        state.calls.push(operation);
        match state.take_failure(operation) {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

/// Resources declared in a JSON template, plus its declared parameters as
/// `(name, default)` pairs.
type ParsedTemplate = (Vec<Resource>, Vec<(String, Option<String>)>);

fn parse_template(body: &str) -> Result<ParsedTemplate, String> {
    let doc: Value = serde_json::from_str(body)
        .map_err(|e| format!("Template format error: JSON not well-formed. ({e})"))?;

    let resources = doc
        .get("Resources")
        .and_then(Value::as_object)
        .filter(|map| !map.is_empty())
        .ok_or_else(|| {
            "Template format error: At least one Resources member must be defined.".to_string()
        })?;

    let mut parsed = Vec::with_capacity(resources.len());
    for (logical, definition) in resources {
        let resource_type = definition
            .get("Type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                format!("Template format error: [/Resources/{logical}] Every Resources object must contain a Type member.")
            })?;
        parsed.push(Resource::new(resource_type, logical.as_str(), None));
    }

    let declared = doc
        .get("Parameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .map(|(name, spec)| {
                    let default = spec.get("Default").map(|d| match d {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    });
                    (name.clone(), default)
                })
                .collect()
        })
        .unwrap_or_default();

    Ok((parsed, declared))
}

/// Check submitted parameters against the declared ones and return what the
/// service stores: submitted values in order, then unsupplied defaults.
fn resolve_parameters(
    submitted: &[Parameter],
    declared: &[(String, Option<String>)],
) -> Result<Vec<Parameter>, String> {
    let undeclared: Vec<&str> = submitted
        .iter()
        .filter(|p| !declared.iter().any(|(name, _)| *name == p.key))
        .map(|p| p.key.as_str())
        .collect();
    if !undeclared.is_empty() {
        return Err(format!(
            "Parameters: [{}] do not exist in the template",
            undeclared.join(", ")
        ));
    }

    let missing: Vec<&str> = declared
        .iter()
        .filter(|(name, default)| default.is_none() && !submitted.iter().any(|p| p.key == *name))
        .map(|(name, _)| name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(format!("Parameters: [{}] must have values", missing.join(", ")));
    }

    let mut stored = submitted.to_vec();
    for (name, default) in declared {
        if let Some(value) = default
            && !submitted.iter().any(|p| p.key == *name)
        {
            stored.push(Parameter::new(name.as_str(), value.as_str()));
        }
    }
    Ok(stored)
}

#[async_trait]
impl OrchestrationService for InMemoryService {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_group(
        &self,
        request: &CreateGroupRequest,
    ) -> Result<Option<String>, ServiceError> {
        let op = Operation::Create;
        let mut state = self.begin(op)?;

        if state.position(&request.name).is_some() {
            let message = format!("Stack [{}] already exists", request.name);
            return Err(state.reject(op, ALREADY_EXISTS, message));
        }

        let (resources, declared) = match parse_template(&request.template_body) {
            Ok(parsed) => parsed,
            Err(message) => return Err(state.reject(op, VALIDATION_ERROR, message)),
        };
        let parameters = match resolve_parameters(&request.parameters, &declared) {
            Ok(parameters) => parameters,
            Err(message) => return Err(state.reject(op, VALIDATION_ERROR, message)),
        };

        let id = state.next_id();
        let group_id = format!(
            "arn:memory:cloudformation:local:000000000000:stack/{}/{id:016x}",
            request.name
        );
        let mut summary = GroupSummary::new(&request.name, LifecycleStatus::CreateInProgress)
            .with_reason(USER_INITIATED);
        summary.group_id = Some(group_id.clone());
        summary.parameters = parameters;
        summary.creation_time = Some(Utc::now());

        state.groups.push(GroupRecord {
            summary,
            resources,
            phase: Phase::Creating {
                remaining: self.settle_polls,
            },
        });
        debug!(group = %request.name, "memory service accepted creation");

        Ok(Some(group_id))
    }

    async fn describe_groups(&self, name: Option<&str>) -> Result<Vec<GroupSummary>, ServiceError> {
        let mut state = self.begin(Operation::Describe)?;

        match name {
            Some(name) => Ok(state
                .position(name)
                .and_then(|index| state.observe(index))
                .into_iter()
                .collect()),
            None => {
                let mut summaries = Vec::new();
                // Walk backwards so removals do not shift unvisited indices
                for index in (0..state.groups.len()).rev() {
                    if let Some(summary) = state.observe(index) {
                        summaries.push(summary);
                    }
                }
                summaries.reverse();
                Ok(summaries)
            }
        }
    }

    async fn list_resources(
        &self,
        group: &str,
        logical_name: Option<&str>,
    ) -> Result<Vec<Resource>, ServiceError> {
        let op = Operation::ListResources;
        let mut state = self.begin(op)?;

        let Some(index) = state.position(group) else {
            let message = format!("Stack with id {group} does not exist");
            return Err(state.reject(op, VALIDATION_ERROR, message));
        };

        Ok(state.groups[index]
            .resources
            .iter()
            .filter(|r| logical_name.is_none_or(|wanted| r.logical_name == wanted))
            .cloned()
            .collect())
    }

    async fn delete_group(&self, name: &str) -> Result<(), ServiceError> {
        let mut state = self.begin(Operation::Delete)?;

        // Deleting an unknown group succeeds without effect, as CloudFormation does
        let Some(index) = state.position(name) else {
            return Ok(());
        };

        let settle_polls = self.settle_polls;
        let record = &mut state.groups[index];
        if matches!(record.phase, Phase::Deleting { .. }) {
            return Ok(());
        }
        record.summary.status = LifecycleStatus::DeleteInProgress;
        record.summary.status_reason = Some(USER_INITIATED.to_string());
        record.phase = Phase::Deleting {
            remaining: settle_polls,
        };
        debug!(group = %name, "memory service accepted deletion");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackctl_utils::error::ErrorType;
    use stackctl_utils::test_support::SAMPLE_TEMPLATE;

    fn sample_request(name: &str) -> CreateGroupRequest {
        CreateGroupRequest::new(
            name,
            SAMPLE_TEMPLATE,
            vec![Parameter::new("KeyName", "test-key")],
        )
    }

    async fn status_of(service: &InMemoryService, name: &str) -> Option<LifecycleStatus> {
        service
            .describe_groups(Some(name))
            .await
            .unwrap()
            .into_iter()
            .next()
            .map(|g| g.status)
    }

    #[tokio::test]
    async fn test_create_settles_after_configured_polls() {
        let service = InMemoryService::new(2);
        service.create_group(&sample_request("Sample")).await.unwrap();

        assert_eq!(status_of(&service, "Sample").await, Some(LifecycleStatus::CreateInProgress));
        assert_eq!(status_of(&service, "Sample").await, Some(LifecycleStatus::CreateInProgress));
        assert_eq!(status_of(&service, "Sample").await, Some(LifecycleStatus::CreateComplete));
        assert_eq!(status_of(&service, "Sample").await, Some(LifecycleStatus::CreateComplete));
    }

    #[tokio::test]
    async fn test_in_progress_group_carries_reason_until_settled() {
        let service = InMemoryService::new(1);
        service.create_group(&sample_request("Sample")).await.unwrap();

        let creating = service.describe_groups(Some("Sample")).await.unwrap();
        assert_eq!(creating[0].status_reason.as_deref(), Some("User Initiated"));

        let created = service.describe_groups(Some("Sample")).await.unwrap();
        assert_eq!(created[0].status, LifecycleStatus::CreateComplete);
        assert_eq!(created[0].status_reason, None);
    }

    #[tokio::test]
    async fn test_parameters_are_stored_verbatim() {
        let service = InMemoryService::new(0);
        service.create_group(&sample_request("Sample")).await.unwrap();

        let groups = service.describe_groups(Some("Sample")).await.unwrap();
        assert_eq!(groups[0].parameters, vec![Parameter::new("KeyName", "test-key")]);
    }

    #[tokio::test]
    async fn test_physical_ids_appear_once_created() {
        let service = InMemoryService::new(1);
        service.create_group(&sample_request("Sample")).await.unwrap();

        let before = service.list_resources("Sample", None).await.unwrap();
        assert!(before.iter().all(|r| r.physical_id.is_none()));

        status_of(&service, "Sample").await;
        status_of(&service, "Sample").await;

        let after = service.list_resources("Sample", None).await.unwrap();
        assert_eq!(after.len(), 2);
        assert!(after.iter().all(|r| r.physical_id.is_some()));
    }

    #[tokio::test]
    async fn test_list_resources_filters_by_logical_name() {
        let service = InMemoryService::new(0);
        service.create_group(&sample_request("Sample")).await.unwrap();

        let found = service
            .list_resources("Sample", Some("SampleNotificationTopic"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].resource_type, "AWS::SNS::Topic");

        let none = service.list_resources("Sample", Some("Missing")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_template_is_rejected() {
        let service = InMemoryService::new(0);
        let request = CreateGroupRequest::new("Broken", "{ not json", Vec::new());

        let err = service.create_group(&request).await.unwrap_err();
        match err {
            ServiceError::Rejected {
                error_code,
                error_type,
                status_code,
                request_id,
                ..
            } => {
                assert_eq!(error_code, "ValidationError");
                assert_eq!(error_type, ErrorType::Client);
                assert_eq!(status_code, 400);
                assert!(request_id.is_some());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(service.describe_groups(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_template_without_resources_is_rejected() {
        let service = InMemoryService::new(0);
        let request = CreateGroupRequest::new("Empty", r#"{"Resources": {}}"#, Vec::new());
        assert!(service.create_group(&request).await.unwrap_err().is_rejection());
    }

    #[tokio::test]
    async fn test_undeclared_and_missing_parameters_are_rejected() {
        let service = InMemoryService::new(0);

        let extra = CreateGroupRequest::new(
            "Extra",
            SAMPLE_TEMPLATE,
            vec![
                Parameter::new("KeyName", "k"),
                Parameter::new("Unknown", "x"),
            ],
        );
        let err = service.create_group(&extra).await.unwrap_err();
        assert!(err.to_string().contains("Unknown"));

        let missing = CreateGroupRequest::new("Missing", SAMPLE_TEMPLATE, Vec::new());
        let err = service.create_group(&missing).await.unwrap_err();
        assert!(err.to_string().contains("must have values"));
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let service = InMemoryService::new(0);
        service.create_group(&sample_request("Sample")).await.unwrap();

        let err = service.create_group(&sample_request("Sample")).await.unwrap_err();
        match err {
            ServiceError::Rejected { error_code, .. } => {
                assert_eq!(error_code, "AlreadyExistsException");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_runs_through_in_progress_then_disappears() {
        let service = InMemoryService::new(1);
        service.create_group(&sample_request("Sample")).await.unwrap();
        service.delete_group("Sample").await.unwrap();

        assert_eq!(status_of(&service, "Sample").await, Some(LifecycleStatus::DeleteInProgress));
        assert_eq!(status_of(&service, "Sample").await, None);
        assert!(service.describe_groups(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_group_resources_are_rejected() {
        let service = InMemoryService::new(0);
        let err = service.list_resources("Nope", None).await.unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        service.delete_group("Nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_scripted_sequence_repeats_last_entry() {
        let service = InMemoryService::new(0);
        service.script_statuses(
            "Scripted",
            vec![
                ScriptedObservation::status(LifecycleStatus::CreateInProgress),
                ScriptedObservation::Present(
                    LifecycleStatus::CreateFailed,
                    Some("quota exceeded".to_string()),
                ),
            ],
        );

        assert_eq!(status_of(&service, "Scripted").await, Some(LifecycleStatus::CreateInProgress));
        let failed = service.describe_groups(Some("Scripted")).await.unwrap();
        assert_eq!(failed[0].status, LifecycleStatus::CreateFailed);
        assert_eq!(failed[0].status_reason.as_deref(), Some("quota exceeded"));
        assert_eq!(status_of(&service, "Scripted").await, Some(LifecycleStatus::CreateFailed));
    }

    #[tokio::test]
    async fn test_injected_failure_is_returned_once() {
        let service = InMemoryService::new(0);
        service.fail_next(
            Operation::Describe,
            ServiceError::communication("DescribeStacks", "connection reset"),
        );

        assert!(service.describe_groups(None).await.is_err());
        assert!(service.describe_groups(None).await.is_ok());
        assert_eq!(service.calls(Operation::Describe), 2);
    }

    #[tokio::test]
    async fn test_repeated_listing_of_settled_groups_is_stable() {
        let service = InMemoryService::new(0);
        let mut summary = GroupSummary::new("Seeded", LifecycleStatus::CreateComplete);
        summary.parameters = vec![Parameter::new("KeyName", "gluck")];
        service.seed_group(ResourceGroup {
            summary,
            resources: vec![Resource::new(
                "AWS::SNS::Topic",
                "SampleNotificationTopic",
                Some("arn:aws:sns:us-east-1:123456789012:topic".to_string()),
            )],
        });

        let first = service.describe_groups(None).await.unwrap();
        let second = service.describe_groups(None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            service.list_resources("Seeded", None).await.unwrap(),
            service.list_resources("Seeded", None).await.unwrap()
        );
    }
}
