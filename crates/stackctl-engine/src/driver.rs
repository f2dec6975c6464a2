//! Lifecycle driver: one resource group from submission to deletion.
//!
//! The driver owns everything a run needs (group name, poll policy, the
//! service client, a cancellation token) and tracks where the group is in its
//! lifecycle:
//!
//! | From                 | Operation                 | To           |
//! |----------------------|---------------------------|--------------|
//! | Unsubmitted          | submit                    | Provisioning |
//! | Provisioning         | await → `CREATE_COMPLETE` | Ready        |
//! | Provisioning         | await → `NO_SUCH_GROUP`   | Deleted      |
//! | Provisioning         | await → other terminal    | Failed       |
//! | Ready, Failed        | teardown                  | Deleting     |
//! | Deleting             | await → `NO_SUCH_GROUP`   | Deleted      |
//! | Deleting             | await → other terminal    | Failed       |
//!
//! Await may also re-observe a Ready, Failed or Deleted group, using the
//! Provisioning rules. Anything else is rejected with
//! `StackError::InvalidTransition` before a request is sent.

use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};

use stackctl_config::Config;
use stackctl_service::OrchestrationService;
use stackctl_utils::error::{ConfigError, StackError};
use stackctl_utils::logging::lifecycle_span;
use stackctl_utils::types::{
    CreateGroupRequest, LifecycleStatus, Parameter, Resource, ResourceGroup,
};

use crate::cancel::CancelToken;
use crate::policy::PollPolicy;
use crate::progress::WaitObserver;
use crate::wait::{WaitOutcome, await_terminal};

/// Where the driven group is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unsubmitted,
    Provisioning,
    Ready,
    Deleting,
    Deleted,
    Failed,
}

impl LifecycleState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsubmitted => "unsubmitted",
            Self::Provisioning => "provisioning",
            Self::Ready => "ready",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
            Self::Failed => "failed",
        }
    }

    /// State implied by a status observed on an existing group.
    #[must_use]
    pub fn from_observed(status: &LifecycleStatus) -> Self {
        match status {
            LifecycleStatus::NoSuchGroup => Self::Deleted,
            LifecycleStatus::DeleteInProgress => Self::Deleting,
            s if s.is_in_progress() => Self::Provisioning,
            s if s.is_failure() => Self::Failed,
            _ => Self::Ready,
        }
    }

    /// State after an await that started in `self` settled on `status`.
    fn after_wait(self, status: &LifecycleStatus) -> Self {
        let deleted = matches!(status, LifecycleStatus::NoSuchGroup);
        match self {
            Self::Deleting if deleted => Self::Deleted,
            Self::Deleting => Self::Failed,
            _ if deleted => Self::Deleted,
            _ if matches!(status, LifecycleStatus::CreateComplete) => Self::Ready,
            _ => Self::Failed,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every group visible to the service, each with its member resources.
///
/// Read only; the groups come back in the order the service lists them.
///
/// # Errors
///
/// The first service error from either listing call.
pub async fn list_groups(
    service: &dyn OrchestrationService,
) -> Result<Vec<ResourceGroup>, StackError> {
    async {
        let summaries = service.describe_groups(None).await?;
        let mut groups = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let resources = service.list_resources(&summary.name, None).await?;
            groups.push(ResourceGroup { summary, resources });
        }
        Ok::<_, StackError>(groups)
    }
    .instrument(info_span!("list_groups", backend = service.name()))
    .await
}

/// Drives one group through submit, await, inspect and teardown.
pub struct LifecycleDriver {
    service: Arc<dyn OrchestrationService>,
    group: String,
    logical_resource: Option<String>,
    policy: PollPolicy,
    cancel: CancelToken,
    state: LifecycleState,
}

impl fmt::Debug for LifecycleDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleDriver")
            .field("service", &self.service.name())
            .field("group", &self.group)
            .field("logical_resource", &self.logical_resource)
            .field("policy", &self.policy)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl LifecycleDriver {
    #[must_use]
    pub fn new(
        service: Arc<dyn OrchestrationService>,
        group: impl Into<String>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            service,
            group: group.into(),
            logical_resource: None,
            policy,
            cancel: CancelToken::never(),
            state: LifecycleState::Unsubmitted,
        }
    }

    /// Build a driver for the configured group.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRequired` when no group name is configured.
    pub fn from_config(
        config: &Config,
        service: Arc<dyn OrchestrationService>,
    ) -> Result<Self, StackError> {
        let group = config.group_name().ok_or_else(|| {
            ConfigError::MissingRequired("group name (--group or [group] name)".to_string())
        })?;
        let mut driver = Self::new(service, group, PollPolicy::from_config(config));
        driver.logical_resource = config.logical_resource().map(ToString::to_string);
        Ok(driver)
    }

    #[must_use]
    pub fn with_logical_resource(mut self, name: impl Into<String>) -> Self {
        self.logical_resource = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    fn reject(&self, operation: &str) -> StackError {
        StackError::InvalidTransition {
            from: self.state.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Adopt a group that already exists, deriving the state from one describe.
    ///
    /// Only valid before anything has been submitted through this driver.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the driver has already submitted; service errors
    /// from the describe call.
    pub async fn attach(&mut self) -> Result<LifecycleState, StackError> {
        if self.state != LifecycleState::Unsubmitted {
            return Err(self.reject("attach to"));
        }
        let span = lifecycle_span(&self.group, "attach");
        let status = async {
            let found = self
                .service
                .describe_groups(Some(&self.group))
                .await?
                .into_iter()
                .find(|g| g.name == self.group);
            Ok::<_, StackError>(found.map_or(LifecycleStatus::NoSuchGroup, |g| g.status))
        }
        .instrument(span)
        .await?;

        self.state = LifecycleState::from_observed(&status);
        info!(group = %self.group, %status, state = %self.state, "attached to group");
        Ok(self.state)
    }

    /// Send the creation request. Does not wait.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the driver is Unsubmitted; the service's
    /// rejection or communication error otherwise. The state is unchanged on
    /// error.
    pub async fn submit(
        &mut self,
        template_body: &str,
        parameters: &[Parameter],
    ) -> Result<Option<String>, StackError> {
        if self.state != LifecycleState::Unsubmitted {
            return Err(self.reject("submit"));
        }

        let request = CreateGroupRequest::new(&self.group, template_body, parameters.to_vec());
        let group_id = self
            .service
            .create_group(&request)
            .instrument(lifecycle_span(&self.group, "submit"))
            .await?;

        self.state = LifecycleState::Provisioning;
        info!(
            group = %self.group,
            group_id = group_id.as_deref().unwrap_or(""),
            parameters = parameters.len(),
            "creation requested"
        );
        Ok(group_id)
    }

    /// Poll until the group reaches a terminal state and update the lifecycle
    /// state from the result.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when nothing was submitted; otherwise the wait
    /// errors (timeout, cancellation, service failure), all of which leave the
    /// state unchanged.
    pub async fn await_terminal(
        &mut self,
        observer: &mut dyn WaitObserver,
    ) -> Result<WaitOutcome, StackError> {
        if self.state == LifecycleState::Unsubmitted {
            return Err(self.reject("await"));
        }

        let outcome = await_terminal(
            self.service.as_ref(),
            &self.group,
            &self.policy,
            &self.cancel,
            observer,
        )
        .instrument(lifecycle_span(&self.group, "await"))
        .await?;

        let previous = self.state;
        self.state = previous.after_wait(&outcome.status);
        info!(
            group = %self.group,
            status = %outcome.status,
            from = %previous,
            to = %self.state,
            "group settled"
        );
        Ok(outcome)
    }

    /// Every visible group with its member resources, in service order.
    ///
    /// # Errors
    ///
    /// Service errors from either listing call.
    pub async fn list_all(&self) -> Result<Vec<ResourceGroup>, StackError> {
        list_groups(self.service.as_ref()).await
    }

    /// Resources of the driven group whose logical name is `logical_name`.
    ///
    /// # Errors
    ///
    /// The service's rejection when the group does not exist.
    pub async fn resolve(&self, logical_name: &str) -> Result<Vec<Resource>, StackError> {
        let resources = self
            .service
            .list_resources(&self.group, Some(logical_name))
            .instrument(lifecycle_span(&self.group, "resolve"))
            .await?;
        Ok(resources)
    }

    /// Resolve the configured logical resource.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingRequired` when none is configured.
    pub async fn resolve_configured(&self) -> Result<(String, Vec<Resource>), StackError> {
        let logical = self.logical_resource.clone().ok_or_else(|| {
            ConfigError::MissingRequired(
                "logical resource (--logical-resource or [group] logical_resource)".to_string(),
            )
        })?;
        let resources = self.resolve(&logical).await?;
        Ok((logical, resources))
    }

    /// Send the deletion request. Does not wait.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the group is Ready or Failed.
    pub async fn teardown(&mut self) -> Result<(), StackError> {
        if !matches!(self.state, LifecycleState::Ready | LifecycleState::Failed) {
            return Err(self.reject("delete"));
        }

        self.service
            .delete_group(&self.group)
            .instrument(lifecycle_span(&self.group, "teardown"))
            .await?;

        self.state = LifecycleState::Deleting;
        info!(group = %self.group, "deletion requested");
        Ok(())
    }
}
