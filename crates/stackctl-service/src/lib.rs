//! Orchestration service abstraction for stackctl
//!
//! Every backend implements [`OrchestrationService`], so the lifecycle driver
//! can create, observe, inspect and delete resource groups without knowing
//! whether it is talking to AWS CloudFormation or to the in-process simulation.

mod cloudformation;
mod memory;

pub use cloudformation::CloudFormationService;
pub use memory::{InMemoryService, Operation, ScriptedObservation};

use async_trait::async_trait;
use stackctl_config::Config;
use stackctl_utils::error::{ConfigError, ServiceError, StackError};
use stackctl_utils::types::{CreateGroupRequest, GroupSummary, Resource};

/// Capability the lifecycle driver needs from an orchestration service.
///
/// Calls are issued one at a time and never retried; a failure is reported
/// as [`ServiceError::Rejected`] when the service answered with an error and
/// as [`ServiceError::Communication`] when no answer was obtained.
#[async_trait]
pub trait OrchestrationService: Send + Sync {
    /// Short backend name, used in logs.
    fn name(&self) -> &'static str;

    /// Submit a creation request; returns the service-assigned group id if any.
    async fn create_group(&self, request: &CreateGroupRequest)
    -> Result<Option<String>, ServiceError>;

    /// Describe one group by name, or every visible group when `name` is `None`.
    ///
    /// A named query for a group that does not exist yields an empty list.
    async fn describe_groups(&self, name: Option<&str>) -> Result<Vec<GroupSummary>, ServiceError>;

    /// Member resources of `group`, optionally filtered to one logical name.
    async fn list_resources(
        &self,
        group: &str,
        logical_name: Option<&str>,
    ) -> Result<Vec<Resource>, ServiceError>;

    /// Request deletion of `name`. Does not wait.
    async fn delete_group(&self, name: &str) -> Result<(), ServiceError>;
}

/// Create a service backend from configuration.
///
/// # Errors
///
/// Returns `StackError::Config` if the configured backend is unknown.
pub async fn from_config(config: &Config) -> Result<Box<dyn OrchestrationService>, StackError> {
    match config.backend() {
        "cloudformation" => {
            let service = CloudFormationService::from_config(config).await;
            Ok(Box::new(service))
        }
        "memory" => Ok(Box::new(InMemoryService::new(config.memory_settle_polls()))),
        unknown => Err(StackError::Config(ConfigError::InvalidValue {
            key: "backend".to_string(),
            value: format!("unknown backend '{unknown}'. Supported backends: cloudformation, memory"),
        })),
    }
}
