//! Shared domain types for stackctl
//!
//! These types describe what the orchestration service reports about resource
//! groups (stacks) and what the CLI sends it. They are backend-agnostic: the
//! CloudFormation and in-memory services both translate into them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, EnumString};

/// Lifecycle status of a resource group.
///
/// Parsing and display use the service's SCREAMING_SNAKE_CASE spelling
/// (`"CREATE_COMPLETE"`). Statuses this crate does not know about are kept
/// verbatim in [`LifecycleStatus::Other`] so nothing the service reports is lost.
///
/// [`LifecycleStatus::NoSuchGroup`] is never reported by the service; the wait
/// loop synthesizes it when a group is no longer listed.
///
/// # Example
///
/// ```rust
/// use stackctl_utils::types::LifecycleStatus;
///
/// let status: LifecycleStatus = "CREATE_COMPLETE".parse().unwrap();
/// assert_eq!(status, LifecycleStatus::CreateComplete);
/// assert_eq!(status.to_string(), "CREATE_COMPLETE");
///
/// let unknown: LifecycleStatus = "IMPORT_IN_PROGRESS".parse().unwrap();
/// assert_eq!(unknown.as_str(), "IMPORT_IN_PROGRESS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    CreateInProgress,
    CreateFailed,
    CreateComplete,
    RollbackInProgress,
    RollbackFailed,
    RollbackComplete,
    DeleteInProgress,
    DeleteFailed,
    DeleteComplete,
    UpdateInProgress,
    UpdateComplete,
    UpdateFailed,
    UpdateRollbackInProgress,
    UpdateRollbackFailed,
    UpdateRollbackComplete,
    ReviewInProgress,
    /// Synthetic status: the group is no longer listed by the service.
    NoSuchGroup,
    /// A status string this crate does not model explicitly.
    #[strum(default)]
    Other(String),
}

impl LifecycleStatus {
    /// Canonical service spelling of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateFailed => "CREATE_FAILED",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::RollbackComplete => "ROLLBACK_COMPLETE",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateComplete => "UPDATE_COMPLETE",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            Self::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            Self::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            Self::ReviewInProgress => "REVIEW_IN_PROGRESS",
            Self::NoSuchGroup => "NO_SUCH_GROUP",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Parse a status string as reported by the service.
    ///
    /// Never fails: unknown strings become [`LifecycleStatus::Other`].
    #[must_use]
    pub fn from_service(raw: &str) -> Self {
        Self::from_str(raw).unwrap_or_else(|_| Self::Other(raw.to_string()))
    }

    /// Whether the service is still working on the group.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.as_str().ends_with("_IN_PROGRESS")
    }

    /// Whether the status represents a failed operation.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        let s = self.as_str();
        s.ends_with("_FAILED") || matches!(self, Self::RollbackComplete)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LifecycleStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LifecycleStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_service(&raw))
    }
}

/// Key/value parameter passed to the service when a group is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

impl Parameter {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Parses `KEY=VALUE`. The value may itself contain `=`.
impl FromStr for Parameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok(Self::new(key.trim(), value))
            }
            _ => Err(format!("expected KEY=VALUE, got '{s}'")),
        }
    }
}

/// A member resource of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Service type tag, e.g. `AWS::SNS::Topic`
    pub resource_type: String,
    /// Template-assigned identifier
    pub logical_name: String,
    /// Service-assigned identity; absent until the resource exists
    pub physical_id: Option<String>,
}

impl Resource {
    #[must_use]
    pub fn new(
        resource_type: impl Into<String>,
        logical_name: impl Into<String>,
        physical_id: Option<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            logical_name: logical_name.into(),
            physical_id,
        }
    }
}

/// What the service reports about a group, without its resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    /// Service-assigned identifier (a stack ARN for CloudFormation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub status: LifecycleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
}

impl GroupSummary {
    #[must_use]
    pub fn new(name: impl Into<String>, status: LifecycleStatus) -> Self {
        Self {
            name: name.into(),
            group_id: None,
            status,
            status_reason: None,
            parameters: Vec::new(),
            creation_time: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.status_reason = Some(reason.into());
        self
    }
}

/// A group together with its member resources, as produced by inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    #[serde(flatten)]
    pub summary: GroupSummary,
    pub resources: Vec<Resource>,
}

/// Request to create a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupRequest {
    pub name: String,
    /// Template document, passed to the service untouched
    pub template_body: String,
    pub parameters: Vec<Parameter>,
}

impl CreateGroupRequest {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        template_body: impl Into<String>,
        parameters: Vec<Parameter>,
    ) -> Self {
        Self {
            name: name.into(),
            template_body: template_body.into(),
            parameters,
        }
    }
}

/// Source of a configuration value.
///
/// Indicates where a configuration value originated from in the precedence chain:
/// CLI arguments > environment > config file > programmatic > built-in defaults.
///
/// Serializes to lowercase strings: `"cli"`, `"env"`, `"config"`, `"programmatic"`, `"default"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value taken from an environment variable.
    Env,
    /// Value loaded from configuration file.
    Config,
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        };
        f.write_str(s)
    }
}
