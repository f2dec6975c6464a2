use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::LifecycleStatus;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `StackError` is the primary error type returned by stackctl library operations.
/// It provides:
/// - Detailed error information for programmatic handling
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes for consistent error reporting
///
/// # Exit Code Mapping
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration/CLI argument errors, invalid transitions |
/// | 10 | Wait timed out |
/// | 70 | Service unreachable |
/// | 71 | Service rejected the request |
/// | 130 | Cancelled |
/// | 1 | Other errors |
///
/// Library code returns `StackError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("Cannot {operation} group while it is {from}")]
    InvalidTransition { from: String, operation: String },

    #[error("Timed out after {timeout_secs}s waiting for group {group} (last status {last_status})")]
    WaitTimedOut {
        group: String,
        timeout_secs: u64,
        last_status: String,
    },

    #[error("Wait for group {group} was cancelled")]
    Cancelled { group: String },

    #[error("Failed to read template {path}: {reason}")]
    Template { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether a rejected request was the caller's fault or the service's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Client,
    Server,
    Unknown,
}

impl ErrorType {
    /// Classify by HTTP status code.
    #[must_use]
    pub fn from_status(status_code: u16) -> Self {
        match status_code {
            400..=499 => Self::Client,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "Client"),
            Self::Server => write!(f, "Server"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Errors at the orchestration service boundary.
///
/// Neither variant is retried anywhere in stackctl.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request reached the service and was declined.
    #[error("{operation} rejected by service: {message} (status {status_code}, code {error_code})")]
    Rejected {
        operation: String,
        message: String,
        status_code: u16,
        error_code: String,
        error_type: ErrorType,
        request_id: Option<String>,
    },

    /// The request never reliably reached or returned from the service.
    #[error("Client communication error during {operation}: {message}")]
    Communication { operation: String, message: String },
}

impl ServiceError {
    /// Build a rejection, classifying the error type from the status code.
    #[must_use]
    pub fn rejected(
        operation: impl Into<String>,
        message: impl Into<String>,
        status_code: u16,
        error_code: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Self::Rejected {
            operation: operation.into(),
            message: message.into(),
            status_code,
            error_code: error_code.into(),
            error_type: ErrorType::from_status(status_code),
            request_id,
        }
    }

    #[must_use]
    pub fn communication(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Communication {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Name of the service operation that failed.
    #[must_use]
    pub fn operation(&self) -> &str {
        match self {
            Self::Rejected { operation, .. } | Self::Communication { operation, .. } => operation,
        }
    }

    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Service,
    Network,
    Lifecycle,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Service => write!(f, "Service"),
            Self::Network => write!(f, "Network"),
            Self::Lifecycle => write!(f, "Lifecycle"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(reason) => {
                format!("Configuration file has invalid format: {reason}")
            }
            Self::MissingRequired(key) => {
                format!("Required configuration '{key}' is missing")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => {
                format!("Configuration file not found: {path}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => Some(
                "Configuration files must be valid TOML with [group], [wait] and [service] sections."
                    .to_string(),
            ),
            Self::MissingRequired(_) => Some(
                "Every run needs a group name, and creating a group also needs a template."
                    .to_string(),
            ),
            Self::InvalidValue { key, .. } => Some(format!(
                "The '{key}' configuration option has specific format requirements."
            )),
            Self::NotFound { .. } => Some(
                "stackctl searches for .stackctl/config.toml starting from the current directory upward."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .stackctl/config.toml".to_string(),
                "Run 'stackctl config' to see which values were loaded".to_string(),
            ],
            Self::MissingRequired(key) => vec![
                format!("Set '{key}' in .stackctl/config.toml or pass it on the command line"),
            ],
            Self::InvalidValue { key, .. } => match key.as_str() {
                "group_name" => vec![
                    "Group names start with a letter and contain only letters, digits and '-'"
                        .to_string(),
                    "Group names are at most 128 characters long".to_string(),
                ],
                "backend" => vec!["Use 'cloudformation' or 'memory'".to_string()],
                "terminal_statuses" => vec![
                    "Use service status names such as CREATE_COMPLETE or DELETE_FAILED".to_string(),
                ],
                _ => vec![
                    "Check the documentation for valid values for this option".to_string(),
                    "Remove the option to use the default value".to_string(),
                ],
            },
            Self::NotFound { .. } => vec![
                "Create .stackctl/config.toml in your project root".to_string(),
                "Use --config <path> to point at an existing file".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

impl UserFriendlyError for ServiceError {
    fn user_message(&self) -> String {
        match self {
            Self::Rejected {
                operation, message, ..
            } => format!("The orchestration service rejected {operation}: {message}"),
            Self::Communication { operation, message } => {
                format!("Could not communicate with the orchestration service during {operation}: {message}")
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Rejected {
                status_code,
                error_code,
                error_type,
                request_id,
                ..
            } => Some(format!(
                "The request reached the service but was declined.\n  Status code: {status_code}\n  Error code:  {error_code}\n  Error type:  {error_type}\n  Request ID:  {}",
                request_id.as_deref().unwrap_or("<none>")
            )),
            Self::Communication { .. } => Some(
                "The client hit a problem before a response arrived, such as no network access or unusable credentials."
                    .to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Rejected { error_code, .. } => match error_code.as_str() {
                "AlreadyExistsException" => vec![
                    "Pick a different group name or delete the existing group first".to_string(),
                ],
                "ValidationError" => vec![
                    "Check the template syntax and parameter names".to_string(),
                    "Confirm the group exists with 'stackctl list'".to_string(),
                ],
                "LimitExceededException" => {
                    vec!["Delete unused groups or request a quota increase".to_string()]
                }
                _ => vec!["Inspect the error code and request ID in the service console".to_string()],
            },
            Self::Communication { .. } => vec![
                "Check network connectivity and the configured region".to_string(),
                "Verify credentials for the selected profile".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Rejected { .. } => ErrorCategory::Service,
            Self::Communication { .. } => ErrorCategory::Network,
        }
    }
}

impl UserFriendlyError for StackError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Service(err) => err.user_message(),
            Self::InvalidTransition { from, operation } => {
                format!("Cannot {operation} a group that is {from}")
            }
            Self::WaitTimedOut {
                group,
                timeout_secs,
                last_status,
            } => format!(
                "Group {group} did not reach a terminal state within {timeout_secs}s (last status {last_status})"
            ),
            Self::Cancelled { group } => format!("Stopped waiting for group {group}"),
            Self::Template { path, reason } => format!("Could not read template {path}: {reason}"),
            Self::Io(err) => format!("I/O failure: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Service(err) => err.context(),
            Self::InvalidTransition { .. } => Some(
                "A group moves through Unsubmitted, Provisioning, Ready, Deleting and Deleted; Failed groups can only be deleted."
                    .to_string(),
            ),
            Self::WaitTimedOut { .. } => Some(
                "The group is left as it is; the service keeps working on it.".to_string(),
            ),
            Self::Cancelled { .. } => Some(
                "Cancelling a wait does not cancel the operation on the service.".to_string(),
            ),
            Self::Template { .. } => None,
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Service(err) => err.suggestions(),
            Self::InvalidTransition { .. } => {
                vec!["Run 'stackctl list' to see the group's current status".to_string()]
            }
            Self::WaitTimedOut { group, .. } => vec![
                "Increase [wait] timeout_secs or pass --timeout-secs".to_string(),
                format!("Resume with 'stackctl wait {group}'"),
            ],
            Self::Cancelled { group } => vec![format!("Resume with 'stackctl wait {group}'")],
            Self::Template { .. } => vec![
                "Check the [group] template path or --template argument".to_string(),
            ],
            Self::Io(_) => vec![],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Service(err) => err.category(),
            Self::InvalidTransition { .. }
            | Self::WaitTimedOut { .. }
            | Self::Cancelled { .. } => ErrorCategory::Lifecycle,
            Self::Template { .. } | Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl StackError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {}\n", ctx));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {}\n", suggestion));
            }
        }

        output
    }

    /// Map this error to the appropriate CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::InvalidTransition { .. } => ExitCode::CLI_ARGS,
            Self::Template { .. } => ExitCode::CLI_ARGS,
            Self::Service(ServiceError::Rejected { .. }) => ExitCode::SERVICE_REJECTED,
            Self::Service(ServiceError::Communication { .. }) => ExitCode::SERVICE_UNREACHABLE,
            Self::WaitTimedOut { .. } => ExitCode::WAIT_TIMEOUT,
            Self::Cancelled { .. } => ExitCode::CANCELLED,
            Self::Io(_) => ExitCode::INTERNAL,
        }
    }

    /// Build the timeout error from the last status a wait observed.
    #[must_use]
    pub fn wait_timed_out(
        group: impl Into<String>,
        timeout_secs: u64,
        last_status: Option<&LifecycleStatus>,
    ) -> Self {
        Self::WaitTimedOut {
            group: group.into(),
            timeout_secs,
            last_status: last_status.map_or_else(|| "unknown".to_string(), ToString::to_string),
        }
    }
}
