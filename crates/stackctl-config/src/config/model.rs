use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use stackctl_utils::types::{ConfigSource, Parameter};

/// Default polling interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 30;

/// Default wait timeout in seconds (one hour). `0` disables the timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

/// Default number of consecutive absent observations before a group counts as gone
pub const DEFAULT_ABSENT_CONFIRMATIONS: u32 = 1;

/// Default backend
pub const DEFAULT_BACKEND: &str = "cloudformation";

/// Polls the in-memory backend spends in each `*_IN_PROGRESS` status
pub const DEFAULT_MEMORY_SETTLE_POLLS: u32 = 2;

/// Backends understood by the service factory
pub const SUPPORTED_BACKENDS: &[&str] = &["cloudformation", "memory"];

/// Statuses that end a wait unless `[wait] terminal_statuses` says otherwise
pub const DEFAULT_TERMINAL_STATUSES: &[&str] = &[
    "CREATE_COMPLETE",
    "CREATE_FAILED",
    "ROLLBACK_FAILED",
    "DELETE_FAILED",
];

/// Configuration for stackctl operations.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > environment > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behavior that searches for
/// `.stackctl/config.toml` upward from the current directory. Use
/// [`Config::builder()`] for deterministic programmatic configuration.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// verbose = false
///
/// [group]
/// name = "TerracottaCloudFormationSampleStack"
/// template = "templates/TerracottaServerArray.template"
/// logical_resource = "SampleNotificationTopic"
/// parameters = [{ key = "KeyName", value = "gluck" }]
///
/// [wait]
/// interval_secs = 30
/// timeout_secs = 3600
///
/// [service]
/// backend = "cloudformation"
/// region = "us-east-1"
/// profile = "default"
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// General settings.
    pub defaults: Defaults,
    /// The group this run drives.
    pub group: GroupConfig,
    /// Polling behaviour for waits.
    pub wait: WaitConfig,
    /// Backend selection and connection settings.
    pub service: ServiceConfig,
    /// Source attribution for each setting (for `stackctl config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// General settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    pub verbose: Option<bool>,
}

/// Group identity and creation inputs
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroupConfig {
    pub name: Option<String>,
    /// Path to the template document, relative to the working directory
    pub template: Option<PathBuf>,
    /// Logical resource looked up after creation
    pub logical_resource: Option<String>,
    /// Creation parameters, in submission order
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Wait loop settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WaitConfig {
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub absent_confirmations: Option<u32>,
    pub terminal_statuses: Option<Vec<String>>,
}

/// Service backend settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub backend: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    /// Endpoint override, e.g. a local emulator
    pub endpoint_url: Option<String>,
    pub memory_settle_polls: Option<u32>,
}
