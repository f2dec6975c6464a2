use std::path::PathBuf;

use stackctl_utils::types::Parameter;

/// Values taken from the command line, applied over file and env settings.
///
/// `None`/empty means "not given on the command line".
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub group_name: Option<String>,
    pub template: Option<PathBuf>,
    pub logical_resource: Option<String>,
    /// Replaces the configured parameter list when non-empty
    pub parameters: Vec<Parameter>,
    pub backend: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}
