use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use super::{
    BACKEND_ENV_VAR, CliArgs, Config, ConfigSource, Defaults, GroupConfig, ServiceConfig,
    WaitConfig,
};

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    defaults: Option<Defaults>,
    group: Option<GroupConfig>,
    wait: Option<WaitConfig>,
    service: Option<ServiceConfig>,
}

/// Keys whose built-in default is recorded in the attribution map up front.
const DEFAULTED_KEYS: &[&str] = &[
    "verbose",
    "interval_secs",
    "timeout_secs",
    "absent_confirmations",
    "terminal_statuses",
    "backend",
    "memory_settle_polls",
];

/// Overwrite `$target` with `$value` when it is set, recording `$source` under `$key`.
macro_rules! apply {
    ($attr:expr, $target:expr, $value:expr, $key:literal, $source:expr) => {
        if let Some(value) = $value {
            $target = Some(value);
            $attr.insert($key.to_string(), $source);
        }
    };
}

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses current working directory for config file discovery when no explicit
    /// path is provided in cli_args.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut source_attribution = HashMap::new();
        for key in DEFAULTED_KEYS {
            source_attribution.insert((*key).to_string(), ConfigSource::Default);
        }

        let mut defaults = Defaults::default();
        let mut group = GroupConfig::default();
        let mut wait = WaitConfig::default();
        let mut service = ServiceConfig::default();

        let config_path = match &cli_args.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config file");

            let src = ConfigSource::Config;
            let attr = &mut source_attribution;

            if let Some(file_defaults) = file_config.defaults {
                apply!(attr, defaults.verbose, file_defaults.verbose, "verbose", src);
            }

            if let Some(file_group) = file_config.group {
                apply!(attr, group.name, file_group.name, "group_name", src);
                apply!(attr, group.template, file_group.template, "template", src);
                apply!(
                    attr,
                    group.logical_resource,
                    file_group.logical_resource,
                    "logical_resource",
                    src
                );
                if !file_group.parameters.is_empty() {
                    group.parameters = file_group.parameters;
                    attr.insert("parameters".to_string(), src);
                }
            }

            if let Some(file_wait) = file_config.wait {
                apply!(attr, wait.interval_secs, file_wait.interval_secs, "interval_secs", src);
                apply!(attr, wait.timeout_secs, file_wait.timeout_secs, "timeout_secs", src);
                apply!(
                    attr,
                    wait.absent_confirmations,
                    file_wait.absent_confirmations,
                    "absent_confirmations",
                    src
                );
                apply!(
                    attr,
                    wait.terminal_statuses,
                    file_wait.terminal_statuses,
                    "terminal_statuses",
                    src
                );
            }

            if let Some(file_service) = file_config.service {
                apply!(attr, service.backend, file_service.backend, "backend", src);
                apply!(attr, service.region, file_service.region, "region", src);
                apply!(attr, service.profile, file_service.profile, "profile", src);
                apply!(
                    attr,
                    service.endpoint_url,
                    file_service.endpoint_url,
                    "endpoint_url",
                    src
                );
                apply!(
                    attr,
                    service.memory_settle_polls,
                    file_service.memory_settle_polls,
                    "memory_settle_polls",
                    src
                );
            }
        }

        // Environment overrides the file
        if let Ok(env_backend) = env::var(BACKEND_ENV_VAR)
            && !env_backend.is_empty()
        {
            service.backend = Some(env_backend);
            source_attribution.insert("backend".to_string(), ConfigSource::Env);
        }

        // CLI overrides everything
        let cli = ConfigSource::Cli;
        let attr = &mut source_attribution;
        apply!(attr, defaults.verbose, cli_args.verbose, "verbose", cli);
        apply!(attr, group.name, cli_args.group_name.clone(), "group_name", cli);
        apply!(attr, group.template, cli_args.template.clone(), "template", cli);
        apply!(
            attr,
            group.logical_resource,
            cli_args.logical_resource.clone(),
            "logical_resource",
            cli
        );
        if !cli_args.parameters.is_empty() {
            group.parameters = cli_args.parameters.clone();
            attr.insert("parameters".to_string(), cli);
        }
        apply!(attr, service.backend, cli_args.backend.clone(), "backend", cli);
        apply!(attr, service.region, cli_args.region.clone(), "region", cli);
        apply!(attr, service.profile, cli_args.profile.clone(), "profile", cli);
        apply!(
            attr,
            service.endpoint_url,
            cli_args.endpoint_url.clone(),
            "endpoint_url",
            cli
        );
        apply!(attr, wait.interval_secs, cli_args.interval_secs, "interval_secs", cli);
        apply!(attr, wait.timeout_secs, cli_args.timeout_secs, "timeout_secs", cli);

        let config = Self {
            defaults,
            group,
            wait,
            service,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.stackctl/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(".stackctl").join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).with_context(|| {
                    format!("Failed to parse TOML config file: {}", path.display())
                })?;
                Ok(config)
            }
            // An explicit path that does not exist behaves like an empty file
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}
