//! Configuration management for stackctl
//!
//! This module provides hierarchical configuration with discovery and precedence:
//! CLI > env > file > defaults. Supports TOML configuration files with
//! `[defaults]`, `[group]`, `[wait]`, and `[service]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
pub use stackctl_utils::types::ConfigSource;

use std::path::Path;
use std::time::Duration;

use stackctl_utils::types::{LifecycleStatus, Parameter};

/// Environment variable that overrides the configured backend.
pub const BACKEND_ENV_VAR: &str = "STACKCTL_BACKEND";

impl Config {
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }

    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        self.group.name.as_deref()
    }

    #[must_use]
    pub fn template_path(&self) -> Option<&Path> {
        self.group.template.as_deref()
    }

    #[must_use]
    pub fn logical_resource(&self) -> Option<&str> {
        self.group.logical_resource.as_deref()
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.group.parameters
    }

    /// Time slept between two polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.wait.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS))
    }

    /// Upper bound on a single wait; `None` when `timeout_secs = 0`.
    #[must_use]
    pub fn wait_timeout(&self) -> Option<Duration> {
        match self.wait.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    #[must_use]
    pub fn absent_confirmations(&self) -> u32 {
        self.wait
            .absent_confirmations
            .unwrap_or(DEFAULT_ABSENT_CONFIRMATIONS)
    }

    /// Statuses that end a wait, in configured order.
    ///
    /// Entries are checked by [`Config::validate`]; anything unrecognised
    /// here has already been rejected.
    #[must_use]
    pub fn terminal_statuses(&self) -> Vec<LifecycleStatus> {
        match &self.wait.terminal_statuses {
            Some(list) => list
                .iter()
                .map(|s| LifecycleStatus::from_service(s.trim()))
                .collect(),
            None => DEFAULT_TERMINAL_STATUSES
                .iter()
                .map(|s| LifecycleStatus::from_service(s))
                .collect(),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &str {
        self.service.backend.as_deref().unwrap_or(DEFAULT_BACKEND)
    }

    #[must_use]
    pub fn memory_settle_polls(&self) -> u32 {
        self.service
            .memory_settle_polls
            .unwrap_or(DEFAULT_MEMORY_SETTLE_POLLS)
    }

    /// Where a setting came from, `Default` when nothing recorded it.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .copied()
            .unwrap_or(ConfigSource::Default)
    }

    /// Effective settings as `(key, value, source)` rows, for `stackctl config`.
    ///
    /// Unset optional values are reported as an empty string.
    #[must_use]
    pub fn effective_settings(&self) -> Vec<(String, String, ConfigSource)> {
        let opt = |v: Option<&str>| v.unwrap_or_default().to_string();
        let params = self
            .parameters()
            .iter()
            .map(|p| format!("{}={}", p.key, p.value))
            .collect::<Vec<_>>()
            .join(",");
        let terminal = self
            .terminal_statuses()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let rows = [
            ("verbose", self.verbose().to_string()),
            ("group_name", opt(self.group_name())),
            (
                "template",
                self.template_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            ("logical_resource", opt(self.logical_resource())),
            ("parameters", params),
            ("interval_secs", self.poll_interval().as_secs().to_string()),
            (
                "timeout_secs",
                self.wait_timeout().map_or(0, |t| t.as_secs()).to_string(),
            ),
            (
                "absent_confirmations",
                self.absent_confirmations().to_string(),
            ),
            ("terminal_statuses", terminal),
            ("backend", self.backend().to_string()),
            ("region", opt(self.service.region.as_deref())),
            ("profile", opt(self.service.profile.as_deref())),
            ("endpoint_url", opt(self.service.endpoint_url.as_deref())),
            (
                "memory_settle_polls",
                self.memory_settle_polls().to_string(),
            ),
        ];

        rows.into_iter()
            .map(|(key, value)| (key.to_string(), value, self.source_of(key)))
            .collect()
    }

    /// Minimal in-memory configuration for tests: memory backend, zero interval.
    #[cfg(any(test, feature = "test-utils"))]
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Self {
            defaults: Defaults::default(),
            group: GroupConfig {
                name: Some("TestGroup".to_string()),
                ..GroupConfig::default()
            },
            wait: WaitConfig {
                interval_secs: Some(0),
                ..WaitConfig::default()
            },
            service: ServiceConfig {
                backend: Some("memory".to_string()),
                ..ServiceConfig::default()
            },
            source_attribution: std::collections::HashMap::new(),
        }
    }
}
