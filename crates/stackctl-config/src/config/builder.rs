use std::collections::HashMap;
use std::path::PathBuf;

use stackctl_utils::error::StackError;
use stackctl_utils::types::Parameter;

use super::{Config, ConfigSource, Defaults, GroupConfig, ServiceConfig, WaitConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when you need to configure stackctl without relying on
    /// environment variables or config files.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stackctl_config::Config;
    ///
    /// let config = Config::builder()
    ///     .group_name("SampleStack")
    ///     .backend("memory")
    ///     .interval_secs(5)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.backend(), "memory");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration of stackctl.
///
/// All values set via the builder are attributed to
/// `ConfigSource::Programmatic`; unset values fall back to built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    verbose: Option<bool>,
    group_name: Option<String>,
    template: Option<PathBuf>,
    logical_resource: Option<String>,
    parameters: Vec<Parameter>,
    interval_secs: Option<u64>,
    timeout_secs: Option<u64>,
    absent_confirmations: Option<u32>,
    terminal_statuses: Option<Vec<String>>,
    backend: Option<String>,
    region: Option<String>,
    profile: Option<String>,
    endpoint_url: Option<String>,
    memory_settle_polls: Option<u32>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    #[must_use]
    pub fn group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template = Some(path.into());
        self
    }

    #[must_use]
    pub fn logical_resource(mut self, name: impl Into<String>) -> Self {
        self.logical_resource = Some(name.into());
        self
    }

    /// Append one creation parameter; order is preserved.
    #[must_use]
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the polling interval in seconds (0..=3600).
    #[must_use]
    pub fn interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = Some(secs);
        self
    }

    /// Set the wait timeout in seconds; `0` disables it.
    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn absent_confirmations(mut self, count: u32) -> Self {
        self.absent_confirmations = Some(count);
        self
    }

    /// Replace the terminal status set, using the service spelling.
    #[must_use]
    pub fn terminal_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terminal_statuses = Some(statuses.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    #[must_use]
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    #[must_use]
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn memory_settle_polls(mut self, polls: u32) -> Self {
        self.memory_settle_polls = Some(polls);
        self
    }

    /// Build the configuration, validating every value.
    ///
    /// # Errors
    ///
    /// Returns `StackError::Config` if any value is out of range.
    pub fn build(self) -> Result<Config, StackError> {
        let mut source_attribution = HashMap::new();
        let mut mark = |key: &str, set: bool| {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Default
            };
            source_attribution.insert(key.to_string(), source);
        };

        mark("verbose", self.verbose.is_some());
        mark("interval_secs", self.interval_secs.is_some());
        mark("timeout_secs", self.timeout_secs.is_some());
        mark("absent_confirmations", self.absent_confirmations.is_some());
        mark("terminal_statuses", self.terminal_statuses.is_some());
        mark("backend", self.backend.is_some());
        mark("memory_settle_polls", self.memory_settle_polls.is_some());
        for (key, set) in [
            ("group_name", self.group_name.is_some()),
            ("template", self.template.is_some()),
            ("logical_resource", self.logical_resource.is_some()),
            ("parameters", !self.parameters.is_empty()),
            ("region", self.region.is_some()),
            ("profile", self.profile.is_some()),
            ("endpoint_url", self.endpoint_url.is_some()),
        ] {
            if set {
                mark(key, true);
            }
        }

        let config = Config {
            defaults: Defaults {
                verbose: self.verbose,
            },
            group: GroupConfig {
                name: self.group_name,
                template: self.template,
                logical_resource: self.logical_resource,
                parameters: self.parameters,
            },
            wait: WaitConfig {
                interval_secs: self.interval_secs,
                timeout_secs: self.timeout_secs,
                absent_confirmations: self.absent_confirmations,
                terminal_statuses: self.terminal_statuses,
            },
            service: ServiceConfig {
                backend: self.backend,
                region: self.region,
                profile: self.profile,
                endpoint_url: self.endpoint_url,
                memory_settle_polls: self.memory_settle_polls,
            },
            source_attribution,
        };

        config.validate()?;
        Ok(config)
    }
}
