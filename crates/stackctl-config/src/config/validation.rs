use stackctl_utils::error::{ConfigError, StackError};
use stackctl_utils::group_name::validate_group_name;
use stackctl_utils::types::LifecycleStatus;

use super::{Config, DEFAULT_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS, SUPPORTED_BACKENDS};

/// Longest allowed poll interval (one hour)
const MAX_INTERVAL_SECS: u64 = 3600;

fn invalid(key: &str, value: impl Into<String>) -> StackError {
    StackError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    })
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), StackError> {
        if let Some(name) = &self.group.name {
            validate_group_name(name)?;
        }

        if let Some(logical) = &self.group.logical_resource
            && logical.trim().is_empty()
        {
            return Err(invalid("logical_resource", "must not be empty"));
        }

        if let Some(param) = self.group.parameters.iter().find(|p| p.key.trim().is_empty()) {
            return Err(invalid(
                "parameters",
                format!("parameter with value '{}' has an empty key", param.value),
            ));
        }

        let interval = self.wait.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS);
        if interval > MAX_INTERVAL_SECS {
            return Err(invalid(
                "interval_secs",
                format!("exceeds maximum limit of {MAX_INTERVAL_SECS} seconds (1 hour)"),
            ));
        }

        let timeout = self.wait.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout != 0 && timeout < interval {
            return Err(invalid(
                "timeout_secs",
                format!("must be 0 (unbounded) or at least interval_secs ({interval})"),
            ));
        }

        if self.wait.absent_confirmations == Some(0) {
            return Err(invalid("absent_confirmations", "must be greater than 0"));
        }

        if let Some(statuses) = &self.wait.terminal_statuses {
            if statuses.is_empty() {
                return Err(invalid("terminal_statuses", "must list at least one status"));
            }
            for raw in statuses {
                if let LifecycleStatus::Other(unknown) = LifecycleStatus::from_service(raw.trim()) {
                    return Err(invalid(
                        "terminal_statuses",
                        format!("unknown status '{unknown}'"),
                    ));
                }
            }
        }

        let backend = self.backend();
        if !SUPPORTED_BACKENDS.contains(&backend) {
            return Err(invalid(
                "backend",
                format!(
                    "unknown backend '{backend}' (expected one of: {})",
                    SUPPORTED_BACKENDS.join(", ")
                ),
            ));
        }

        if let Some(url) = &self.service.endpoint_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(invalid(
                "endpoint_url",
                format!("'{url}' must start with http:// or https://"),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackctl_utils::types::Parameter;

    fn key_of(err: StackError) -> String {
        match err {
            StackError::Config(ConfigError::InvalidValue { key, .. }) => key,
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::builder().build().unwrap();
    }

    #[test]
    fn test_bad_group_name_is_rejected() {
        let err = Config::builder().group_name("1-starts-with-digit").build().unwrap_err();
        assert_eq!(key_of(err), "group_name");
    }

    #[test]
    fn test_interval_upper_bound() {
        let err = Config::builder().interval_secs(3601).build().unwrap_err();
        assert_eq!(key_of(err), "interval_secs");
        Config::builder().interval_secs(3600).build().unwrap();
        Config::builder().interval_secs(0).build().unwrap();
    }

    #[test]
    fn test_timeout_shorter_than_interval_is_rejected() {
        let err = Config::builder()
            .interval_secs(60)
            .timeout_secs(30)
            .build()
            .unwrap_err();
        assert_eq!(key_of(err), "timeout_secs");

        Config::builder()
            .interval_secs(60)
            .timeout_secs(0)
            .build()
            .unwrap();
    }

    #[test]
    fn test_zero_absent_confirmations_is_rejected() {
        let err = Config::builder().absent_confirmations(0).build().unwrap_err();
        assert_eq!(key_of(err), "absent_confirmations");
    }

    #[test]
    fn test_terminal_statuses_must_be_known() {
        let err = Config::builder()
            .terminal_statuses(["CREATE_COMPLETE", "ALMOST_DONE"])
            .build()
            .unwrap_err();
        assert_eq!(key_of(err), "terminal_statuses");

        let config = Config::builder()
            .terminal_statuses(["CREATE_COMPLETE", "ROLLBACK_COMPLETE"])
            .build()
            .unwrap();
        assert!(
            config
                .terminal_statuses()
                .contains(&LifecycleStatus::RollbackComplete)
        );
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let err = Config::builder().backend("azure").build().unwrap_err();
        assert_eq!(key_of(err), "backend");
    }

    #[test]
    fn test_endpoint_url_needs_scheme() {
        let err = Config::builder()
            .endpoint_url("localhost:4566")
            .build()
            .unwrap_err();
        assert_eq!(key_of(err), "endpoint_url");
    }

    #[test]
    fn test_empty_parameter_key_is_rejected() {
        let err = Config::builder()
            .parameter(Parameter::new("", "orphan"))
            .build()
            .unwrap_err();
        assert_eq!(key_of(err), "parameters");
    }
}
