//! Helpers shared by tests across the stackctl crates.

use std::env;

/// A minimal template with one notification topic and one queue, in the JSON
/// form the in-memory service understands.
pub const SAMPLE_TEMPLATE: &str = r#"{
  "AWSTemplateFormatVersion": "2010-09-09",
  "Parameters": {
    "KeyName": { "Type": "String" }
  },
  "Resources": {
    "SampleNotificationTopic": { "Type": "AWS::SNS::Topic" },
    "SampleQueue": { "Type": "AWS::SQS::Queue" }
  }
}"#;

/// Check whether tests against real AWS should run.
///
/// `STACKCTL_SKIP_AWS_TESTS=1` always disables them.
/// `STACKCTL_REAL_AWS_TESTS=1` enables them.
#[must_use]
pub fn aws_tests_enabled() -> bool {
    let flag = |name: &str| {
        env::var(name)
            .ok()
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
    if flag("STACKCTL_SKIP_AWS_TESTS") {
        return false;
    }
    flag("STACKCTL_REAL_AWS_TESTS")
}

/// Sets an environment variable for the guard's lifetime and restores the
/// previous value on drop.
///
/// Tests using this must be serialized (`#[serial]`); the process environment
/// is global.
pub struct EnvVarGuard {
    name: String,
    original: Option<String>,
}

impl EnvVarGuard {
    #[must_use]
    pub fn set(name: &str, value: &str) -> Self {
        let original = env::var(name).ok();
        unsafe { env::set_var(name, value) };
        Self {
            name: name.to_string(),
            original,
        }
    }

    #[must_use]
    pub fn unset(name: &str) -> Self {
        let original = env::var(name).ok();
        unsafe { env::remove_var(name) };
        Self {
            name: name.to_string(),
            original,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(val) => unsafe { env::set_var(&self.name, val) },
            None => unsafe { env::remove_var(&self.name) },
        }
    }
}
