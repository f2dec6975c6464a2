//! stackctl - drive a CloudFormation stack through its lifecycle
//!
//! stackctl submits a template as a resource group, polls the group until it
//! reaches a terminal status, lists groups and their member resources,
//! resolves a single logical resource to its physical id, and tears the group
//! down again.
//!
//! stackctl can be used in two ways:
//! - **CLI**: run `stackctl --help` for the subcommands
//! - **Library**: build a [`LifecycleDriver`] over any [`OrchestrationService`]
//!
//! # Quick Start (CLI)
//!
//! ```bash
//! # Full round trip against AWS
//! stackctl run Sample -t template.json -p KeyName=my-key -l SampleNotificationTopic
//!
//! # Same thing offline
//! stackctl run Sample -t template.json -p KeyName=my-key --backend memory --interval-secs 0
//! ```
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stackctl::{Config, LifecycleDriver, SilentProgress, StackError};
//! use stackctl::service::InMemoryService;
//!
//! # async fn demo() -> Result<(), StackError> {
//! let config = Config::builder()
//!     .group_name("Sample")
//!     .backend("memory")
//!     .interval_secs(0)
//!     .build()?;
//! let service = Arc::new(InMemoryService::new(config.memory_settle_polls()));
//! let mut driver = LifecycleDriver::from_config(&config, service)?;
//!
//! driver.submit(r#"{"Resources":{"Q":{"Type":"AWS::SQS::Queue"}}}"#, &[]).await?;
//! let outcome = driver.await_terminal(&mut SilentProgress).await?;
//! println!("{} ({})", outcome.status, outcome.reason);
//!
//! driver.teardown().await?;
//! driver.await_terminal(&mut SilentProgress).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Stable Public API
//!
//! - [`Config`], [`ConfigBuilder`] and [`CliArgs`] - configuration management
//! - [`LifecycleDriver`] and [`LifecycleState`] - the lifecycle state machine
//! - [`OrchestrationService`] - the service capability
//! - [`StackError`] - library error type
//! - [`ExitCode`] - CLI exit codes

pub use stackctl_config::{CliArgs, Config, ConfigBuilder};
pub use stackctl_engine::{
    CancelHandle, CancelToken, ConsoleProgress, LifecycleDriver, LifecycleState, Observation,
    PollDecision, PollPolicy, SilentProgress, TerminalSet, WaitObserver, WaitOutcome,
    await_terminal, list_groups,
};
pub use stackctl_service::OrchestrationService;
pub use stackctl_utils::error::{ConfigError, ServiceError, StackError, UserFriendlyError};
pub use stackctl_utils::exit_codes::ExitCode;

pub use stackctl_engine::report;
pub use stackctl_service as service;
pub use stackctl_utils::types;

#[doc(hidden)]
pub mod cli;
