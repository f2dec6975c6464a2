//! Lifecycle engine for stackctl
//!
//! Drives one resource group through submit, wait, inspect and teardown on
//! top of any [`OrchestrationService`](stackctl_service::OrchestrationService).

pub use stackctl_config as config;
pub use stackctl_service as service;
pub use stackctl_utils::error;
pub use stackctl_utils::types;

pub mod cancel;
pub mod driver;
pub mod policy;
pub mod progress;
pub mod report;
pub mod wait;

pub use cancel::{CancelHandle, CancelToken};
pub use driver::{LifecycleDriver, LifecycleState, list_groups};
pub use policy::{Observation, PollDecision, PollPolicy, TerminalSet};
pub use progress::{ConsoleProgress, SilentProgress, WaitObserver};
pub use wait::{WaitOutcome, await_terminal};
