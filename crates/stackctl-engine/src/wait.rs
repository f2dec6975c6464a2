//! Await a terminal state by fixed-interval polling.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use stackctl_service::OrchestrationService;
use stackctl_utils::error::StackError;
use stackctl_utils::logging::{log_service_failure, log_wait_complete, millis};
use stackctl_utils::types::LifecycleStatus;

use crate::cancel::CancelToken;
use crate::policy::{Observation, PollDecision, PollPolicy};
use crate::progress::WaitObserver;

/// Result of a successful wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitOutcome {
    pub status: LifecycleStatus,
    /// Empty when the service reported no reason.
    pub reason: String,
    pub polls: u32,
    #[serde(rename = "waited_ms", serialize_with = "serialize_millis")]
    pub waited: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(millis(*d))
}

/// Describe `group` once and turn the answer into an observation.
async fn observe(
    service: &dyn OrchestrationService,
    group: &str,
) -> Result<Observation, StackError> {
    let summary = service
        .describe_groups(Some(group))
        .await?
        .into_iter()
        .find(|g| g.name == group);
    Ok(Observation::from(summary))
}

/// Poll `group` until the policy says it is done.
///
/// Polls immediately, then sleeps `policy.interval` between polls. Service
/// errors end the wait at once; nothing is retried.
///
/// # Errors
///
/// - `StackError::WaitTimedOut` when the policy timeout elapses first
/// - `StackError::Cancelled` when `cancel` fires during a sleep
/// - `StackError::Service` when a poll fails
pub async fn await_terminal(
    service: &dyn OrchestrationService,
    group: &str,
    policy: &PollPolicy,
    cancel: &CancelToken,
    observer: &mut dyn WaitObserver,
) -> Result<WaitOutcome, StackError> {
    let started = Instant::now();
    let mut polls = 0u32;
    let mut absent_streak = 0u32;
    let mut last_status: Option<LifecycleStatus> = None;

    observer.on_start(group);

    loop {
        polls += 1;
        let observation = match observe(service, group).await {
            Ok(observation) => observation,
            Err(err) => {
                observer.on_finish(false);
                log_service_failure(group, "wait", &err.to_string());
                return Err(err);
            }
        };
        observer.on_poll(polls, &observation);

        match &observation {
            Observation::Absent => absent_streak += 1,
            Observation::Present { status, .. } => {
                absent_streak = 0;
                last_status = Some(status.clone());
            }
        }

        let elapsed = started.elapsed();
        debug!(
            group,
            poll = polls,
            status = %observation.status(),
            elapsed_ms = millis(elapsed),
            "polled group"
        );

        match policy.decide(&observation, elapsed, absent_streak) {
            PollDecision::Done { status, reason } => {
                observer.on_finish(true);
                log_wait_complete(group, status.as_str(), polls, elapsed);
                return Ok(WaitOutcome {
                    status,
                    reason,
                    polls,
                    waited: elapsed,
                });
            }
            PollDecision::TimedOut => {
                observer.on_finish(false);
                warn!(group, polls, "wait timed out");
                return Err(StackError::wait_timed_out(
                    group,
                    policy.timeout_secs(),
                    last_status.as_ref(),
                ));
            }
            PollDecision::Continue => {}
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                observer.on_finish(false);
                warn!(group, polls, "wait cancelled");
                return Err(StackError::Cancelled { group: group.to_string() });
            }
            () = tokio::time::sleep(policy.interval) => {}
        }
    }
}
