//! Poll policy: when a wait is done, timed out, or should keep going.
//!
//! [`PollPolicy::decide`] is pure. The wait loop feeds it one observation at
//! a time together with the elapsed time and the number of consecutive
//! observations in which the group was absent.

use std::time::Duration;

use stackctl_config::{
    Config, DEFAULT_ABSENT_CONFIRMATIONS, DEFAULT_INTERVAL_SECS, DEFAULT_TERMINAL_STATUSES,
    DEFAULT_TIMEOUT_SECS,
};
use stackctl_utils::types::{GroupSummary, LifecycleStatus};

/// Reason reported when a group is no longer listed.
pub const GROUP_DELETED_REASON: &str = "group has been deleted";

/// What one poll saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Present {
        status: LifecycleStatus,
        reason: Option<String>,
    },
    Absent,
}

impl Observation {
    /// The status this observation implies; absent groups read as `NO_SUCH_GROUP`.
    #[must_use]
    pub fn status(&self) -> LifecycleStatus {
        match self {
            Self::Present { status, .. } => status.clone(),
            Self::Absent => LifecycleStatus::NoSuchGroup,
        }
    }
}

impl From<Option<GroupSummary>> for Observation {
    fn from(summary: Option<GroupSummary>) -> Self {
        match summary {
            Some(summary) => Self::Present {
                status: summary.status,
                reason: summary.status_reason,
            },
            None => Self::Absent,
        }
    }
}

/// Statuses that end a wait. `NO_SUCH_GROUP` is always a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSet(Vec<LifecycleStatus>);

impl TerminalSet {
    #[must_use]
    pub fn new(statuses: impl IntoIterator<Item = LifecycleStatus>) -> Self {
        let mut set = Vec::new();
        for status in statuses {
            if !set.contains(&status) {
                set.push(status);
            }
        }
        Self(set)
    }

    #[must_use]
    pub fn contains(&self, status: &LifecycleStatus) -> bool {
        matches!(status, LifecycleStatus::NoSuchGroup) || self.0.contains(status)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LifecycleStatus> {
        self.0.iter()
    }
}

impl Default for TerminalSet {
    fn default() -> Self {
        Self::new(
            DEFAULT_TERMINAL_STATUSES
                .iter()
                .map(|s| LifecycleStatus::from_service(s)),
        )
    }
}

/// Outcome of evaluating one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// Sleep one interval and poll again.
    Continue,
    /// Terminal state reached; `reason` is empty when the service gave none.
    Done {
        status: LifecycleStatus,
        reason: String,
    },
    /// The timeout elapsed without a terminal state.
    TimedOut,
}

/// How a wait polls and when it stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    pub terminal: TerminalSet,
    /// Consecutive absent observations needed before a group counts as deleted.
    pub absent_confirmations: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            terminal: TerminalSet::default(),
            absent_confirmations: DEFAULT_ABSENT_CONFIRMATIONS,
        }
    }
}

impl PollPolicy {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.wait_timeout(),
            terminal: TerminalSet::new(config.terminal_statuses()),
            absent_confirmations: config.absent_confirmations(),
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout in whole seconds for error reporting, `0` when unbounded.
    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.map_or(0, |t| t.as_secs())
    }

    /// Decide what to do after `observation`.
    ///
    /// A terminal observation wins over an expired timeout, so a group that
    /// settles on the last allowed poll is still reported as settled.
    #[must_use]
    pub fn decide(
        &self,
        observation: &Observation,
        elapsed: Duration,
        absent_streak: u32,
    ) -> PollDecision {
        match observation {
            Observation::Absent if absent_streak >= self.absent_confirmations.max(1) => {
                return PollDecision::Done {
                    status: LifecycleStatus::NoSuchGroup,
                    reason: GROUP_DELETED_REASON.to_string(),
                };
            }
            Observation::Present { status, reason } if self.terminal.contains(status) => {
                return PollDecision::Done {
                    status: status.clone(),
                    reason: reason.clone().unwrap_or_default(),
                };
            }
            _ => {}
        }

        match self.timeout {
            Some(limit) if elapsed >= limit => PollDecision::TimedOut,
            _ => PollDecision::Continue,
        }
    }
}
