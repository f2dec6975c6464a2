//! Logging and observability infrastructure for stackctl
//!
//! Structured `tracing` events go to stderr so that stdout stays reserved for
//! the console contract (progress dots, resource tables, JSON output).

use std::time::Duration;
use tracing::{Level, info, span, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Build the env filter used by [`init_tracing`].
///
/// `RUST_LOG` wins when set; otherwise stackctl crates log at `info`
/// (`debug` when verbose) and everything else at `warn`.
#[must_use]
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("stackctl=debug,stackctl_engine=debug,stackctl_service=debug,info")
            } else {
                EnvFilter::try_new("stackctl=info,stackctl_engine=info,stackctl_service=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Initialize tracing subscriber for structured logging
///
/// Sets up tracing with either compact (default) or verbose format. Verbose
/// format adds targets and span-close timings.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = env_filter(verbose);

    if verbose {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span wrapping one lifecycle operation on a group.
#[must_use]
pub fn lifecycle_span(group: &str, operation: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "lifecycle",
        group = %group,
        operation = %operation,
    )
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
#[must_use]
pub fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Log the end of a wait with its outcome.
pub fn log_wait_complete(group: &str, status: &str, polls: u32, waited: Duration) {
    info!(
        group = %group,
        status = %status,
        polls = polls,
        elapsed_ms = millis(waited),
        "Group reached terminal state"
    );
}

/// Log a service failure. Errors are never retried, so this is the only trace
/// left of them besides the user-facing report.
pub fn log_service_failure(group: &str, operation: &str, error: &str) {
    warn!(
        group = %group,
        operation = %operation,
        error = %error,
        "Service call failed"
    );
}
