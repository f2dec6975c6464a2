//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime and the Ctrl-C watcher
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

use super::args::{Cli, Commands};
use super::commands::{self, CommandContext};

use crate::{CancelHandle, CancelToken, Config, ConfigError, ExitCode, StackError};
use stackctl_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// Handles ALL output including errors and returns `Err(ExitCode)` for any
/// non-zero outcome. main.rs only calls `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    let cli_args = cli.to_cli_args();

    // Logging is best effort; a second subscriber (tests) is not fatal
    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Warning: could not initialise logging: {e}");
    }

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            let err = config_error(err);
            eprint!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.operation();
    let json = cli.json;

    let result = rt.block_on(async {
        let (handle, cancel) = CancelHandle::pair();
        let interrupted = handle.token();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling");
                handle.cancel();
            }
        });

        let group = config.group_name().unwrap_or(operation);
        let work = dispatch(cli.command, &config, cancel, json);
        let outcome = until_cancelled(work, &interrupted, group).await;
        interrupt.abort();
        outcome
    });

    match result {
        Ok(code) if code == ExitCode::SUCCESS => Ok(()),
        Ok(code) => {
            debug!(operation, code = code.as_i32(), "command finished unsuccessfully");
            Err(code)
        }
        Err(err) => {
            debug!(operation, error = %err, "command failed");
            eprint!("{}", err.display_for_user());
            Err(err.to_exit_code())
        }
    }
}

/// Recover the typed error from discovery, or wrap a file problem.
fn config_error(err: anyhow::Error) -> StackError {
    match err.downcast::<StackError>() {
        Ok(stack_err) => stack_err,
        Err(other) => StackError::Config(ConfigError::InvalidFile(format!("{other:#}"))),
    }
}

/// Drive `work` to completion unless cancellation arrives first.
///
/// `work` is polled before the token so a wait loop that observes the same
/// cancellation gets to finish its own output.
async fn until_cancelled<F>(
    work: F,
    cancel: &CancelToken,
    group: &str,
) -> Result<ExitCode, StackError>
where
    F: Future<Output = Result<ExitCode, StackError>>,
{
    tokio::select! {
        biased;
        outcome = work => outcome,
        () = cancel.cancelled() => {
            warn!(group, "command abandoned on interrupt");
            Err(StackError::Cancelled {
                group: group.to_string(),
            })
        }
    }
}

async fn dispatch(
    command: Commands,
    config: &Config,
    cancel: CancelToken,
    json: bool,
) -> Result<ExitCode, StackError> {
    let mut out = io::stdout();

    // `config` never talks to the service
    if let Commands::Config = command {
        return commands::execute_config_command(config, json, &mut out);
    }

    let service = Arc::from(crate::service::from_config(config).await?);
    let ctx = CommandContext {
        config,
        service,
        cancel,
        json,
    };

    match command {
        Commands::Create { wait, .. } => {
            commands::execute_create_command(&ctx, wait, &mut out).await
        }
        Commands::Wait { .. } => commands::execute_wait_command(&ctx, &mut out).await,
        Commands::List => commands::execute_list_command(&ctx, &mut out).await,
        Commands::Resolve { .. } => commands::execute_resolve_command(&ctx, &mut out).await,
        Commands::Delete { wait, .. } => {
            commands::execute_delete_command(&ctx, wait, &mut out).await
        }
        Commands::Run { keep, .. } => commands::execute_run_command(&ctx, keep, &mut out).await,
        Commands::Config => commands::execute_config_command(config, json, &mut out),
    }
}
