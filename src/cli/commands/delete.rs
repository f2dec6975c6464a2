//! `stackctl delete`

use serde_json::json;
use std::io::Write;
use tracing::info;

use super::common::{CommandContext, deleting_line, deletion_exit_code, emit_json, progress};
use crate::report::format_completion;
use crate::{ExitCode, LifecycleState, StackError};

/// Request deletion of an existing group; optionally wait until it is gone.
///
/// A group that is already deleting is only waited on. A group still being
/// created is refused.
pub async fn execute_delete_command<W: Write + Send>(
    ctx: &CommandContext<'_>,
    wait: bool,
    out: &mut W,
) -> Result<ExitCode, StackError> {
    let mut driver = ctx.driver()?;

    match driver.attach().await? {
        LifecycleState::Deleted => {
            if ctx.json {
                emit_json(out, &json!({ "group": driver.group(), "state": "deleted" }))?;
            } else {
                writeln!(out, "Group {} does not exist.", driver.group())?;
            }
            return Ok(ExitCode::SUCCESS);
        }
        LifecycleState::Deleting => {
            info!(group = driver.group(), "deletion already in progress");
        }
        _ => {
            if !ctx.json {
                writeln!(out, "{}", deleting_line(driver.group()))?;
            }
            driver.teardown().await?;
        }
    }

    if !wait {
        if ctx.json {
            emit_json(out, &json!({ "group": driver.group(), "state": driver.state().as_str() }))?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = {
        let mut observer = progress(ctx.json, out);
        driver.await_terminal(observer.as_mut()).await?
    };

    if ctx.json {
        emit_json(
            out,
            &json!({
                "group": driver.group(),
                "state": driver.state().as_str(),
                "outcome": outcome,
            }),
        )?;
    } else {
        writeln!(out, "{}", format_completion(driver.group(), &outcome))?;
    }
    Ok(deletion_exit_code(&outcome.status))
}
