//! `stackctl wait`

use std::io::Write;

use super::common::{CommandContext, emit_json, progress, settled_exit_code};
use crate::report::{WaitReport, format_completion};
use crate::{ExitCode, StackError};

/// Poll an existing group until it settles.
///
/// A group that does not exist settles immediately as `NO_SUCH_GROUP`.
pub async fn execute_wait_command<W: Write + Send>(
    ctx: &CommandContext<'_>,
    out: &mut W,
) -> Result<ExitCode, StackError> {
    let mut driver = ctx.driver()?;
    driver.attach().await?;

    let outcome = {
        let mut observer = progress(ctx.json, out);
        driver.await_terminal(observer.as_mut()).await?
    };

    if ctx.json {
        emit_json(
            out,
            &WaitReport {
                group: driver.group(),
                outcome: &outcome,
            },
        )?;
    } else {
        writeln!(out, "{}", format_completion(driver.group(), &outcome))?;
    }
    Ok(settled_exit_code(&outcome.status))
}
