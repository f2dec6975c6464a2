//! `stackctl create`

use serde_json::json;
use std::io::Write;
use tracing::info;

use super::common::{
    CommandContext, creating_line, creation_exit_code, emit_json, progress, read_template,
};
use crate::report::format_completion;
use crate::{ExitCode, StackError};

/// Submit the configured template; optionally wait for the group to settle.
pub async fn execute_create_command<W: Write + Send>(
    ctx: &CommandContext<'_>,
    wait: bool,
    out: &mut W,
) -> Result<ExitCode, StackError> {
    let template = read_template(ctx.config)?;
    let mut driver = ctx.driver()?;

    if !ctx.json {
        writeln!(out, "{}", creating_line(driver.group()))?;
    }
    let group_id = driver.submit(&template, ctx.config.parameters()).await?;
    info!(group = driver.group(), "create submitted");

    if !wait {
        if ctx.json {
            emit_json(out, &json!({ "group": driver.group(), "group_id": group_id }))?;
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
                "group_id": group_id,
                "state": driver.state().as_str(),
                "outcome": outcome,
            }),
        )?;
    } else {
        writeln!(out, "{}", format_completion(driver.group(), &outcome))?;
    }
    Ok(creation_exit_code(&outcome.status))
}
