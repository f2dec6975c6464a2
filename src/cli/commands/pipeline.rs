//! `stackctl run`: the whole lifecycle in one invocation.

use serde_json::json;
use std::io::Write;
use tracing::info;

use super::common::{
    CommandContext, creating_line, creation_exit_code, deleting_line, deletion_exit_code,
    emit_json, progress, read_template,
};
use crate::report::{format_completion, render_listing, render_resolution};
use crate::{ExitCode, LifecycleState, StackError};

/// Create, wait, list, resolve, delete and wait again.
///
/// The group is deleted even when creation failed, unless `keep` is set or
/// the group is already gone. Resolution only runs on a Ready group that has
/// a configured logical resource.
pub async fn execute_run_command<W: Write + Send>(
    ctx: &CommandContext<'_>,
    keep: bool,
    out: &mut W,
) -> Result<ExitCode, StackError> {
    let template = read_template(ctx.config)?;
    let mut driver = ctx.driver()?;
    let group = driver.group().to_string();

    if !ctx.json {
        writeln!(out, "{}", creating_line(&group))?;
    }
    let group_id = driver.submit(&template, ctx.config.parameters()).await?;
    let creation = {
        let mut observer = progress(ctx.json, out);
        driver.await_terminal(observer.as_mut()).await?
    };
    if !ctx.json {
        writeln!(out, "{}", format_completion(&group, &creation))?;
    }

    let groups = driver.list_all().await?;
    if !ctx.json {
        out.write_all(render_listing(&groups).as_bytes())?;
    }

    let resolution = if driver.state() == LifecycleState::Ready
        && ctx.config.logical_resource().is_some()
    {
        let (logical, resources) = driver.resolve_configured().await?;
        if !ctx.json {
            out.write_all(render_resolution(&logical, &group, &resources).as_bytes())?;
        }
        Some(json!({ "logical_name": logical, "resources": resources }))
    } else {
        None
    };

    let deletion = if keep || driver.state() == LifecycleState::Deleted {
        info!(group = %group, keep, "skipping teardown");
        None
    } else {
        if !ctx.json {
            writeln!(out, "{}", deleting_line(&group))?;
        }
        driver.teardown().await?;
        let outcome = {
            let mut observer = progress(ctx.json, out);
            driver.await_terminal(observer.as_mut()).await?
        };
        if !ctx.json {
            writeln!(out, "{}", format_completion(&group, &outcome))?;
        }
        Some(outcome)
    };

    if ctx.json {
        emit_json(
            out,
            &json!({
                "group": group,
                "group_id": group_id,
                "creation": creation,
                "groups": groups,
                "resolution": resolution,
                "deletion": deletion,
                "state": driver.state().as_str(),
            }),
        )?;
    }

    let created = creation_exit_code(&creation.status);
    if created != ExitCode::SUCCESS {
        return Ok(created);
    }
    Ok(deletion.map_or(ExitCode::SUCCESS, |outcome| deletion_exit_code(&outcome.status)))
}
