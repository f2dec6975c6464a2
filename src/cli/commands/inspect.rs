//! `stackctl list` and `stackctl resolve`

use std::io::Write;

use super::common::{CommandContext, emit_json};
use crate::report::{Resolution, render_listing, render_resolution};
use crate::{ExitCode, StackError, list_groups};

/// Print every group with its resources.
pub async fn execute_list_command<W: Write>(
    ctx: &CommandContext<'_>,
    out: &mut W,
) -> Result<ExitCode, StackError> {
    let groups = list_groups(ctx.service.as_ref()).await?;
    if ctx.json {
        emit_json(out, &groups)?;
    } else {
        out.write_all(render_listing(&groups).as_bytes())?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the resources behind the configured logical name.
///
/// An empty match is not an error; only the header is printed.
pub async fn execute_resolve_command<W: Write>(
    ctx: &CommandContext<'_>,
    out: &mut W,
) -> Result<ExitCode, StackError> {
    let driver = ctx.driver()?;
    let (logical, resources) = driver.resolve_configured().await?;
    if ctx.json {
        emit_json(
            out,
            &Resolution {
                group: driver.group(),
                logical_name: &logical,
                resources: &resources,
            },
        )?;
    } else {
        out.write_all(render_resolution(&logical, driver.group(), &resources).as_bytes())?;
    }
    Ok(ExitCode::SUCCESS)
}
