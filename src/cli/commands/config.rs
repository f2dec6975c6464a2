//! `stackctl config`

use serde_json::{Map, Value, json};
use std::io::Write;

use super::common::emit_json;
use crate::{Config, ExitCode, StackError};

/// Print every effective setting as `key = value (source)`.
pub fn execute_config_command<W: Write>(
    config: &Config,
    json: bool,
    out: &mut W,
) -> Result<ExitCode, StackError> {
    let settings = config.effective_settings();

    if json {
        let map: Map<String, Value> = settings
            .into_iter()
            .map(|(key, value, source)| (key, json!({ "value": value, "source": source })))
            .collect();
        emit_json(out, &map)?;
        return Ok(ExitCode::SUCCESS);
    }

    let width = settings.iter().map(|(key, _, _)| key.len()).max().unwrap_or(0);
    for (key, value, source) in settings {
        writeln!(out, "{key:<width$} = {value} ({source})")?;
    }
    Ok(ExitCode::SUCCESS)
}
