//! Helpers shared by the command handlers.

use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;

use crate::report;
use crate::types::LifecycleStatus;
use crate::{
    CancelToken, Config, ConfigError, ConsoleProgress, ExitCode, LifecycleDriver,
    OrchestrationService, SilentProgress, StackError, WaitObserver,
};

/// Everything a command needs besides its own flags.
pub struct CommandContext<'a> {
    pub config: &'a Config,
    pub service: Arc<dyn OrchestrationService>,
    pub cancel: CancelToken,
    pub json: bool,
}

impl CommandContext<'_> {
    /// Driver for the configured group, wired to the interrupt token.
    pub fn driver(&self) -> Result<LifecycleDriver, StackError> {
        Ok(LifecycleDriver::from_config(self.config, Arc::clone(&self.service))?
            .with_cancel_token(self.cancel.clone()))
    }
}

/// Dots on the console, nothing in JSON mode.
pub fn progress<'w, W: Write + Send>(json: bool, out: &'w mut W) -> Box<dyn WaitObserver + 'w> {
    if json {
        Box::new(SilentProgress)
    } else {
        Box::new(ConsoleProgress::new(out))
    }
}

/// Read the configured template file.
pub fn read_template(config: &Config) -> Result<String, StackError> {
    let path = config.template_path().ok_or_else(|| {
        ConfigError::MissingRequired("template (--template or [group] template)".to_string())
    })?;
    fs::read_to_string(path).map_err(|e| StackError::Template {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn emit_json<W, T>(out: &mut W, value: &T) -> Result<(), StackError>
where
    W: Write,
    T: Serialize + ?Sized,
{
    let json = report::to_json(value).map_err(io::Error::from)?;
    out.write_all(json.as_bytes())?;
    Ok(())
}

pub fn creating_line(group: &str) -> String {
    format!("Creating a group called {group}.")
}

pub fn deleting_line(group: &str) -> String {
    format!("Deleting the group called {group}.")
}

/// Creation succeeded only if the group ended `CREATE_COMPLETE`.
pub fn creation_exit_code(status: &LifecycleStatus) -> ExitCode {
    if *status == LifecycleStatus::CreateComplete {
        ExitCode::SUCCESS
    } else {
        ExitCode::GROUP_FAILED
    }
}

/// Deletion succeeded only if the group is gone.
pub fn deletion_exit_code(status: &LifecycleStatus) -> ExitCode {
    if *status == LifecycleStatus::NoSuchGroup {
        ExitCode::SUCCESS
    } else {
        ExitCode::GROUP_FAILED
    }
}

/// Any settled status that is not a failure.
pub fn settled_exit_code(status: &LifecycleStatus) -> ExitCode {
    if status.is_failure() {
        ExitCode::GROUP_FAILED
    } else {
        ExitCode::SUCCESS
    }
}
