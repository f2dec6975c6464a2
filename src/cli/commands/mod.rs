//! CLI command implementations.
//!
//! Every handler writes its console (or JSON) output to the given writer and
//! returns the exit code for outcomes that are not errors, such as a group
//! that settled in a failure status.

mod common;
mod config;
mod create;
mod delete;
mod inspect;
mod pipeline;
mod wait;

#[cfg(test)]
mod tests;

pub use common::CommandContext;
pub use config::execute_config_command;
pub use create::execute_create_command;
pub use delete::execute_delete_command;
pub use inspect::{execute_list_command, execute_resolve_command};
pub use pipeline::execute_run_command;
pub use wait::execute_wait_command;
