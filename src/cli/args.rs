//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::CliArgs;
use crate::types::Parameter;

/// stackctl - drive a CloudFormation stack through its lifecycle
#[derive(Parser, Debug)]
#[command(name = "stackctl")]
#[command(about = "Create, watch, inspect and delete CloudFormation stacks")]
#[command(long_about = r#"
stackctl submits a template as a resource group, polls it until it settles,
lists what it contains, resolves individual resources and tears it down again.

EXAMPLES:
  # Create a group and wait for it to settle
  stackctl create -g Sample -t template.json -p KeyName=my-key --wait

  # Watch an existing group until it reaches a terminal status
  stackctl wait Sample

  # List every group with its resources
  stackctl list

  # Find the physical id behind a logical resource
  stackctl resolve Sample --logical-resource SampleNotificationTopic

  # Delete a group and wait until it is gone
  stackctl delete Sample --wait

  # Full round trip: create, wait, list, resolve, delete, wait
  stackctl run Sample -t template.json -p KeyName=my-key -l SampleNotificationTopic

  # Try the round trip offline against the in-process simulator
  stackctl run Sample -t template.json -p KeyName=k --backend memory --interval-secs 0

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > environment > config file > defaults
  Config file is discovered by searching upward from CWD for .stackctl/config.toml
  Use --config to specify an explicit config file path
  Use 'stackctl config' to see every effective value and where it came from

EXIT CODES:
  0 success, 2 invalid arguments or configuration, 10 wait timed out,
  11 group settled in a failure status, 70 service unreachable,
  71 service rejected the request, 130 interrupted
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Service backend: cloudformation or memory
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// AWS region for the cloudformation backend
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// AWS shared-config profile for the cloudformation backend
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Endpoint override, e.g. a local emulator
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    /// Seconds between status polls while waiting
    #[arg(long, global = true)]
    pub interval_secs: Option<u64>,

    /// Give up waiting after this many seconds (0 waits forever)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit machine-readable JSON instead of console text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a template as a new group
    Create {
        /// Group name
        #[arg(short, long)]
        group: Option<String>,

        /// Template file to submit
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Template parameter, repeatable
        #[arg(short = 'p', long = "parameter", value_name = "KEY=VALUE")]
        parameters: Vec<Parameter>,

        /// Wait until the group settles
        #[arg(long)]
        wait: bool,
    },

    /// Poll a group until it reaches a terminal status
    Wait {
        /// Group name
        group: Option<String>,
    },

    /// List every group with its member resources
    List,

    /// Look up the resources behind one logical name
    Resolve {
        /// Group name
        group: Option<String>,

        /// Logical resource name from the template
        #[arg(short, long)]
        logical_resource: Option<String>,
    },

    /// Request deletion of a group
    Delete {
        /// Group name
        group: Option<String>,

        /// Wait until the group is gone
        #[arg(long)]
        wait: bool,
    },

    /// Create, wait, list, resolve, delete and wait again
    Run {
        /// Group name
        group: Option<String>,

        /// Template file to submit
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Template parameter, repeatable
        #[arg(short = 'p', long = "parameter", value_name = "KEY=VALUE")]
        parameters: Vec<Parameter>,

        /// Logical resource to resolve once the group is ready
        #[arg(short, long)]
        logical_resource: Option<String>,

        /// Leave the group in place instead of deleting it
        #[arg(long)]
        keep: bool,
    },

    /// Show the effective configuration and where each value came from
    Config,
}

impl Cli {
    /// Map parsed flags onto the configuration layer's CLI overrides.
    #[must_use]
    pub fn to_cli_args(&self) -> CliArgs {
        let mut args = CliArgs {
            config_path: self.config.clone(),
            verbose: self.verbose.then_some(true),
            backend: self.backend.clone(),
            region: self.region.clone(),
            profile: self.profile.clone(),
            endpoint_url: self.endpoint_url.clone(),
            interval_secs: self.interval_secs,
            timeout_secs: self.timeout_secs,
            ..CliArgs::default()
        };

        match &self.command {
            Commands::Create {
                group,
                template,
                parameters,
                ..
            } => {
                args.group_name = group.clone();
                args.template = template.clone();
                args.parameters = parameters.clone();
            }
            Commands::Wait { group } | Commands::Delete { group, .. } => {
                args.group_name = group.clone();
            }
            Commands::Resolve {
                group,
                logical_resource,
            } => {
                args.group_name = group.clone();
                args.logical_resource = logical_resource.clone();
            }
            Commands::Run {
                group,
                template,
                parameters,
                logical_resource,
                ..
            } => {
                args.group_name = group.clone();
                args.template = template.clone();
                args.parameters = parameters.clone();
                args.logical_resource = logical_resource.clone();
            }
            Commands::List | Commands::Config => {}
        }

        args
    }

    /// Short name of the subcommand, used in log fields.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self.command {
            Commands::Create { .. } => "create",
            Commands::Wait { .. } => "wait",
            Commands::List => "list",
            Commands::Resolve { .. } => "resolve",
            Commands::Delete { .. } => "delete",
            Commands::Run { .. } => "run",
            Commands::Config => "config",
        }
    }
}

/// Build the CLI command structure.
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
