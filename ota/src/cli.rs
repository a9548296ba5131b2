// ota/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use ota_common::config::Config;
use ota_common::error::Result;

pub mod check;
pub mod install;
pub mod run;
pub mod status;

use crate::cli::check::Check;
use crate::cli::install::InstallArgs;
use crate::cli::run::Run;
use crate::cli::status::Status;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "ota", bin_name = "ota")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to /etc/ota-agent.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe for an update and, if one is pending, take it all the way to reboot
    Run(Run),
    /// Verify the external tools required by the install modes
    Check(Check),
    /// Install already downloaded objects described by a metadata file
    Install(InstallArgs),
    /// Print the agent status as JSON
    Status(Status),
}

impl Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Run(command) => command.run(config).await,
            Self::Check(command) => command.run(config).await,
            Self::Install(command) => command.run(config).await,
            Self::Status(command) => command.run(config).await,
        }
    }
}
