//! Contains the logic for the `install` command.
use std::fs;
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use ota_common::config::Config;
use ota_common::error::Result;
use ota_common::model::UpdateMetadata;
use ota_core::State;

use crate::agent;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Metadata of the update; its objects must already be in the download directory
    #[arg(long, short)]
    pub metadata: PathBuf,
}

impl InstallArgs {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let raw = fs::read_to_string(&self.metadata)?;
        let metadata = UpdateMetadata::from_json(&raw)?;
        tracing::info!(
            "Installing update {} from {}",
            metadata.version,
            self.metadata.display()
        );

        agent::drive(agent::build_context(config), State::Downloaded(metadata)).await?;
        println!("{}{}", "==> ".bold().blue(), "Update installed".bold());
        Ok(())
    }
}
