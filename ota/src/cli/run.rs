//! Contains the logic for the `run` command.
use clap::Args;
use colored::Colorize;
use ota_common::config::Config;
use ota_common::error::Result;
use ota_core::State;

use crate::agent;

#[derive(Args, Debug)]
pub struct Run;

impl Run {
    pub async fn run(&self, config: &Config) -> Result<()> {
        tracing::debug!("Starting update cycle");
        let report = agent::drive(agent::build_context(config), State::Idle).await?;

        if report.statuses().contains(&"reboot") {
            println!("{}{}", "==> ".bold().blue(), "Update installed, rebooting".bold());
        } else {
            println!("{}{}", "==> ".bold().blue(), "No update pending".bold());
        }
        Ok(())
    }
}
