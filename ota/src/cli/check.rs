//! Contains the logic for the `check` command.
use clap::Args;
use colored::Colorize;
use ota_common::config::Config;
use ota_common::error::Result;

use crate::agent;

#[derive(Args, Debug)]
pub struct Check;

impl Check {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let ctx = agent::build_context(config);
        ctx.registry.check_requirements()?;
        println!(
            "{} install modes ready: {}",
            "✓".green().bold(),
            ctx.registry.names().join(", ")
        );
        Ok(())
    }
}
