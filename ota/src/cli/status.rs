//! Contains the logic for the `status` command.
use clap::Args;
use ota_common::config::Config;
use ota_common::error::Result;
use ota_core::State;
use serde_json::{json, Value};

use crate::agent;

#[derive(Args, Debug)]
pub struct Status;

impl Status {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let ctx = agent::build_context(config);
        let pending = ctx.source.probe()?;

        let mut report = State::Idle.to_map();
        report.insert(
            "pending-update".to_string(),
            pending.map_or(Value::Null, |m| Value::from(m.version)),
        );
        report.insert("install-modes".to_string(), json!(ctx.registry.names()));
        report.insert(
            "download-dir".to_string(),
            Value::from(config.download_dir.display().to_string()),
        );

        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
