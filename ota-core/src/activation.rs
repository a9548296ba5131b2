// ota-core/src/activation.rs
//! Capabilities consumed after a successful install: switching the active
//! slot and restarting the device.

use std::sync::Arc;

use ota_aio::CommandExecutor;
use ota_common::error::{OtaError, Result};
use tracing::{debug, info};

pub trait Activation: Send + Sync {
    /// Makes the freshly written slot the one booted next.
    fn activate(&self) -> Result<()>;

    /// Index of the slot updates are written to.
    fn inactive_slot(&self) -> Result<usize> {
        Ok(0)
    }
}

pub trait Rebooter: Send + Sync {
    fn reboot(&self) -> Result<()>;
}

/// Activation performed by an external command (e.g. `fw_setenv`).
pub struct CommandActivation {
    command: Option<String>,
    inactive_slot: usize,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandActivation {
    pub fn new(
        command: Option<String>,
        inactive_slot: usize,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            command,
            inactive_slot,
            executor,
        }
    }
}

impl Activation for CommandActivation {
    fn activate(&self) -> Result<()> {
        let command = self.command.as_deref().ok_or_else(|| {
            OtaError::Activation("no activate-command configured".to_string())
        })?;
        info!("Activating slot {} with '{}'", self.inactive_slot, command);
        self.executor.execute(command)?;
        Ok(())
    }

    fn inactive_slot(&self) -> Result<usize> {
        Ok(self.inactive_slot)
    }
}

pub struct CommandRebooter {
    command: String,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandRebooter {
    pub fn new(command: impl Into<String>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            command: command.into(),
            executor,
        }
    }
}

impl Rebooter for CommandRebooter {
    fn reboot(&self) -> Result<()> {
        debug!("Rebooting with '{}'", self.command);
        self.executor.execute(&self.command)?;
        Ok(())
    }
}
