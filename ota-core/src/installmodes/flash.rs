// ota-core/src/installmodes/flash.rs
//! Install mode for raw NAND/NOR flash exposed through the MTD subsystem.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ota_aio::{CmdLine, CommandExecutor, MtdUtils, SysfsMtdUtils};
use ota_common::error::{OtaError, Result};
use ota_common::model::ObjectMetadata;
use tracing::{debug, info, instrument};

use super::{InstallEnv, InstallMode, InstallModeRegistry};

pub const FLASH_MODE: &str = "flash";

const REQUIRED_TOOLS: [&str; 3] = ["nandwrite", "flashcp", "flash_erase"];
const TARGET_TYPE_DEVICE: &str = "device";
const TARGET_TYPE_MTDNAME: &str = "mtdname";

/// Verifies the flash tools are reachable through `$PATH`.
pub fn check_requirements() -> Result<()> {
    check_requirements_in(env::var_os("PATH").as_deref())
}

/// Same as [`check_requirements`] against an explicit search path.
pub fn check_requirements_in(search_path: Option<&OsStr>) -> Result<()> {
    for tool in REQUIRED_TOOLS {
        let found = which::which_in(tool, search_path, Path::new("/"))
            .map_err(|_| OtaError::ToolNotFound(tool.to_string()))?;
        debug!("Found '{}' at {}", tool, found.display());
    }
    Ok(())
}

/// Registers the flash mode and its requirement check.
pub fn register(registry: &mut InstallModeRegistry, env: &InstallEnv) {
    let env = env.clone();
    registry.register(FLASH_MODE, move || {
        Box::new(FlashObject::new(
            Arc::clone(&env.executor),
            Arc::clone(&env.mtd_utils),
            env.fs_root.clone(),
        ))
    });
    registry.register_requirements(FLASH_MODE, check_requirements);
}

pub struct FlashObject {
    target_type: String,
    target: String,
    sha256sum: String,
    /// Resolved by `setup`, never recomputed afterwards.
    target_device: Option<String>,
    fs_root: PathBuf,
    mtd_utils: Arc<dyn MtdUtils>,
    executor: Arc<dyn CommandExecutor>,
}

impl FlashObject {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        mtd_utils: Arc<dyn MtdUtils>,
        fs_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            target_type: String::new(),
            target: String::new(),
            sha256sum: String::new(),
            target_device: None,
            fs_root: fs_root.into(),
            mtd_utils,
            executor,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn target_device(&self) -> Option<&str> {
        self.target_device.as_deref()
    }
}

impl Default for FlashObject {
    fn default() -> Self {
        Self::new(
            Arc::new(CmdLine::new()),
            Arc::new(SysfsMtdUtils::default()),
            "/",
        )
    }
}

impl InstallMode for FlashObject {
    fn name(&self) -> &'static str {
        FLASH_MODE
    }

    fn load(&mut self, object: &ObjectMetadata) -> Result<()> {
        if !self.target_type.is_empty() || self.target_device.is_some() {
            return Err(OtaError::Config(
                "flash object is already loaded".to_string(),
            ));
        }
        self.target_type = object.target_type.clone();
        self.target = object.target.clone();
        self.sha256sum = object.sha256sum.clone();
        Ok(())
    }

    #[instrument(skip(self), fields(target_type = %self.target_type, target = %self.target))]
    fn setup(&mut self) -> Result<()> {
        if let Some(device) = &self.target_device {
            debug!("Target device already resolved to {}", device);
            return Ok(());
        }

        let device = match self.target_type.as_str() {
            TARGET_TYPE_DEVICE => self.target.clone(),
            TARGET_TYPE_MTDNAME => self
                .mtd_utils
                .target_device_from_mtd_name(&self.fs_root, &self.target)?,
            other => {
                return Err(OtaError::UnsupportedTargetType {
                    target_type: other.to_string(),
                    handler: FLASH_MODE,
                    supported: "'device' or 'mtdname'",
                })
            }
        };

        debug!("Resolved flash target to {}", device);
        self.target_device = Some(device);
        Ok(())
    }

    #[instrument(skip(self), fields(device = ?self.target_device))]
    fn install(&mut self) -> Result<()> {
        let device = self.target_device.as_deref().ok_or_else(|| {
            OtaError::Config("flash install attempted before setup resolved a device".to_string())
        })?;

        let is_nand = self.mtd_utils.is_nand(device)?;

        self.executor.execute(&format!("flash_erase {device} 0 0"))?;

        let write = if is_nand {
            format!("nandwrite -p {device} {}", self.sha256sum)
        } else {
            format!("flashcp {} {device}", self.sha256sum)
        };
        self.executor.execute(&write)?;

        info!(
            "Wrote {} to {} ({})",
            self.sha256sum,
            device,
            if is_nand { "NAND" } else { "NOR" }
        );
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }
}
