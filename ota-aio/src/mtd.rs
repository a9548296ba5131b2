// ota-aio/src/mtd.rs
use std::fs;
use std::path::{Path, PathBuf};

use ota_common::error::{OtaError, Result};
use tracing::{debug, warn};

/// Device-class queries for MTD (raw flash) devices.
pub trait MtdUtils: Send + Sync {
    /// Translates a symbolic MTD partition name (as listed in `/proc/mtd`)
    /// into its character device path, looking it up under `fs_root`.
    fn target_device_from_mtd_name(&self, fs_root: &Path, name: &str) -> Result<String>;

    /// Whether the flash chip behind `device` is NAND.
    fn is_nand(&self, device: &str) -> Result<bool>;
}

/// Implementation over procfs and sysfs.
#[derive(Debug, Clone)]
pub struct SysfsMtdUtils {
    sysfs_root: PathBuf,
}

impl SysfsMtdUtils {
    pub fn new(fs_root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: fs_root.into(),
        }
    }

    fn type_path(&self, device: &str) -> Option<PathBuf> {
        let file_name = Path::new(device).file_name()?.to_str()?;
        let index = file_name
            .strip_prefix("mtdblock")
            .or_else(|| file_name.strip_prefix("mtd"))?;
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(
            self.sysfs_root
                .join("sys/class/mtd")
                .join(format!("mtd{index}"))
                .join("type"),
        )
    }
}

impl Default for SysfsMtdUtils {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Parses one `/proc/mtd` line, e.g. `mtd5: 00800000 00020000 "system0"`.
fn parse_proc_mtd_line(line: &str) -> Option<(&str, &str)> {
    let (dev, rest) = line.split_once(':')?;
    if !dev.starts_with("mtd") {
        return None;
    }
    let name = rest.split_once('"')?.1.strip_suffix('"')?;
    Some((dev.trim(), name))
}

impl MtdUtils for SysfsMtdUtils {
    fn target_device_from_mtd_name(&self, fs_root: &Path, name: &str) -> Result<String> {
        let proc_mtd = fs_root.join("proc/mtd");
        debug!("Looking up mtdname '{}' in {}", name, proc_mtd.display());

        let table = fs::read_to_string(&proc_mtd).map_err(|e| {
            warn!("Failed to read {}: {}", proc_mtd.display(), e);
            OtaError::MtdNameNotFound(name.to_string())
        })?;

        table
            .lines()
            .filter_map(|line| parse_proc_mtd_line(line.trim_end()))
            .find(|(_, mtd_name)| *mtd_name == name)
            .map(|(dev, _)| format!("/dev/{dev}"))
            .ok_or_else(|| OtaError::MtdNameNotFound(name.to_string()))
    }

    fn is_nand(&self, device: &str) -> Result<bool> {
        let type_path = self.type_path(device).ok_or_else(|| {
            OtaError::DeviceClass(format!("Error opening {device}: not an MTD device"))
        })?;

        let flash_type = fs::read_to_string(&type_path)
            .map_err(|e| OtaError::DeviceClass(format!("Error opening {device}: {e}")))?;
        let flash_type = flash_type.trim();
        debug!("{} reports flash type '{}'", device, flash_type);

        Ok(matches!(flash_type, "nand" | "mlc-nand"))
    }
}
