// ota-common/src/config.rs
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::error::Result;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/ota-agent.toml";
const DEFAULT_STATE_DIR: &str = "/var/lib/ota-agent";
const DEFAULT_PACKAGE_DIR: &str = "/var/lib/ota-agent/incoming";
const DEFAULT_REBOOT_COMMAND: &str = "reboot";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub state_dir: PathBuf,
    pub download_dir: PathBuf,
    /// Root used for `/proc` and `/sys` lookups. `/` on a real target.
    pub fs_root: PathBuf,
    pub package_dir: PathBuf,
    pub activate_command: Option<String>,
    pub reboot_command: String,
    pub inactive_slot: usize,
}

/// On-disk representation; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    state_dir: Option<PathBuf>,
    download_dir: Option<PathBuf>,
    fs_root: Option<PathBuf>,
    package_dir: Option<PathBuf>,
    activate_command: Option<String>,
    reboot_command: Option<String>,
    inactive_slot: Option<usize>,
}

impl Config {
    /// Loads the config file at `path` (or the default location) and applies
    /// `OTA_*` environment overrides. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        debug!("Loading ota configuration from {}", path.display());

        let file = if path.is_file() {
            let raw = fs::read_to_string(path)?;
            toml::from_str::<ConfigFile>(&raw)?
        } else {
            debug!(
                "Config file {} not found, using defaults",
                path.display()
            );
            ConfigFile::default()
        };

        let config = Self::from_file(file).with_env_overrides();
        debug!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn from_file(file: ConfigFile) -> Self {
        let state_dir = file
            .state_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
        let download_dir = file
            .download_dir
            .unwrap_or_else(|| state_dir.join("downloads"));
        Self {
            download_dir,
            fs_root: file.fs_root.unwrap_or_else(|| PathBuf::from("/")),
            package_dir: file
                .package_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PACKAGE_DIR)),
            activate_command: file.activate_command.filter(|c| !c.trim().is_empty()),
            reboot_command: file
                .reboot_command
                .unwrap_or_else(|| DEFAULT_REBOOT_COMMAND.to_string()),
            inactive_slot: file.inactive_slot.unwrap_or(0),
            state_dir,
        }
    }

    fn with_env_overrides(mut self) -> Self {
        let var = |name: &str| env::var(name).ok().filter(|s| !s.is_empty());

        if let Some(dir) = var("OTA_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("OTA_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("OTA_FS_ROOT") {
            self.fs_root = PathBuf::from(dir);
        }
        if let Some(dir) = var("OTA_PACKAGE_DIR") {
            self.package_dir = PathBuf::from(dir);
        }
        if let Some(cmd) = var("OTA_ACTIVATE_COMMAND") {
            self.activate_command = Some(cmd);
        }
        if let Some(cmd) = var("OTA_REBOOT_COMMAND") {
            self.reboot_command = cmd;
        }
        self
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ConfigFile::default())
    }
}
