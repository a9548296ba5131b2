// ota-core/src/installmodes/mod.rs
//! Install modes write one update object onto one class of storage.
//!
//! A mode is looked up by the `mode` string of an object, loaded from that
//! object's metadata and then driven through `setup`, `install` and
//! `cleanup`. New storage classes are added by registering another
//! implementation, never by branching in the state machine.

use std::path::PathBuf;
use std::sync::Arc;

use ota_aio::{CmdLine, CommandExecutor, MtdUtils, SysfsMtdUtils};
use ota_common::error::Result;
use ota_common::model::ObjectMetadata;

pub mod flash;
pub mod registry;

pub use registry::{InstallModeFactory, InstallModeRegistry};

pub trait InstallMode: Send {
    /// Name the mode is registered under.
    fn name(&self) -> &'static str;

    /// Copies the fields this mode needs out of the object's metadata.
    /// Called once, right after construction.
    fn load(&mut self, object: &ObjectMetadata) -> Result<()>;

    /// Resolves the concrete target. Must not touch the target.
    fn setup(&mut self) -> Result<()>;

    /// Writes the payload. Stops at the first failing step.
    fn install(&mut self) -> Result<()>;

    /// Releases whatever `setup`/`install` acquired. Must succeed on a mode
    /// that was never set up.
    fn cleanup(&mut self) -> Result<()>;
}

/// Collaborators shared by every backend built by the registry.
#[derive(Clone)]
pub struct InstallEnv {
    pub executor: Arc<dyn CommandExecutor>,
    pub mtd_utils: Arc<dyn MtdUtils>,
    pub fs_root: PathBuf,
}

impl InstallEnv {
    /// Environment backed by the real system, running tools from
    /// `download_dir` so payloads resolve by their sha256sum.
    pub fn system(download_dir: impl Into<PathBuf>, fs_root: impl Into<PathBuf>) -> Self {
        let fs_root = fs_root.into();
        Self {
            executor: Arc::new(CmdLine::with_cwd(download_dir)),
            mtd_utils: Arc::new(SysfsMtdUtils::new(fs_root.clone())),
            fs_root,
        }
    }
}

/// Registry with every built-in mode registered against `env`.
pub fn default_registry(env: &InstallEnv) -> InstallModeRegistry {
    let mut registry = InstallModeRegistry::new();
    flash::register(&mut registry, env);
    registry
}
