// ota-core/src/installmodes/registry.rs
use std::collections::HashMap;

use ota_common::error::{OtaError, Result};
use tracing::debug;

use super::InstallMode;

pub type InstallModeFactory = Box<dyn Fn() -> Box<dyn InstallMode> + Send + Sync>;
type RequirementCheck = Box<dyn Fn() -> Result<()> + Send + Sync>;

/// Maps install-mode names to constructors.
///
/// Built once at startup and handed to the agent context; read-only while
/// updates are processed.
#[derive(Default)]
pub struct InstallModeRegistry {
    factories: HashMap<String, InstallModeFactory>,
    requirements: HashMap<String, RequirementCheck>,
}

impl InstallModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`. A later registration of the same
    /// name replaces the earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn InstallMode> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!("Registering install mode '{}'", name);
        if self.factories.insert(name.clone(), Box::new(factory)).is_some() {
            debug!("Install mode '{}' was already registered, replaced", name);
        }
    }

    /// Attaches the host requirement check for `name`, run by
    /// [`check_requirements`](Self::check_requirements).
    pub fn register_requirements<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.requirements.insert(name.into(), Box::new(check));
    }

    /// Builds a fresh, unconfigured instance of `name`.
    pub fn get_object(&self, name: &str) -> Result<Box<dyn InstallMode>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| OtaError::NoSuchInstallMode(name.to_string()))?;
        Ok(factory())
    }

    /// Registered mode names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Runs every registered requirement check, in name order, stopping at
    /// the first failure.
    pub fn check_requirements(&self) -> Result<()> {
        let mut names: Vec<&String> = self.requirements.keys().collect();
        names.sort_unstable();
        for name in names {
            debug!("Checking requirements of install mode '{}'", name);
            (self.requirements[name])()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for InstallModeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallModeRegistry")
            .field("modes", &self.names())
            .finish()
    }
}
