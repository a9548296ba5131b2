// Shared test doubles for the ota-core integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ota_aio::{CommandExecutor, MtdUtils};
use ota_common::error::{OtaError, Result};
use ota_common::model::{ObjectMetadata, UpdateMetadata};
use ota_core::installmodes::{default_registry, InstallEnv, InstallMode, InstallModeRegistry};
use ota_core::{Activation, AgentContext, Rebooter, UpdateSource};

pub const SHA: &str = "8e29c9df2bc3c417b460b02b566edc668195da9c75a1fcf2f63829a7c59fc07d";

#[derive(Clone, Default)]
pub struct RecordingExecutor {
    responses: Arc<Mutex<HashMap<String, Result<Vec<u8>>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingExecutor {
    pub fn on(self, command: &str, result: Result<Vec<u8>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(command.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, command_line: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(command_line.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(command_line)
            .cloned()
            .unwrap_or_else(|| {
                Err(OtaError::CommandExecError(format!(
                    "unexpected command: {command_line}"
                )))
            })
    }
}

pub struct FixedMtd {
    pub nand: bool,
}

impl MtdUtils for FixedMtd {
    fn target_device_from_mtd_name(&self, _fs_root: &Path, name: &str) -> Result<String> {
        match name {
            "system0" => Ok("/dev/mtd5".to_string()),
            "system1" => Ok("/dev/mtd6".to_string()),
            other => Err(OtaError::MtdNameNotFound(other.to_string())),
        }
    }

    fn is_nand(&self, _device: &str) -> Result<bool> {
        Ok(self.nand)
    }
}

#[derive(Clone, Default)]
pub struct ActivationMock {
    pub calls: Arc<AtomicUsize>,
    pub failure: Option<OtaError>,
    pub slot: usize,
}

impl ActivationMock {
    pub fn failing(error: OtaError) -> Self {
        Self {
            failure: Some(error),
            ..Default::default()
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Activation for ActivationMock {
    fn activate(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn inactive_slot(&self) -> Result<usize> {
        Ok(self.slot)
    }
}

#[derive(Clone, Default)]
pub struct RebooterMock {
    pub calls: Arc<AtomicUsize>,
}

impl Rebooter for RebooterMock {
    fn reboot(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct SourceMock {
    pub metadata: Option<UpdateMetadata>,
    pub download_failure: Option<OtaError>,
    pub downloads: Arc<AtomicUsize>,
    pub slots: Arc<Mutex<Vec<usize>>>,
}

impl UpdateSource for SourceMock {
    fn probe(&self) -> Result<Option<UpdateMetadata>> {
        Ok(self.metadata.clone())
    }

    fn download(&self, _metadata: &UpdateMetadata, slot: usize) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.slots.lock().unwrap().push(slot);
        match &self.download_failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Install mode that records its lifecycle calls and can fail on demand.
pub struct RecordingMode {
    pub events: Arc<Mutex<Vec<String>>>,
    pub fail_setup: bool,
    pub cancel_on_install: Option<Arc<AtomicBool>>,
    target: String,
}

impl RecordingMode {
    pub fn new(events: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            events,
            fail_setup: false,
            cancel_on_install: None,
            target: String::new(),
        }
    }

    fn record(&self, step: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{step} {}", self.target));
    }
}

impl InstallMode for RecordingMode {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn load(&mut self, object: &ObjectMetadata) -> Result<()> {
        self.target = object.target.clone();
        Ok(())
    }

    fn setup(&mut self) -> Result<()> {
        self.record("setup");
        if self.fail_setup {
            return Err(OtaError::Config(format!("cannot set up {}", self.target)));
        }
        Ok(())
    }

    fn install(&mut self) -> Result<()> {
        self.record("install");
        if let Some(flag) = &self.cancel_on_install {
            flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.record("cleanup");
        Ok(())
    }
}

pub fn object(mode: &str, target_type: &str, target: &str) -> ObjectMetadata {
    ObjectMetadata {
        mode: mode.to_string(),
        target_type: target_type.to_string(),
        target: target.to_string(),
        sha256sum: SHA.to_string(),
        filename: "rootfs.img".to_string(),
        size: 4096,
    }
}

pub fn metadata(objects: Vec<Vec<ObjectMetadata>>) -> UpdateMetadata {
    UpdateMetadata {
        product_uid: "0123456789".to_string(),
        version: "2.0".to_string(),
        objects,
    }
}

pub fn flash_registry(executor: &RecordingExecutor, nand: bool) -> InstallModeRegistry {
    default_registry(&InstallEnv {
        executor: Arc::new(executor.clone()),
        mtd_utils: Arc::new(FixedMtd { nand }),
        fs_root: "/".into(),
    })
}

pub fn context(
    registry: InstallModeRegistry,
    activation: &ActivationMock,
    rebooter: &RebooterMock,
    source: &SourceMock,
) -> AgentContext {
    AgentContext::new(
        registry,
        Box::new(activation.clone()),
        Box::new(rebooter.clone()),
        Box::new(source.clone()),
    )
}
