// ota-core/src/state/mod.rs
//! The update lifecycle as a closed set of states.
//!
//! Each state owns only the data its stage needs. `handle` consumes the
//! current state, does that stage's work and returns the next state together
//! with an `interrupted` flag telling the driving loop to stop advancing.

use ota_common::error::OtaError;
use ota_common::model::UpdateMetadata;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::context::AgentContext;

mod installing;
mod machine;

pub use machine::{RunReport, StateMachine};

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Idle,
    Probe,
    Downloading(UpdateMetadata),
    Downloaded(UpdateMetadata),
    Installing(UpdateMetadata),
    Installed(UpdateMetadata),
    Reboot,
    Error(ErrorState),
}

/// A failed stage: the error exactly as the failing step reported it.
#[derive(Debug, Clone)]
pub struct ErrorState {
    error: OtaError,
    metadata: Option<UpdateMetadata>,
}

impl ErrorState {
    pub fn new(error: OtaError, metadata: Option<UpdateMetadata>) -> Self {
        Self { error, metadata }
    }

    pub fn error(&self) -> &OtaError {
        &self.error
    }
}

impl PartialEq for ErrorState {
    fn eq(&self, other: &Self) -> bool {
        self.error.to_string() == other.error.to_string() && self.metadata == other.metadata
    }
}

impl State {
    pub fn error(error: OtaError, metadata: Option<UpdateMetadata>) -> Self {
        State::Error(ErrorState::new(error, metadata))
    }

    pub fn status(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Probe => "probe",
            State::Downloading(_) => "downloading",
            State::Downloaded(_) => "downloaded",
            State::Installing(_) => "installing",
            State::Installed(_) => "installed",
            State::Reboot => "reboot",
            State::Error(_) => "error",
        }
    }

    /// Snapshot for the reporting pipeline.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("status".to_string(), Value::from(self.status()));
        if let State::Error(e) = self {
            map.insert("error".to_string(), Value::from(e.error.to_string()));
        }
        map
    }

    pub fn update_metadata(&self) -> Option<&UpdateMetadata> {
        match self {
            State::Downloading(m)
            | State::Downloaded(m)
            | State::Installing(m)
            | State::Installed(m) => Some(m),
            State::Error(e) => e.metadata.as_ref(),
            State::Idle | State::Probe | State::Reboot => None,
        }
    }

    /// Runs this state's work. Returns the next state and whether the
    /// driving loop must stop advancing.
    #[instrument(skip_all, fields(state = self.status()))]
    pub fn handle(self, ctx: &AgentContext) -> (State, bool) {
        if ctx.is_cancelled() && !matches!(self, State::Error(_)) {
            info!("Cancellation requested, not running '{}'", self.status());
            return (State::Idle, true);
        }

        match self {
            State::Idle => (State::Probe, false),
            State::Probe => handle_probe(ctx),
            State::Downloading(metadata) => handle_downloading(metadata, ctx),
            State::Downloaded(metadata) => (State::Installing(metadata), false),
            State::Installing(metadata) => installing::handle(metadata, ctx),
            State::Installed(metadata) => handle_installed(metadata, ctx),
            State::Reboot => handle_reboot(ctx),
            State::Error(e) => {
                error!("Update failed: {}", e.error);
                (State::Idle, true)
            }
        }
    }
}

fn handle_probe(ctx: &AgentContext) -> (State, bool) {
    match ctx.source.probe() {
        Ok(Some(metadata)) => (State::Downloading(metadata), false),
        Ok(None) => {
            debug!("No update available");
            (State::Idle, true)
        }
        Err(e) => (State::error(e, None), false),
    }
}

fn handle_downloading(metadata: UpdateMetadata, ctx: &AgentContext) -> (State, bool) {
    let downloaded = ctx
        .activation
        .inactive_slot()
        .and_then(|slot| ctx.source.download(&metadata, slot));
    match downloaded {
        Ok(()) => (State::Downloaded(metadata), false),
        Err(e) => (State::error(e, Some(metadata)), false),
    }
}

fn handle_installed(metadata: UpdateMetadata, ctx: &AgentContext) -> (State, bool) {
    match ctx.activation.activate() {
        Ok(()) => {
            info!("Update {} activated", metadata.version);
            (State::Reboot, false)
        }
        Err(e) => (State::error(e, Some(metadata)), false),
    }
}

fn handle_reboot(ctx: &AgentContext) -> (State, bool) {
    match ctx.rebooter.reboot() {
        // The process is expected to go away; nothing left to advance.
        Ok(()) => (State::Idle, true),
        Err(e) => {
            warn!("Reboot failed: {}", e);
            (State::error(e, None), false)
        }
    }
}
