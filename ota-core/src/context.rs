// ota-core/src/context.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::activation::{Activation, Rebooter};
use crate::installmodes::InstallModeRegistry;
use crate::source::UpdateSource;

/// Everything a state handler may use.
pub struct AgentContext {
    pub registry: InstallModeRegistry,
    pub activation: Box<dyn Activation>,
    pub rebooter: Box<dyn Rebooter>,
    pub source: Box<dyn UpdateSource>,
    cancel: Arc<AtomicBool>,
}

impl AgentContext {
    pub fn new(
        registry: InstallModeRegistry,
        activation: Box<dyn Activation>,
        rebooter: Box<dyn Rebooter>,
        source: Box<dyn UpdateSource>,
    ) -> Self {
        Self {
            registry,
            activation,
            rebooter,
            source,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an existing cancellation flag, e.g. one already wired to a
    /// signal handler.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    /// Handle that requests cancellation from another thread or a signal
    /// handler.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentContext")
            .field("registry", &self.registry)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
