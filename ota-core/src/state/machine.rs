// ota-core/src/state/machine.rs
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::State;
use crate::context::AgentContext;

/// Outcome of one run of the driving loop.
#[derive(Debug)]
pub struct RunReport {
    /// The state the loop stopped in (not yet handled).
    pub final_state: State,
    /// Status snapshot of every handled state, in order.
    pub trail: Vec<Map<String, Value>>,
}

impl RunReport {
    pub fn statuses(&self) -> Vec<&str> {
        self.trail
            .iter()
            .filter_map(|m| m.get("status").and_then(Value::as_str))
            .collect()
    }

    /// The error reported along the way, if any state failed.
    pub fn error(&self) -> Option<&str> {
        self.trail
            .iter()
            .find_map(|m| m.get("error").and_then(Value::as_str))
    }
}

/// Drives states one at a time until a handler asks to stop.
pub struct StateMachine<'a> {
    ctx: &'a AgentContext,
}

impl<'a> StateMachine<'a> {
    pub fn new(ctx: &'a AgentContext) -> Self {
        Self { ctx }
    }

    pub fn run(&self, initial: State) -> RunReport {
        let mut trail = Vec::new();
        let mut current = initial;

        loop {
            let snapshot = current.to_map();
            debug!("Handling state {:?}", snapshot);
            let from = current.status();
            trail.push(snapshot);

            let (next, interrupted) = current.handle(self.ctx);
            info!("State transition: {} -> {}", from, next.status());

            if interrupted {
                debug!("Stopping in state '{}'", next.status());
                return RunReport {
                    final_state: next,
                    trail,
                };
            }
            current = next;
        }
    }
}
