// ota-core/src/state/installing.rs
use ota_common::error::Result;
use ota_common::model::{ObjectMetadata, UpdateMetadata};
use tracing::{debug, info, instrument, warn};

use super::State;
use crate::context::AgentContext;

pub(super) fn handle(metadata: UpdateMetadata, ctx: &AgentContext) -> (State, bool) {
    match install_objects(&metadata, ctx) {
        Ok(true) => (State::Installed(metadata), false),
        Ok(false) => (State::Idle, true),
        Err(e) => (State::error(e, Some(metadata)), false),
    }
}

/// Installs the object set for the inactive slot, one object at a time.
/// Returns `false` if cancelled between objects.
fn install_objects(metadata: &UpdateMetadata, ctx: &AgentContext) -> Result<bool> {
    let slot = ctx.activation.inactive_slot()?;
    let objects = metadata.objects_for_slot(slot)?;
    info!(
        "Installing update {} ({} objects) into slot {}",
        metadata.version,
        objects.len(),
        slot
    );

    for (index, object) in objects.iter().enumerate() {
        if ctx.is_cancelled() {
            info!("Cancelled after {} of {} objects", index, objects.len());
            return Ok(false);
        }
        install_object(object, ctx)?;
    }
    Ok(true)
}

#[instrument(skip_all, fields(mode = %object.mode, sha256sum = %object.sha256sum))]
fn install_object(object: &ObjectMetadata, ctx: &AgentContext) -> Result<()> {
    let mut mode = ctx.registry.get_object(&object.mode)?;
    mode.load(object)?;

    let result = mode.setup().and_then(|()| mode.install());

    match (mode.cleanup(), &result) {
        (Err(e), Ok(())) => return Err(e),
        (Err(e), Err(_)) => warn!("Cleanup after failed install also failed: {}", e),
        (Ok(()), _) => debug!("Cleanup of '{}' done", mode.name()),
    }
    result
}
