// ota/src/agent.rs
//! Wiring of the real collaborators and the blocking driver.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use ota_aio::CmdLine;
use ota_common::config::Config;
use ota_common::error::{OtaError, Result};
use ota_core::installmodes::{default_registry, InstallEnv};
use ota_core::{
    AgentContext, CommandActivation, CommandRebooter, LocalDirectorySource, RunReport, State,
    StateMachine,
};
use tracing::{debug, warn};

pub fn build_context(config: &Config) -> AgentContext {
    let env = InstallEnv::system(&config.download_dir, &config.fs_root);
    let registry = default_registry(&env);
    debug!("Install modes available: {:?}", registry.names());

    let executor = Arc::new(CmdLine::new());
    AgentContext::new(
        registry,
        Box::new(CommandActivation::new(
            config.activate_command.clone(),
            config.inactive_slot,
            executor.clone(),
        )),
        Box::new(CommandRebooter::new(config.reboot_command.clone(), executor)),
        Box::new(LocalDirectorySource::from_config(config)),
    )
}

/// Runs the state machine on a blocking thread until it stops. Ctrl-C
/// requests cancellation; the current step still runs to completion.
pub async fn drive(ctx: AgentContext, initial: State) -> Result<RunReport> {
    ctx.registry.check_requirements()?;

    let cancel = ctx.cancel_handle();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let report = tokio::task::spawn_blocking(move || StateMachine::new(&ctx).run(initial))
        .await
        .map_err(|e| OtaError::UpdateFailed(format!("state machine task failed: {e}")));
    signal_task.abort();

    let report = report?;
    for snapshot in &report.trail {
        println!("{}", serde_json::Value::Object(snapshot.clone()));
    }
    if let Some(message) = report.error() {
        return Err(OtaError::UpdateFailed(message.to_string()));
    }
    Ok(report)
}
