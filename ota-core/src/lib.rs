// ota-core/src/lib.rs

pub mod activation;
pub mod context;
pub mod installmodes;
pub mod source;
pub mod state;

// Re-export key types for easier use by the binary
pub use activation::{Activation, CommandActivation, CommandRebooter, Rebooter};
pub use context::AgentContext;
pub use installmodes::{InstallEnv, InstallMode, InstallModeRegistry};
pub use source::{LocalDirectorySource, UpdateSource};
pub use state::{ErrorState, RunReport, State, StateMachine};
