// ota-common/src/model/mod.rs
pub mod metadata;

// Re-export
pub use metadata::{ObjectMetadata, UpdateMetadata};
