// ota-aio/src/lib.rs
//! IO leaves for the ota agent: external command execution, MTD device
//! classification and payload checksums.

pub mod checksum;
pub mod mtd;
pub mod process;

pub use checksum::verify_checksum_sync;
pub use mtd::{MtdUtils, SysfsMtdUtils};
pub use process::{CmdLine, CommandExecutor};
