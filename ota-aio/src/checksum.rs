// ota-aio/src/checksum.rs
use std::path::Path;

use ota_common::error::{OtaError, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Verifies the SHA256 checksum of a file.
pub fn verify_checksum_sync(path: &Path, expected: &str) -> Result<()> {
    debug!("Verifying checksum for: {}", path.display());
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let mut hasher = Sha256::new();
    let bytes_copied = std::io::copy(&mut reader, &mut hasher)?;
    let actual = hex::encode(hasher.finalize());

    debug!("Calculated SHA256: {} ({} bytes read)", actual, bytes_copied);
    debug!("Expected SHA256:   {}", expected);

    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(OtaError::ChecksumError(format!(
            "Checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        )))
    }
}
