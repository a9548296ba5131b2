// ota-core/src/source.rs
use std::fs;
use std::path::PathBuf;

use ota_aio::verify_checksum_sync;
use ota_common::error::{OtaError, Result};
use ota_common::model::UpdateMetadata;
use ota_common::Config;
use tracing::{debug, info, warn};

/// Where updates come from.
pub trait UpdateSource: Send + Sync {
    /// Returns the pending update, if there is one.
    fn probe(&self) -> Result<Option<UpdateMetadata>>;

    /// Makes the objects `metadata` lists for `slot` available to the
    /// install modes.
    fn download(&self, metadata: &UpdateMetadata, slot: usize) -> Result<()>;
}

/// Picks up packages dropped into a local directory: a `metadata.json` plus
/// the object files it references.
///
/// Downloading copies each object into the download directory under its
/// sha256sum and verifies it. The package's metadata is moved along with the
/// objects, so a package is only ever picked up once.
#[derive(Debug, Clone)]
pub struct LocalDirectorySource {
    package_dir: PathBuf,
    download_dir: PathBuf,
}

impl LocalDirectorySource {
    pub fn new(package_dir: impl Into<PathBuf>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            package_dir: package_dir.into(),
            download_dir: download_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.package_dir, &config.download_dir)
    }

    fn metadata_path(&self) -> PathBuf {
        self.package_dir.join("metadata.json")
    }
}

impl UpdateSource for LocalDirectorySource {
    fn probe(&self) -> Result<Option<UpdateMetadata>> {
        let path = self.metadata_path();
        if !path.is_file() {
            debug!("No update package at {}", path.display());
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        let metadata = UpdateMetadata::from_json(&raw)?;
        info!(
            "Found update {} for product {}",
            metadata.version, metadata.product_uid
        );
        Ok(Some(metadata))
    }

    fn download(&self, metadata: &UpdateMetadata, slot: usize) -> Result<()> {
        metadata.validate()?;
        let objects = metadata.objects_for_slot(slot)?;
        fs::create_dir_all(&self.download_dir)?;

        for object in objects {
            let dest = self.download_dir.join(&object.sha256sum);
            if dest.is_file() && verify_checksum_sync(&dest, &object.sha256sum).is_ok() {
                debug!("{} already downloaded", object.sha256sum);
                continue;
            }

            let file_name = if object.filename.is_empty() {
                object.sha256sum.as_str()
            } else {
                object.filename.as_str()
            };
            let src = self.package_dir.join(file_name);
            if !src.is_file() {
                return Err(OtaError::Download(format!(
                    "object '{}' not found in {}",
                    file_name,
                    self.package_dir.display()
                )));
            }

            debug!("Copying {} to {}", src.display(), dest.display());
            fs::copy(&src, &dest)?;
            if let Err(e) = verify_checksum_sync(&dest, &object.sha256sum) {
                if let Err(rm) = fs::remove_file(&dest) {
                    warn!("Failed to remove corrupt {}: {}", dest.display(), rm);
                }
                return Err(e);
            }
        }

        let metadata_path = self.metadata_path();
        fs::rename(&metadata_path, self.download_dir.join("metadata.json"))
            .or_else(|_| {
                fs::copy(&metadata_path, self.download_dir.join("metadata.json"))?;
                fs::remove_file(&metadata_path)
            })?;
        info!("Update {} downloaded for slot {}", metadata.version, slot);
        Ok(())
    }
}
