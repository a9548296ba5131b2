// ota-common/src/model/metadata.rs
//! Update package description as delivered alongside the payloads.

use serde::{Deserialize, Serialize};

use crate::error::{OtaError, Result};

/// One installable object. `mode` selects the install mode, the remaining
/// fields are read by that mode's backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObjectMetadata {
    pub mode: String,
    #[serde(default)]
    pub target_type: String,
    #[serde(default)]
    pub target: String,
    pub sha256sum: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: u64,
}

impl ObjectMetadata {
    /// Checks the fields that end up in paths and command lines: the
    /// sha256sum must be 64 hex digits and the filename a bare file name.
    pub fn validate(&self) -> Result<()> {
        let sha = &self.sha256sum;
        if sha.len() != 64 || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(OtaError::Metadata(format!(
                "invalid sha256sum '{}': expected 64 hex digits",
                self.sha256sum
            )));
        }
        if !self.filename.is_empty() && !is_bare_file_name(&self.filename) {
            return Err(OtaError::Metadata(format!(
                "invalid filename '{}': must not contain path separators or '..'",
                self.filename
            )));
        }
        Ok(())
    }
}

fn is_bare_file_name(name: &str) -> bool {
    name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\'])
        && !name.contains(char::is_whitespace)
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateMetadata {
    pub product_uid: String,
    pub version: String,
    /// One object set per installation slot.
    #[serde(default)]
    pub objects: Vec<Vec<ObjectMetadata>>,
}

impl UpdateMetadata {
    pub fn from_json(raw: &str) -> Result<Self> {
        let metadata: Self = serde_json::from_str(raw)?;
        metadata.validate()?;
        Ok(metadata)
    }

    pub fn validate(&self) -> Result<()> {
        if self.objects.is_empty() {
            return Err(OtaError::Metadata(format!(
                "update {} for product '{}' carries no objects",
                self.version, self.product_uid
            )));
        }
        self.objects.iter().flatten().try_for_each(ObjectMetadata::validate)
    }

    /// Object set to write into `slot`. Single-set packages apply to any slot.
    pub fn objects_for_slot(&self, slot: usize) -> Result<&[ObjectMetadata]> {
        match self.objects.len() {
            0 => Err(OtaError::Metadata("update carries no objects".to_string())),
            1 => Ok(&self.objects[0]),
            n => self.objects.get(slot).map(Vec::as_slice).ok_or_else(|| {
                OtaError::Metadata(format!(
                    "update has {n} object sets, none for slot {slot}"
                ))
            }),
        }
    }
}
