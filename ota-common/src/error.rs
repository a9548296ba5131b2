use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum OtaError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("TOML Parsing Error: {0}")]
    Toml(#[from] Arc<toml::de::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Metadata Error: {0}")]
    Metadata(String),

    #[error(
        "target-type '{target_type}' is not supported for the '{handler}' handler. Its value must be either {supported}"
    )]
    UnsupportedTargetType {
        target_type: String,
        handler: &'static str,
        supported: &'static str,
    },

    #[error("Couldn't find a flash device corresponding to the mtdname '{0}'")]
    MtdNameNotFound(String),

    #[error("{0}")]
    DeviceClass(String),

    #[error("exec: \"{0}\": executable file not found in $PATH")]
    ToolNotFound(String),

    #[error("Command '{command}' failed ({status}): {output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("Failed to execute command: {0}")]
    CommandExecError(String),

    #[error("No such install mode: '{0}'")]
    NoSuchInstallMode(String),

    #[error("Activation Error: {0}")]
    Activation(String),

    #[error("DownloadError: {0}")]
    Download(String),

    #[error("Checksum Error: {0}")]
    ChecksumError(String),

    #[error("Update failed: {0}")]
    UpdateFailed(String),
}

impl From<std::io::Error> for OtaError {
    fn from(err: std::io::Error) -> Self {
        OtaError::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for OtaError {
    fn from(err: serde_json::Error) -> Self {
        OtaError::Json(Arc::new(err))
    }
}

impl From<toml::de::Error> for OtaError {
    fn from(err: toml::de::Error) -> Self {
        OtaError::Toml(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, OtaError>;
