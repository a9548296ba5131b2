// ota-aio/src/process.rs
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use ota_common::error::{OtaError, Result};
use tracing::{debug, error};

/// Runs an external program described by a single command line.
///
/// Implementations split the line into program and arguments on whitespace
/// and return the combined stdout/stderr of a successful run. A program that
/// cannot be found on `$PATH` must be reported as [`OtaError::ToolNotFound`].
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command_line: &str) -> Result<Vec<u8>>;
}

/// System implementation backed by `std::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct CmdLine {
    cwd: Option<PathBuf>,
}

impl CmdLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every command from `dir`. Install modes rely on this to resolve
    /// payloads referenced by their sha256sum.
    pub fn with_cwd(dir: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(dir.into()),
        }
    }
}

/// Splits a command line the way `sh` word-splits an unquoted line.
pub fn split_command_line(command_line: &str) -> Result<(&str, Vec<&str>)> {
    let mut words = command_line.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| OtaError::Config("empty command line".to_string()))?;
    Ok((program, words.collect()))
}

impl CommandExecutor for CmdLine {
    fn execute(&self, command_line: &str) -> Result<Vec<u8>> {
        let (program, args) = split_command_line(command_line)?;
        debug!(
            "Running command: {} {:?} (cwd: {:?})",
            program, args, self.cwd
        );

        let mut cmd = Command::new(program);
        cmd.args(&args);
        if let Some(dir) = &self.cwd {
            // Spawning in a missing cwd also fails with NotFound.
            if !dir.is_dir() {
                error!("Working directory {} does not exist", dir.display());
                return Err(OtaError::Config(format!(
                    "working directory '{}' for '{}' is not a directory",
                    dir.display(),
                    program
                )));
            }
            cmd.current_dir(dir);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(Stdio::null());

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!("Executable '{}' not found", program);
                return Err(OtaError::ToolNotFound(program.to_string()));
            }
            Err(e) => {
                error!("Failed to execute command '{}': {}", command_line, e);
                return Err(OtaError::CommandExecError(format!("{command_line}: {e}")));
            }
        };

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if !output.status.success() {
            let text = String::from_utf8_lossy(&combined).trim().to_string();
            debug!("Command failed with status: {}", output.status);
            if !text.is_empty() {
                debug!("Output:\n{}", text);
            }
            return Err(OtaError::CommandFailed {
                command: command_line.to_string(),
                status: output.status.to_string(),
                output: text,
            });
        }

        debug!("Command finished successfully.");
        Ok(combined)
    }
}
