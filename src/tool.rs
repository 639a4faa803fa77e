//! DolphinTool invocation: the only place that builds command lines.
//!
//! [`ToolInvoker`] has one method per DolphinTool sub-command. Each takes
//! typed parameters and returns a [`ProcessResult`]; argument formatting
//! (including the block size, which DolphinTool wants as a plain byte count)
//! happens here and nowhere else.
//!
//! Both calls block until the child exits. `Command::output` drains stdout
//! and stderr concurrently, so a chatty child can never stall on a full pipe.

use crate::config::{BatchConfig, CompressionSettings, TARGET_FORMAT};
use crate::error::BatchError;
use crate::job::ConversionJob;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Instant;
use tracing::debug;

/// Exit status and captured output of one child process.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessResult {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// `true` only for exit code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<Output> for ProcessResult {
    fn from(out: Output) -> Self {
        Self {
            exit_code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
    }
}

/// The two DolphinTool sub-commands the batch loop needs.
///
/// Implementations must block until the child has exited.
pub trait ToolInvoker {
    /// Run `convert` for `job` with the given compression.
    fn convert(
        &self,
        job: &ConversionJob,
        compression: &CompressionSettings,
    ) -> Result<ProcessResult, BatchError>;

    /// Run `verify` against a freshly written RVZ.
    fn verify(&self, output: &Path) -> Result<ProcessResult, BatchError>;

    /// Confirm the tool is still runnable. Called once per job.
    fn ensure_available(&self) -> Result<(), BatchError> {
        Ok(())
    }
}

/// Argument list for `DolphinTool convert`.
pub fn convert_args(job: &ConversionJob, compression: &CompressionSettings) -> Vec<OsString> {
    vec![
        "convert".into(),
        format!("--format={TARGET_FORMAT}").into(),
        prefixed("--input=", job.source()),
        prefixed("--output=", job.output()),
        format!("--block_size={}", compression.block_size.bytes()).into(),
        format!("--compression={}", compression.format.as_str()).into(),
        format!("--compression_level={}", compression.effective_level()).into(),
    ]
}

/// Argument list for `DolphinTool verify`.
pub fn verify_args(output: &Path) -> Vec<OsString> {
    vec!["verify".into(), prefixed("--input=", output)]
}

// Paths are appended as OsStr so non-UTF-8 file names survive intact.
fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path.as_os_str());
    arg
}

/// [`ToolInvoker`] backed by a real DolphinTool executable.
#[derive(Debug, Clone)]
pub struct DolphinTool {
    path: PathBuf,
}

impl DolphinTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The executable named by `config.tool_path`.
    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(&config.tool_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run(&self, args: Vec<OsString>) -> Result<ProcessResult, BatchError> {
        self.ensure_available()?;
        debug!("Running {} {:?}", self.path.display(), args);

        let start = Instant::now();
        let output = Command::new(&self.path)
            .args(&args)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => BatchError::ToolNotFound {
                    path: self.path.clone(),
                },
                _ => BatchError::Spawn {
                    path: self.path.clone(),
                    source: e,
                },
            })?;

        let result = ProcessResult::from(output);
        debug!(
            "{} exited with {:?} after {}ms",
            self.path.display(),
            result.exit_code,
            start.elapsed().as_millis()
        );
        Ok(result)
    }
}

impl ToolInvoker for DolphinTool {
    fn convert(
        &self,
        job: &ConversionJob,
        compression: &CompressionSettings,
    ) -> Result<ProcessResult, BatchError> {
        self.run(convert_args(job, compression))
    }

    fn verify(&self, output: &Path) -> Result<ProcessResult, BatchError> {
        self.run(verify_args(output))
    }

    fn ensure_available(&self) -> Result<(), BatchError> {
        if !self.path.is_file() {
            return Err(BatchError::ToolNotFound {
                path: self.path.clone(),
            });
        }
        Ok(())
    }
}
