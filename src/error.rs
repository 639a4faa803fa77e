//! Error types for the iso2rvz library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BatchError`] (**fatal**): the run cannot proceed at all (input
//!   directory missing, DolphinTool missing, operator declined). Returned as
//!   `Err(BatchError)` from [`crate::batch::run_batch`].
//!
//! * [`JobError`] (**non-fatal**): a single file failed to convert or verify,
//!   or its clean-up could not be completed. Stored inside
//!   [`crate::output::JobReport`] and the loop moves on to the next file.

use std::path::PathBuf;
use thiserror::Error;

use crate::dispose::DisposalReason;

/// All fatal errors returned by the iso2rvz library.
///
/// Per-file failures use [`JobError`] and are stored in
/// [`crate::output::JobReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The input root does not exist or is not a directory.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is a directory.")]
    DirectoryNotFound { path: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Tool errors ───────────────────────────────────────────────────────
    /// The DolphinTool executable is missing.
    #[error("DolphinTool not found at '{path}'\nPass the executable with --tool or set DOLPHIN_TOOL_PATH.")]
    ToolNotFound { path: PathBuf },

    /// The OS refused to start the tool process.
    #[error("Failed to start '{path}': {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// A discovered source file disappeared before it could be converted.
    #[error("Source image vanished before conversion: '{path}'")]
    SourceNotFound { path: PathBuf },

    // ── Operator errors ───────────────────────────────────────────────────
    /// The operator answered "no" to the start-of-run confirmation.
    #[error("Aborted: operator declined to start the conversion")]
    Declined,

    /// Reading the operator's answer failed (closed stdin, no terminal).
    #[error("Confirmation prompt failed: {0}")]
    Prompt(String),
}

/// A non-fatal error for a single conversion job.
///
/// Carries the captured output of the failing DolphinTool stage so the
/// operator can see why a file was rejected.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum JobError {
    /// `DolphinTool convert` exited with a nonzero status (or by signal).
    #[error("conversion failed ({}){}", exit_label(.exit_code), diagnostics(.stdout, .stderr))]
    ConversionFailed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// `DolphinTool verify` did not report a clean image.
    #[error("verification failed ({}){}", exit_label(.exit_code), diagnostics(.stdout, .stderr))]
    VerificationFailed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Moving a file to the trash failed (file locked, no trash available).
    #[error("could not {reason} '{path}': {detail}")]
    DisposalFailed {
        path: PathBuf,
        reason: DisposalReason,
        detail: String,
    },
}

impl JobError {
    /// Captured standard output of the failing stage, if any.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            JobError::ConversionFailed { stdout, .. } | JobError::VerificationFailed { stdout, .. } => {
                Some(stdout)
            }
            JobError::DisposalFailed { .. } => None,
        }
    }

    /// Captured standard error of the failing stage, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            JobError::ConversionFailed { stderr, .. } | JobError::VerificationFailed { stderr, .. } => {
                Some(stderr)
            }
            JobError::DisposalFailed { .. } => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

fn diagnostics(stdout: &str, stderr: &str) -> String {
    let mut out = String::new();
    if !stdout.trim().is_empty() {
        out.push_str("\n--- stdout ---\n");
        out.push_str(stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        out.push_str("\n--- stderr ---\n");
        out.push_str(stderr.trim_end());
    }
    out
}
