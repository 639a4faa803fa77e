//! Outcome policy: the per-job state machine and the disposal decision.
//!
//! ```text
//! Pending ──▶ Converting ──┬──▶ ConversionFailed
//!                          └──▶ Verifying ──┬──▶ VerificationFailed
//!                                           └──▶ Success
//! ```
//!
//! Everything here is pure: no I/O, no processes. The batch loop feeds in
//! [`ProcessResult`]s and acts on what comes back.

use crate::dispose::DisposalReason;
use crate::error::JobError;
use crate::job::ConversionJob;
use crate::tool::ProcessResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Substring `DolphinTool verify` prints when the image has no problems.
///
/// Verification is judged on this text alone; the exit code of `verify` is
/// not trusted.
pub const VERIFY_SUCCESS_MARKER: &str = "Problems Found: No";

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Converting,
    Verifying,
    ConversionFailed,
    VerificationFailed,
    Success,
}

impl JobState {
    /// `Pending → Converting`.
    pub fn start(self) -> JobState {
        debug_assert_eq!(self, JobState::Pending, "start() from {self:?}");
        match self {
            JobState::Pending => JobState::Converting,
            other => other,
        }
    }

    /// `Converting → Verifying` on exit code 0, otherwise `ConversionFailed`.
    ///
    /// A clean conversion is never `Success` by itself; it still has to
    /// pass verification.
    pub fn after_convert(self, result: &ProcessResult) -> JobState {
        debug_assert_eq!(self, JobState::Converting, "after_convert() from {self:?}");
        match self {
            JobState::Converting if result.success() => JobState::Verifying,
            JobState::Converting => JobState::ConversionFailed,
            other => other,
        }
    }

    /// `Verifying → Success` when stdout carries the marker, otherwise
    /// `VerificationFailed` (whatever the exit code).
    pub fn after_verify(self, result: &ProcessResult) -> JobState {
        debug_assert_eq!(self, JobState::Verifying, "after_verify() from {self:?}");
        match self {
            JobState::Verifying if verification_passed(result) => JobState::Success,
            JobState::Verifying => JobState::VerificationFailed,
            other => other,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.outcome().is_some()
    }

    /// The outcome of a terminal state; `None` while the job is in flight.
    pub fn outcome(self) -> Option<ConversionOutcome> {
        match self {
            JobState::Success => Some(ConversionOutcome::Success),
            JobState::ConversionFailed => Some(ConversionOutcome::ConversionFailed),
            JobState::VerificationFailed => Some(ConversionOutcome::VerificationFailed),
            JobState::Pending | JobState::Converting | JobState::Verifying => None,
        }
    }
}

/// Final result of a job that ran through DolphinTool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionOutcome {
    Success,
    ConversionFailed,
    VerificationFailed,
}

impl ConversionOutcome {
    pub fn is_success(self) -> bool {
        self == ConversionOutcome::Success
    }
}

/// `true` if the verifier's stdout contains [`VERIFY_SUCCESS_MARKER`].
pub fn verification_passed(result: &ProcessResult) -> bool {
    result.stdout.contains(VERIFY_SUCCESS_MARKER)
}

/// Build the diagnostic for a failed stage from its captured output.
pub fn failure_error(outcome: ConversionOutcome, result: &ProcessResult) -> Option<JobError> {
    let (exit_code, stdout, stderr) = (result.exit_code, result.stdout.clone(), result.stderr.clone());
    match outcome {
        ConversionOutcome::Success => None,
        ConversionOutcome::ConversionFailed => Some(JobError::ConversionFailed {
            exit_code,
            stdout,
            stderr,
        }),
        ConversionOutcome::VerificationFailed => Some(JobError::VerificationFailed {
            exit_code,
            stdout,
            stderr,
        }),
    }
}

/// A file the policy wants gone, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDisposal {
    pub path: PathBuf,
    pub reason: DisposalReason,
}

/// Decide which single file, if any, to dispose of after a job.
///
/// * failure with an output on disk → discard the output
/// * success with `trash_on_success` → move the source to the trash
/// * anything else → keep everything
///
/// A failed job never touches its source, and a successful one never touches
/// its output.
pub fn disposal_plan(
    outcome: ConversionOutcome,
    job: &ConversionJob,
    trash_on_success: bool,
    output_exists: bool,
) -> Option<PlannedDisposal> {
    match outcome {
        ConversionOutcome::ConversionFailed | ConversionOutcome::VerificationFailed if output_exists => {
            Some(PlannedDisposal {
                path: job.output().to_path_buf(),
                reason: DisposalReason::DiscardFailedArtifact,
            })
        }
        ConversionOutcome::Success if trash_on_success => Some(PlannedDisposal {
            path: job.source().to_path_buf(),
            reason: DisposalReason::TrashConvertedSource,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn clean_verify(code: i32) -> ProcessResult {
        ProcessResult::new(code, "Problems Found: No\nHash: abc\n", "")
    }

    #[test]
    fn zero_exit_convert_goes_to_verifying() {
        let s = JobState::Pending.start().after_convert(&ProcessResult::new(0, "", ""));
        assert_eq!(s, JobState::Verifying);
        assert!(!s.is_terminal());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(-1)]
    #[case(255)]
    fn any_nonzero_convert_fails(#[case] code: i32) {
        let s = JobState::Converting.after_convert(&ProcessResult::new(code, "", "boom"));
        assert_eq!(s, JobState::ConversionFailed);
        assert_eq!(s.outcome(), Some(ConversionOutcome::ConversionFailed));
    }

    #[test]
    fn signal_terminated_convert_fails() {
        let killed = ProcessResult {
            exit_code: None,
            ..Default::default()
        };
        assert_eq!(JobState::Converting.after_convert(&killed), JobState::ConversionFailed);
    }

    #[test]
    fn marker_means_success() {
        assert_eq!(JobState::Verifying.after_verify(&clean_verify(0)), JobState::Success);
    }

    #[test]
    fn marker_decides_even_with_nonzero_exit() {
        assert_eq!(JobState::Verifying.after_verify(&clean_verify(3)), JobState::Success);
    }

    #[test]
    fn zero_exit_without_marker_is_verification_failure() {
        let r = ProcessResult::new(0, "Problems Found: Yes\n", "");
        assert_eq!(JobState::Verifying.after_verify(&r), JobState::VerificationFailed);

        let r = ProcessResult::new(0, "", "");
        assert_eq!(JobState::Verifying.after_verify(&r), JobState::VerificationFailed);
    }

    #[test]
    fn marker_on_stderr_does_not_count() {
        let r = ProcessResult::new(0, "", "Problems Found: No");
        assert!(!verification_passed(&r));
    }

    #[test]
    fn failure_error_keeps_streams() {
        let r = ProcessResult::new(1, "out", "err");
        let e = failure_error(ConversionOutcome::ConversionFailed, &r).unwrap();
        assert_eq!(e.stdout(), Some("out"));
        assert_eq!(e.stderr(), Some("err"));
        assert!(failure_error(ConversionOutcome::Success, &r).is_none());
    }

    #[rstest]
    #[case(ConversionOutcome::ConversionFailed, false, true, Some(DisposalReason::DiscardFailedArtifact))]
    #[case(ConversionOutcome::ConversionFailed, true, true, Some(DisposalReason::DiscardFailedArtifact))]
    #[case(ConversionOutcome::ConversionFailed, true, false, None)]
    #[case(ConversionOutcome::VerificationFailed, true, true, Some(DisposalReason::DiscardFailedArtifact))]
    #[case(ConversionOutcome::Success, true, true, Some(DisposalReason::TrashConvertedSource))]
    #[case(ConversionOutcome::Success, false, true, None)]
    fn disposal_targets(
        #[case] outcome: ConversionOutcome,
        #[case] trash_on_success: bool,
        #[case] output_exists: bool,
        #[case] expected: Option<DisposalReason>,
    ) {
        let job = ConversionJob::new("/data/a.iso");
        let plan = disposal_plan(outcome, &job, trash_on_success, output_exists);
        assert_eq!(plan.as_ref().map(|p| p.reason), expected);

        if let Some(plan) = plan {
            match plan.reason {
                DisposalReason::DiscardFailedArtifact => assert_eq!(plan.path, job.output()),
                DisposalReason::TrashConvertedSource => assert_eq!(plan.path, job.source()),
            }
        }
    }
}
