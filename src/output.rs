//! Result types for a batch run.
//!
//! Every discovered image gets a [`JobReport`], whatever happened to it;
//! [`BatchReport`] collects them together with aggregate [`BatchStats`].
//! All types serialise to JSON for `--json` output.

use crate::dispose::DisposalReason;
use crate::error::JobError;
use crate::job::ConversionJob;
use crate::outcome::ConversionOutcome;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Final status of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Converted and verified.
    Converted,
    ConversionFailed,
    VerificationFailed,
    /// Operator declined to overwrite an existing output.
    Skipped,
    /// Dry run: would have been converted.
    Planned,
}

impl From<ConversionOutcome> for JobStatus {
    fn from(outcome: ConversionOutcome) -> Self {
        match outcome {
            ConversionOutcome::Success => JobStatus::Converted,
            ConversionOutcome::ConversionFailed => JobStatus::ConversionFailed,
            ConversionOutcome::VerificationFailed => JobStatus::VerificationFailed,
        }
    }
}

impl JobStatus {
    pub fn is_failure(self) -> bool {
        matches!(self, JobStatus::ConversionFailed | JobStatus::VerificationFailed)
    }
}

/// A file that was moved to the trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposalRecord {
    pub path: PathBuf,
    pub reason: DisposalReason,
}

/// What happened to one discovered image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub status: JobStatus,

    /// Conversion/verification failure and any disposal failure, in order.
    pub errors: Vec<JobError>,

    /// Files successfully moved to the trash for this job.
    pub disposals: Vec<DisposalRecord>,

    /// Wall-clock time of `DolphinTool convert`, if it ran.
    pub convert_ms: Option<u64>,

    /// Wall-clock time of `DolphinTool verify`, if it ran.
    pub verify_ms: Option<u64>,
}

impl JobReport {
    pub fn new(job: &ConversionJob, status: JobStatus) -> Self {
        Self {
            source: job.source().to_path_buf(),
            output: job.output().to_path_buf(),
            status,
            errors: Vec::new(),
            disposals: Vec::new(),
            convert_ms: None,
            verify_ms: None,
        }
    }

    pub fn disposal_failed(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, JobError::DisposalFailed { .. }))
    }
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Images found under the input root.
    pub discovered: usize,
    pub converted: usize,
    /// Conversion plus verification failures.
    pub failed: usize,
    pub skipped: usize,
    pub planned: usize,
    /// Jobs where a trash move did not succeed.
    pub disposal_failures: usize,
    pub total_duration_ms: u64,
}

impl BatchStats {
    fn record(&mut self, report: &JobReport) {
        self.discovered += 1;
        match report.status {
            JobStatus::Converted => self.converted += 1,
            JobStatus::ConversionFailed | JobStatus::VerificationFailed => self.failed += 1,
            JobStatus::Skipped => self.skipped += 1,
            JobStatus::Planned => self.planned += 1,
        }
        if report.disposal_failed() {
            self.disposal_failures += 1;
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub jobs: Vec<JobReport>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub fn push(&mut self, report: JobReport) {
        self.stats.record(&report);
        self.jobs.push(report);
    }

    /// `true` when every attempted job converted cleanly and every
    /// requested disposal went through.
    pub fn all_succeeded(&self) -> bool {
        self.stats.failed == 0 && self.stats.disposal_failures == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_follow_statuses() {
        let mut report = BatchReport::default();
        let job = ConversionJob::new("/d/a.iso");

        report.push(JobReport::new(&job, JobStatus::Converted));
        report.push(JobReport::new(&job, JobStatus::ConversionFailed));
        report.push(JobReport::new(&job, JobStatus::VerificationFailed));
        report.push(JobReport::new(&job, JobStatus::Skipped));

        let mut with_disposal_error = JobReport::new(&job, JobStatus::Converted);
        with_disposal_error.errors.push(JobError::DisposalFailed {
            path: job.source().to_path_buf(),
            reason: DisposalReason::TrashConvertedSource,
            detail: "locked".into(),
        });
        report.push(with_disposal_error);

        assert_eq!(
            report.stats,
            BatchStats {
                discovered: 5,
                converted: 2,
                failed: 2,
                skipped: 1,
                planned: 0,
                disposal_failures: 1,
                total_duration_ms: 0,
            }
        );
        assert!(!report.all_succeeded());
    }

    #[test]
    fn serialises_to_json() {
        let mut report = BatchReport::default();
        let mut job = JobReport::new(&ConversionJob::new("/d/a.iso"), JobStatus::Converted);
        job.disposals.push(DisposalRecord {
            path: PathBuf::from("/d/a.iso"),
            reason: DisposalReason::TrashConvertedSource,
        });
        report.push(job);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status\":\"converted\""), "got: {json}");
        assert!(json.contains("TrashConvertedSource"), "got: {json}");
        assert!(json.contains("\"discovered\":1"), "got: {json}");
    }

    #[test]
    fn outcome_maps_to_status() {
        assert_eq!(JobStatus::from(ConversionOutcome::Success), JobStatus::Converted);
        assert!(JobStatus::from(ConversionOutcome::ConversionFailed).is_failure());
        assert!(JobStatus::from(ConversionOutcome::VerificationFailed).is_failure());
        assert!(!JobStatus::Skipped.is_failure());
    }
}
