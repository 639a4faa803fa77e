//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] through
//! [`crate::context::RunContext::with_progress`] to receive events as the
//! batch loop works through each image. The CLI uses this to drive its
//! progress bar and print captured DolphinTool output for failed files.
//!
//! # Example
//!
//! ```rust
//! use iso2rvz::{BatchProgressCallback, JobReport};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     finished: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_job_complete(&self, job_num: usize, report: &JobReport) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("#{job_num} {} → {:?}", report.source.display(), report.status);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { finished: AtomicUsize::new(0) });
//! let _as_dyn: Arc<dyn BatchProgressCallback> = cb;
//! ```

use crate::dispose::DisposalReason;
use crate::error::JobError;
use crate::job::ConversionJob;
use crate::outcome::JobState;
use crate::output::{BatchStats, JobReport};
use std::path::Path;
use std::sync::Arc;

/// Called by the batch loop as it processes each image.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `job_num` is 1-indexed in discovery order.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the input directory has been validated.
    fn on_batch_start(&self, input_root: &Path) {
        let _ = input_root;
    }

    /// Called when a job is created, before any prompt or process.
    fn on_job_start(&self, job_num: usize, job: &ConversionJob) {
        let _ = (job_num, job);
    }

    /// Called on entering `Converting` and `Verifying`.
    fn on_stage(&self, job_num: usize, stage: JobState) {
        let _ = (job_num, stage);
    }

    /// Called for every failure of a job, with DolphinTool's captured output
    /// where there is one. A job can report both a conversion failure and a
    /// failure to discard its output.
    fn on_job_error(&self, job_num: usize, job: &ConversionJob, error: &JobError) {
        let _ = (job_num, job, error);
    }

    /// Called after a file was successfully moved to the trash.
    fn on_disposal(&self, path: &Path, reason: DisposalReason) {
        let _ = (path, reason);
    }

    /// Called once per job when it reaches a final status.
    fn on_job_complete(&self, job_num: usize, report: &JobReport) {
        let _ = (job_num, report);
    }

    /// Called once after the last job.
    fn on_batch_complete(&self, stats: &BatchStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::context::RunContext`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::JobStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        stages: AtomicUsize,
        errors: AtomicUsize,
        completes: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_job_start(&self, _job_num: usize, _job: &ConversionJob) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage(&self, _job_num: usize, _stage: JobState) {
            self.stages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_error(&self, _job_num: usize, _job: &ConversionJob, _error: &JobError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_job_complete(&self, _job_num: usize, _report: &JobReport) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        let job = ConversionJob::new("/data/a.iso");
        cb.on_batch_start(Path::new("/data"));
        cb.on_job_start(1, &job);
        cb.on_stage(1, JobState::Converting);
        cb.on_disposal(job.source(), DisposalReason::TrashConvertedSource);
        cb.on_job_complete(1, &JobReport::new(&job, JobStatus::Converted));
        cb.on_batch_complete(&BatchStats::default());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        let job = ConversionJob::new("/data/a.iso");

        tracker.on_job_start(1, &job);
        tracker.on_stage(1, JobState::Converting);
        tracker.on_stage(1, JobState::Verifying);
        tracker.on_job_error(
            1,
            &job,
            &JobError::VerificationFailed {
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            },
        );
        tracker.on_job_complete(1, &JobReport::new(&job, JobStatus::VerificationFailed));

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.stages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(Path::new("/games"));
    }
}
