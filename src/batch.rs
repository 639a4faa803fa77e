//! The batch loop: discover, convert, verify, dispose, one image at a time.
//!
//! ```text
//! discover(root)                        DirectoryNotFound → abort
//!   │
//!   ├─ confirm "start?"                 no → Declined (abort)
//!   │
//!   └─ for each .iso, in order:
//!        ├─ tool present?               no → ToolNotFound (abort)
//!        ├─ source still there?         no → SourceNotFound (abort)
//!        ├─ output exists → confirm     no → Skipped, next image
//!        ├─ DolphinTool convert         exit ≠ 0 → ConversionFailed
//!        ├─ DolphinTool verify          no marker → VerificationFailed
//!        └─ dispose per outcome policy  failure → DisposalFailed (logged)
//! ```
//!
//! Per-image failures are recorded in the [`JobReport`] and the loop moves on;
//! only the conditions marked "abort" end the run early.

use crate::context::RunContext;
use crate::discovery::discover;
use crate::error::BatchError;
use crate::job::ConversionJob;
use crate::outcome::{disposal_plan, failure_error, ConversionOutcome, JobState};
use crate::output::{BatchReport, DisposalRecord, JobReport, JobStatus};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the whole batch described by `ctx.config`.
///
/// # Returns
/// `Ok(BatchReport)` once every discovered image has been attempted, even if
/// some of them failed (check `report.stats.failed`).
///
/// # Errors
/// Returns `Err(BatchError)` only when the run cannot continue:
/// - input directory missing
/// - DolphinTool missing or not startable
/// - a discovered image vanished before conversion
/// - the operator declined to start, or the prompt itself failed
pub fn run_batch(ctx: &RunContext<'_>) -> Result<BatchReport, BatchError> {
    let total_start = Instant::now();
    let config = ctx.config;
    info!(
        "Starting batch in {} (recurse: {}, compression: {} level {}, block size {})",
        config.input_root.display(),
        config.recurse,
        config.compression.format,
        config.compression.effective_level(),
        config.compression.block_size,
    );

    // ── Step 1: Validate inputs before asking anything ───────────────────
    let sources = discover(&config.input_root, config.recurse)?;
    ctx.invoker.ensure_available()?;

    // ── Step 2: Start-of-run confirmation ────────────────────────────────
    if !config.dry_run && !ctx.confirmer.confirm(&start_prompt(ctx))? {
        info!("Operator declined; nothing was converted");
        return Err(BatchError::Declined);
    }

    ctx.progress.on_batch_start(&config.input_root);

    // ── Step 3: One job at a time, in discovery order ────────────────────
    let mut report = BatchReport::default();
    for (idx, source) in sources.enumerate() {
        let job_num = idx + 1;
        let job = ConversionJob::new(source);
        ctx.progress.on_job_start(job_num, &job);

        let job_report = process_job(ctx, job_num, &job)?;

        ctx.progress.on_job_complete(job_num, &job_report);
        report.push(job_report);
    }

    report.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Batch complete: {} converted, {} failed, {} skipped of {} in {}ms",
        report.stats.converted,
        report.stats.failed,
        report.stats.skipped,
        report.stats.discovered,
        report.stats.total_duration_ms
    );
    ctx.progress.on_batch_complete(&report.stats);

    Ok(report)
}

/// Take one image through conversion, verification and disposal.
///
/// Conversion and verification failures are returned inside the
/// [`JobReport`]; only run-ending conditions come back as `Err`.
pub fn process_job(
    ctx: &RunContext<'_>,
    job_num: usize,
    job: &ConversionJob,
) -> Result<JobReport, BatchError> {
    let config = ctx.config;

    ctx.invoker.ensure_available()?;
    if !job.source().is_file() {
        return Err(BatchError::SourceNotFound {
            path: job.source().to_path_buf(),
        });
    }

    if config.dry_run {
        info!("[dry run] {} → {}", job.source().display(), job.output().display());
        return Ok(JobReport::new(job, JobStatus::Planned));
    }

    if config.confirm_overwrite && job.output().is_file() {
        let prompt = format!("'{}' already exists. Overwrite it?", job.output().display());
        if !ctx.confirmer.confirm(&prompt)? {
            info!("Skipping {}: existing output kept", job.source().display());
            return Ok(JobReport::new(job, JobStatus::Skipped));
        }
    }

    // ── Convert ──────────────────────────────────────────────────────────
    let mut report = JobReport::new(job, JobStatus::ConversionFailed);
    let mut state = JobState::Pending.start();
    ctx.progress.on_stage(job_num, state);
    info!("Converting {}", job.source().display());

    let start = Instant::now();
    let converted = ctx.invoker.convert(job, &config.compression)?;
    report.convert_ms = Some(start.elapsed().as_millis() as u64);
    state = state.after_convert(&converted);

    // ── Verify ───────────────────────────────────────────────────────────
    let last_result = if state == JobState::Verifying {
        ctx.progress.on_stage(job_num, state);
        debug!("Verifying {}", job.output().display());

        let start = Instant::now();
        let verified = ctx.invoker.verify(job.output())?;
        report.verify_ms = Some(start.elapsed().as_millis() as u64);
        state = state.after_verify(&verified);
        verified
    } else {
        converted
    };

    // Both transitions above always land on a terminal state; anything else
    // is treated as an untrusted output.
    let outcome = state.outcome().unwrap_or(ConversionOutcome::VerificationFailed);
    report.status = outcome.into();

    match failure_error(outcome, &last_result) {
        Some(err) => {
            warn!("{}: {}", job.source().display(), err);
            ctx.progress.on_job_error(job_num, job, &err);
            report.errors.push(err);
        }
        None => info!("Converted {} → {}", job.source().display(), job.output().display()),
    }

    // ── Dispose ──────────────────────────────────────────────────────────
    // Only a regular file at the output path is ours to discard; a directory
    // with that name is left alone.
    let plan = disposal_plan(outcome, job, config.trash_on_success, job.output().is_file());
    if let Some(plan) = plan {
        match ctx.disposer.dispose(&plan.path, plan.reason) {
            Ok(()) => {
                ctx.progress.on_disposal(&plan.path, plan.reason);
                report.disposals.push(DisposalRecord {
                    path: plan.path,
                    reason: plan.reason,
                });
            }
            Err(err) => {
                warn!("{}", err);
                ctx.progress.on_job_error(job_num, job, &err);
                report.errors.push(err);
            }
        }
    }

    Ok(report)
}

fn start_prompt(ctx: &RunContext<'_>) -> String {
    let config = ctx.config;
    let scope = if config.recurse { " and its subfolders" } else { "" };
    let trash = if config.trash_on_success {
        ", moving each verified source image to the trash"
    } else {
        ""
    };
    format!(
        "Convert every .iso in '{}'{} to RVZ ({} level {}, {} blocks){}?",
        config.input_root.display(),
        scope,
        config.compression.format,
        config.compression.effective_level(),
        config.compression.block_size,
        trash,
    )
}
