//! # iso2rvz
//!
//! Batch-convert GameCube / Wii disc images from `.iso` to Dolphin's
//! compressed RVZ container by driving the `DolphinTool` command-line
//! utility, verifying every result, and optionally moving the originals to
//! the trash.
//!
//! This crate does no disc-image or compression work itself. It finds the
//! images, runs `DolphinTool convert` and `DolphinTool verify` for each one,
//! and decides what to keep based on what the tool reports.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input dir
//!  │
//!  ├─ 1. Discover  every *.iso (case-insensitive), optionally recursive
//!  ├─ 2. Convert   DolphinTool convert --format=rvz …   (blocking)
//!  ├─ 3. Verify    DolphinTool verify --input=…          (blocking)
//!  ├─ 4. Decide    outcome policy → what to dispose of
//!  └─ 5. Dispose   move to trash (never a hard delete)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iso2rvz::{run_batch, AssumeYes, BatchConfig, DolphinTool, RunContext, SystemTrash};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tool_path = dolphin_tool_locate::locate()?;
//!     let config = BatchConfig::builder("/games/wii", &tool_path)
//!         .recurse(true)
//!         .trash_on_success(true)
//!         .build()?;
//!
//!     let tool = DolphinTool::from_config(&config);
//!     let report = run_batch(&RunContext::new(&config, &tool, &AssumeYes, &SystemTrash))?;
//!     eprintln!("{} converted, {} failed", report.stats.converted, report.stats.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `iso2rvz` binary (clap + anyhow + tracing-subscriber + indicatif + dialoguer) |
//!
//! ## Choosing compression
//!
//! | Compressor | Levels | Notes |
//! |------------|--------|-------|
//! | `zstd`     | 1–22   | Default (level 5). Fast to decompress; what Dolphin recommends |
//! | `lzma2`    | 1–9    | Smaller files, much slower to convert |
//! | `lzma`     | 1–9    | As lzma2, single-threaded in Dolphin |
//! | `bzip2`    | 1–9    | Rarely worth it |
//! | `none`     | —      | Junk-data removal only |
//!
//! Block sizes are powers of two from 32 KiB to 2 MiB (default 128 KiB).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod confirm;
pub mod context;
pub mod discovery;
pub mod dispose;
pub mod error;
pub mod job;
pub mod outcome;
pub mod output;
pub mod progress;
pub mod tool;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{process_job, run_batch};
pub use config::{BatchConfig, BatchConfigBuilder, BlockSize, CompressionFormat, CompressionSettings};
pub use confirm::{AssumeYes, Confirmer, ScriptedConfirmer};
pub use context::RunContext;
pub use discovery::{discover, SourceFiles};
pub use dispose::{DisposalReason, Disposer, SystemTrash, TrashDirectory};
pub use error::{BatchError, JobError};
pub use job::ConversionJob;
pub use outcome::{ConversionOutcome, JobState, VERIFY_SUCCESS_MARKER};
pub use output::{BatchReport, BatchStats, DisposalRecord, JobReport, JobStatus};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use tool::{DolphinTool, ProcessResult, ToolInvoker};
