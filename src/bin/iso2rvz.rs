//! CLI binary for iso2rvz.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`,
//! wires up the terminal prompt and progress display, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use iso2rvz::{
    run_batch, AssumeYes, BatchConfig, BatchError, BatchProgressCallback, BatchReport, BatchStats,
    BlockSize, CompressionFormat, Confirmer, ConversionJob, DisposalReason, Disposer, DolphinTool,
    JobError, JobReport, JobState, JobStatus, ProgressCallback, RunContext, SystemTrash,
    TrashDirectory,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── Terminal output ──────────────────────────────────────────────────────────

/// Prints per-image lines and DolphinTool diagnostics, above a spinner when
/// one is active.
struct CliProgressCallback {
    /// `None` with `--no-progress` / `--quiet`.
    bar: Option<ProgressBar>,
    /// Suppress everything except failures.
    quiet: bool,
}

impl CliProgressCallback {
    fn new(show_bar: bool, quiet: bool) -> Arc<Self> {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(TICKS),
            );
            bar.set_prefix("Scanning");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self { bar, quiet })
    }

    fn bar(&self) -> Option<&ProgressBar> {
        self.bar.as_ref()
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn seconds(ms: Option<u64>) -> String {
    ms.map(|ms| format!("{:.1}s", ms as f64 / 1000.0))
        .unwrap_or_default()
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, input_root: &Path) {
        if !self.quiet {
            self.println(format!(
                "{} {}",
                cyan("◆"),
                bold(&format!("Converting images in {}", input_root.display()))
            ));
        }
    }

    fn on_job_start(&self, job_num: usize, job: &ConversionJob) {
        if let Some(bar) = self.bar() {
            bar.set_prefix(format!("#{job_num}"));
            bar.set_message(file_name(job.source()));
        }
    }

    fn on_stage(&self, job_num: usize, stage: JobState) {
        if let Some(bar) = self.bar() {
            let label = match stage {
                JobState::Converting => "converting",
                JobState::Verifying => "verifying",
                _ => return,
            };
            bar.set_prefix(format!("#{job_num} {label}"));
        }
    }

    fn on_job_error(&self, job_num: usize, job: &ConversionJob, error: &JobError) {
        self.println(format!(
            "  {} #{job_num} {}  {}",
            red("✗"),
            file_name(job.source()),
            red(&error.to_string()),
        ));
    }

    fn on_disposal(&self, path: &Path, reason: DisposalReason) {
        if !self.quiet {
            self.println(format!("    {} {}", dim("↳ trashed"), dim(&format!("{} ({reason})", path.display()))));
        }
    }

    fn on_job_complete(&self, job_num: usize, report: &JobReport) {
        if self.quiet {
            return;
        }
        let name = file_name(&report.source);
        let line = match report.status {
            JobStatus::Converted => format!(
                "  {} #{job_num} {}  {}",
                green("✓"),
                name,
                dim(&format!("convert {}  verify {}", seconds(report.convert_ms), seconds(report.verify_ms))),
            ),
            JobStatus::Skipped => format!("  {} #{job_num} {}  {}", yellow("–"), name, dim("skipped, output kept")),
            JobStatus::Planned => format!(
                "  {} #{job_num} {} → {}",
                cyan("·"),
                report.source.display(),
                report.output.display()
            ),
            // Already printed with diagnostics by on_job_error.
            JobStatus::ConversionFailed | JobStatus::VerificationFailed => return,
        };
        self.println(line);
    }

    fn on_batch_complete(&self, _stats: &BatchStats) {
        if let Some(bar) = self.bar() {
            bar.finish_and_clear();
        }
    }
}

/// Yes/no prompt on the terminal; pauses the spinner while waiting.
struct TerminalConfirmer {
    bar: Option<ProgressBar>,
}

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> std::result::Result<bool, BatchError> {
        let ask = || {
            Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .map_err(|e| BatchError::Prompt(e.to_string()))
        };
        match &self.bar {
            Some(bar) => bar.suspend(ask),
            None => ask(),
        }
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every .iso in a folder (asks before starting)
  iso2rvz ~/Games/Wii

  # Walk subfolders, trash each ISO once its RVZ verifies, no questions
  iso2rvz -r --trash-source -y ~/Games

  # Smaller files: zstd 19 with 2 MiB blocks
  iso2rvz -c zstd -l 19 -b 2MiB ~/Games/GameCube

  # Keep "trashed" files in a folder instead of the desktop trash
  iso2rvz --trash-source --trash-dir ~/iso-trash ~/Games

  # Show what would be converted
  iso2rvz --dry-run -r ~/Games

  # Machine-readable report
  iso2rvz -y --json ~/Games > report.json

COMPRESSION:
  Compressor  Levels  Notes
  ──────────  ──────  ─────────────────────────────────────────
  zstd        1–22    default (5); fast decompression
  lzma2       1–9     smaller, slow to convert
  lzma        1–9
  bzip2       1–9
  none        —       junk-data removal only

  Block size: power of two from 32KiB to 2MiB (default 128KiB).

ENVIRONMENT VARIABLES:
  DOLPHIN_TOOL_PATH   Path to DolphinTool when --tool is not given
  RUST_LOG            Log filter (overrides --verbose / --quiet)

EXIT STATUS:
  0  every image was attempted (individual failures are reported above)
  1  the run stopped early: bad arguments, DolphinTool missing, or declined
"#;

/// Batch-convert ISO disc images to RVZ with DolphinTool.
#[derive(Parser, Debug)]
#[command(
    name = "iso2rvz",
    version,
    about = "Batch-convert ISO disc images to RVZ with DolphinTool",
    long_about = "Find every .iso under a directory, convert each to Dolphin's RVZ format with \
DolphinTool, verify the result, and optionally move the original to the trash. \
Failed outputs are moved to the trash, never kept.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing .iso files.
    input_dir: PathBuf,

    /// Path to DolphinTool (default: DOLPHIN_TOOL_PATH, PATH, then common install locations).
    #[arg(long, env = "ISO2RVZ_TOOL")]
    tool: Option<PathBuf>,

    /// Also convert images in subdirectories.
    #[arg(short, long, env = "ISO2RVZ_RECURSIVE")]
    recursive: bool,

    /// Overwrite existing .rvz files without asking.
    #[arg(long, env = "ISO2RVZ_NO_OVERWRITE_PROMPT")]
    no_overwrite_prompt: bool,

    /// Move each source .iso to the trash once its RVZ verifies.
    #[arg(long, env = "ISO2RVZ_TRASH_SOURCE")]
    trash_source: bool,

    /// Move disposed files into this directory instead of the system trash.
    #[arg(long, env = "ISO2RVZ_TRASH_DIR")]
    trash_dir: Option<PathBuf>,

    /// Compressor: none, zstd, bzip2, lzma, lzma2.
    #[arg(short, long, env = "ISO2RVZ_COMPRESSION", value_enum, default_value = "zstd")]
    compression: CompressionArg,

    /// Compression level (zstd 1–22, others 1–9; ignored for none).
    #[arg(short, long, env = "ISO2RVZ_LEVEL", default_value_t = 5)]
    level: i32,

    /// RVZ block size: bytes or with unit (32KiB … 2MiB).
    #[arg(short, long, env = "ISO2RVZ_BLOCK_SIZE", default_value = "128KiB")]
    block_size: String,

    /// Answer yes to every prompt.
    #[arg(short, long, env = "ISO2RVZ_YES")]
    yes: bool,

    /// List what would be converted; run nothing, touch nothing.
    #[arg(long)]
    dry_run: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "ISO2RVZ_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "ISO2RVZ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ISO2RVZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except failures.
    #[arg(short, long, env = "ISO2RVZ_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum CompressionArg {
    None,
    Zstd,
    Bzip2,
    Lzma,
    Lzma2,
}

impl From<CompressionArg> for CompressionFormat {
    fn from(v: CompressionArg) -> Self {
        match v {
            CompressionArg::None => CompressionFormat::None,
            CompressionArg::Zstd => CompressionFormat::Zstd,
            CompressionArg::Bzip2 => CompressionFormat::Bzip2,
            CompressionArg::Lzma => CompressionFormat::Lzma,
            CompressionArg::Lzma2 => CompressionFormat::Lzma2,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner and per-file lines cover what INFO logs would say, so
    // library logs are reduced to errors while the spinner is on.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve DolphinTool ──────────────────────────────────────────────
    let tool_path = match cli.tool.clone() {
        Some(path) => path,
        None => dolphin_tool_locate::locate().context("Could not find DolphinTool")?,
    };

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli, &tool_path)?;
    tracing::debug!("{:?}", config);

    let tool = DolphinTool::from_config(&config);
    let disposer: Box<dyn Disposer> = match &cli.trash_dir {
        Some(dir) => Box::new(TrashDirectory::new(dir)),
        None => Box::new(SystemTrash),
    };

    let callback = (!cli.json).then(|| CliProgressCallback::new(show_progress, cli.quiet));
    let confirmer: Box<dyn Confirmer> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirmer {
            bar: callback.as_ref().and_then(|cb| cb.bar.clone()),
        })
    };

    let mut ctx = RunContext::new(&config, &tool, confirmer.as_ref(), disposer.as_ref());
    if let Some(cb) = callback.clone() {
        ctx = ctx.with_progress(cb as ProgressCallback);
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let report = run_batch(&ctx).context("Batch conversion aborted")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "config": config,
            "report": report,
        }))
        .context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, tool_path: &Path) -> Result<BatchConfig> {
    let block_size: BlockSize = cli
        .block_size
        .parse()
        .with_context(|| format!("Invalid --block-size '{}'", cli.block_size))?;

    BatchConfig::builder(&cli.input_dir, tool_path)
        .recurse(cli.recursive)
        .confirm_overwrite(!cli.no_overwrite_prompt)
        .trash_on_success(cli.trash_source)
        .compression(cli.compression.clone().into())
        .level(cli.level)
        .block_size(block_size)
        .dry_run(cli.dry_run)
        .build()
        .context("Invalid configuration")
}

fn print_summary(report: &BatchReport) {
    let s = &report.stats;
    if s.discovered == 0 {
        eprintln!("{} no .iso files found", yellow("⚠"));
        return;
    }
    if s.planned > 0 {
        eprintln!("{} {} images would be converted", cyan("·"), bold(&s.planned.to_string()));
        return;
    }

    let mark = if report.all_succeeded() {
        green("✔")
    } else if s.converted == 0 {
        red("✘")
    } else {
        yellow("⚠")
    };
    eprintln!(
        "{mark} {}/{} converted  {}  {}  {}",
        bold(&s.converted.to_string()),
        s.discovered,
        if s.failed > 0 { red(&format!("{} failed", s.failed)) } else { dim("0 failed") },
        dim(&format!("{} skipped", s.skipped)),
        dim(&format!("{:.1}s", s.total_duration_ms as f64 / 1000.0)),
    );
    if s.disposal_failures > 0 {
        eprintln!(
            "  {} {} files could not be moved to the trash",
            yellow("⚠"),
            s.disposal_failures
        );
    }
}
