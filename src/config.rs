//! Configuration types for ISO-to-RVZ batch conversion.
//!
//! All run behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. The configuration is supplied once at start-up and
//! never changes during a run.

use crate::error::BatchError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Extension of the disc images consumed as input (compared case-insensitively).
pub const SOURCE_EXTENSION: &str = "iso";

/// Container format produced by DolphinTool, also the output extension.
pub const TARGET_FORMAT: &str = "rvz";

/// Configuration for a batch conversion run.
///
/// # Example
/// ```rust
/// use iso2rvz::{BatchConfig, BlockSize, CompressionFormat};
///
/// let config = BatchConfig::builder("/games", "/usr/bin/dolphin-tool")
///     .recurse(true)
///     .compression(CompressionFormat::Zstd)
///     .level(19)
///     .block_size(BlockSize::from_kib(128))
///     .build()
///     .unwrap();
/// assert!(config.recurse);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Path to the DolphinTool executable.
    ///
    /// The batch loop runs whatever [`ToolInvoker`](crate::tool::ToolInvoker)
    /// its context holds; build it with
    /// [`DolphinTool::from_config`](crate::tool::DolphinTool::from_config)
    /// so this field and the executable actually run are the same path.
    pub tool_path: PathBuf,

    /// Directory searched for `.iso` files.
    pub input_root: PathBuf,

    /// Descend into subdirectories of `input_root`. Default: false.
    pub recurse: bool,

    /// Ask before overwriting an `.rvz` that already exists. Default: true.
    ///
    /// When disabled, existing outputs are overwritten silently.
    pub confirm_overwrite: bool,

    /// Move the source `.iso` to the trash after a verified conversion. Default: false.
    pub trash_on_success: bool,

    /// Compression passed to `DolphinTool convert`.
    pub compression: CompressionSettings,

    /// Discover and plan only; never run DolphinTool or touch files. Default: false.
    pub dry_run: bool,
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder(input_root: impl Into<PathBuf>, tool_path: impl Into<PathBuf>) -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: BatchConfig {
                tool_path: tool_path.into(),
                input_root: input_root.into(),
                recurse: false,
                confirm_overwrite: true,
                trash_on_success: false,
                compression: CompressionSettings::default(),
                dry_run: false,
            },
        }
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn recurse(mut self, v: bool) -> Self {
        self.config.recurse = v;
        self
    }

    pub fn confirm_overwrite(mut self, v: bool) -> Self {
        self.config.confirm_overwrite = v;
        self
    }

    pub fn trash_on_success(mut self, v: bool) -> Self {
        self.config.trash_on_success = v;
        self
    }

    pub fn compression(mut self, format: CompressionFormat) -> Self {
        self.config.compression.format = format;
        self
    }

    pub fn level(mut self, level: i32) -> Self {
        self.config.compression.level = level;
        self
    }

    pub fn block_size(mut self, size: BlockSize) -> Self {
        self.config.compression.block_size = size;
        self
    }

    pub fn dry_run(mut self, v: bool) -> Self {
        self.config.dry_run = v;
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Path existence is not checked here; the input root is checked by
    /// discovery and the tool path before every invocation.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = &self.config;
        if c.tool_path.as_os_str().is_empty() {
            return Err(BatchError::InvalidConfig("tool path is empty".into()));
        }
        if c.input_root.as_os_str().is_empty() {
            return Err(BatchError::InvalidConfig("input directory is empty".into()));
        }
        c.compression.validate()?;
        Ok(self.config)
    }
}

// ── Compression ──────────────────────────────────────────────────────────────

/// Compression settings for the RVZ container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionSettings {
    /// Compressor used for RVZ chunks. Default: zstd.
    pub format: CompressionFormat,

    /// Compressor level. Default: 5. Ignored (sent as 0) for `none`.
    pub level: i32,

    /// RVZ chunk size. Default: 128 KiB.
    pub block_size: BlockSize,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            format: CompressionFormat::Zstd,
            level: 5,
            block_size: BlockSize::DEFAULT,
        }
    }
}

impl CompressionSettings {
    /// The level actually passed to DolphinTool.
    pub fn effective_level(&self) -> i32 {
        match self.format.level_range() {
            Some(_) => self.level,
            None => 0,
        }
    }

    /// Check level and block size against what RVZ accepts.
    pub fn validate(&self) -> Result<(), BatchError> {
        if let Some(range) = self.format.level_range() {
            if !range.contains(&self.level) {
                return Err(BatchError::InvalidConfig(format!(
                    "{} level must be {}–{}, got {}",
                    self.format,
                    range.start(),
                    range.end(),
                    self.level
                )));
            }
        }
        self.block_size.validate()
    }
}

/// Compressors supported by the RVZ container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionFormat {
    /// Store chunks uncompressed.
    None,
    /// Zstandard. (default)
    #[default]
    Zstd,
    Bzip2,
    Lzma,
    Lzma2,
}

impl CompressionFormat {
    pub const ALL: [CompressionFormat; 5] = [
        CompressionFormat::None,
        CompressionFormat::Zstd,
        CompressionFormat::Bzip2,
        CompressionFormat::Lzma,
        CompressionFormat::Lzma2,
    ];

    /// Name understood by `DolphinTool convert --compression=`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionFormat::None => "none",
            CompressionFormat::Zstd => "zstd",
            CompressionFormat::Bzip2 => "bzip2",
            CompressionFormat::Lzma => "lzma",
            CompressionFormat::Lzma2 => "lzma2",
        }
    }

    /// Accepted levels, or `None` when the format has no level.
    pub fn level_range(&self) -> Option<RangeInclusive<i32>> {
        match self {
            CompressionFormat::None => None,
            CompressionFormat::Zstd => Some(1..=22),
            CompressionFormat::Bzip2 | CompressionFormat::Lzma | CompressionFormat::Lzma2 => Some(1..=9),
        }
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionFormat {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        CompressionFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                BatchError::InvalidConfig(format!(
                    "unknown compression '{s}' (expected none, zstd, bzip2, lzma or lzma2)"
                ))
            })
    }
}

// ── Block size ───────────────────────────────────────────────────────────────

/// RVZ chunk size in bytes.
///
/// DolphinTool takes a plain byte count; this type owns the parsing of
/// human-friendly sizes (`128K`, `2MiB`) and the RVZ constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockSize(u32);

impl BlockSize {
    pub const MIN: BlockSize = BlockSize(32 * 1024);
    pub const MAX: BlockSize = BlockSize(2 * 1024 * 1024);
    pub const DEFAULT: BlockSize = BlockSize(128 * 1024);

    pub const fn from_bytes(bytes: u32) -> Self {
        BlockSize(bytes)
    }

    pub const fn from_kib(kib: u32) -> Self {
        BlockSize(kib * 1024)
    }

    pub const fn bytes(&self) -> u32 {
        self.0
    }

    /// RVZ needs a power of two between 32 KiB and 2 MiB.
    pub fn validate(&self) -> Result<(), BatchError> {
        if !self.0.is_power_of_two() || *self < Self::MIN || *self > Self::MAX {
            return Err(BatchError::InvalidConfig(format!(
                "block size must be a power of two between {} and {}, got {} bytes",
                Self::MIN,
                Self::MAX,
                self.0
            )));
        }
        Ok(())
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MIB: u32 = 1024 * 1024;
        match self.0 {
            b if b >= MIB && b % MIB == 0 => write!(f, "{} MiB", b / MIB),
            b if b >= 1024 && b % 1024 == 0 => write!(f, "{} KiB", b / 1024),
            b => write!(f, "{b} B"),
        }
    }
}

static RE_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\d+)\s*(?:([kmg])(?:i?b)?|b)?\s*$").unwrap());

impl FromStr for BlockSize {
    type Err = BatchError;

    /// Parse `131072`, `128K`, `128KiB`, `128kb`, `2M`, `2MiB`. Units are binary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BatchError::InvalidConfig(format!("invalid block size '{s}'"));
        let caps = RE_SIZE.captures(s).ok_or_else(invalid)?;
        let value: u64 = caps[1].parse().map_err(|_| invalid())?;
        let shift = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
            None => 0,
            Some(u) if u == "k" => 10,
            Some(u) if u == "m" => 20,
            Some(_) => 30,
        };
        let bytes = value
            .checked_mul(1u64 << shift)
            .and_then(|b| u32::try_from(b).ok())
            .ok_or_else(invalid)?;
        Ok(BlockSize(bytes))
    }
}

// ── Paths ────────────────────────────────────────────────────────────────────

/// `true` if `path` has the source extension, ignoring ASCII case.
pub fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(SOURCE_EXTENSION))
}
