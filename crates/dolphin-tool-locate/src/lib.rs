//! # dolphin-tool-locate
//!
//! Find the [Dolphin](https://dolphin-emu.org/) command-line utility
//! (`DolphinTool` / `dolphin-tool`) on the current machine, so that callers
//! don't have to pass an explicit path on every run.
//!
//! ## How it works
//!
//! On first call to [`locate`]:
//!
//! 1. If `DOLPHIN_TOOL_PATH` is set, that path is used (and must exist).
//! 2. Otherwise every platform executable name is looked up on `PATH`.
//! 3. Otherwise the platform's well-known install locations are probed.
//!
//! The resolved path is cached for the lifetime of the process.
//!
//! ```rust,no_run
//! let tool = dolphin_tool_locate::locate().expect("DolphinTool not installed");
//! println!("using {}", tool.display());
//! ```
//!
//! ## Platform support
//!
//! | OS      | Executable names                 | Probed locations                                   |
//! |---------|----------------------------------|----------------------------------------------------|
//! | macOS   | `dolphin-tool`, `DolphinTool`    | `/Applications/Dolphin.app/Contents/MacOS/`, `~/Applications/…` |
//! | Linux   | `dolphin-tool`, `DolphinTool`    | `/usr/bin`, `/usr/local/bin`, `/app/bin`, `~/.local/bin` |
//! | Windows | `DolphinTool.exe`                | `%ProgramFiles%\Dolphin`, `%ProgramFiles%\Dolphin-x64`, `%LOCALAPPDATA%\Dolphin` |

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that overrides every other lookup.
pub const TOOL_PATH_ENV: &str = "DOLPHIN_TOOL_PATH";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by dolphin-tool-locate.
#[derive(Error, Debug)]
pub enum LocateError {
    /// `DOLPHIN_TOOL_PATH` is set but nothing exists at that path.
    #[error("{TOOL_PATH_ENV} points to '{path}', which does not exist")]
    OverrideMissing { path: PathBuf },

    /// No executable was found on PATH or in any well-known location.
    #[error(
        "DolphinTool was not found.\n\
Searched PATH for {names:?} and the locations:\n{searched}\n\
Install Dolphin, or pass the executable explicitly (--tool / {TOOL_PATH_ENV})."
    )]
    NotFound { names: Vec<&'static str>, searched: String },
}

// ── Internal: platform metadata ──────────────────────────────────────────────

/// Executable names to look up on `PATH`, most specific first.
pub fn candidate_names() -> &'static [&'static str] {
    match std::env::consts::OS {
        "windows" => &["DolphinTool.exe", "DolphinTool"],
        _ => &["dolphin-tool", "DolphinTool"],
    }
}

/// Install locations probed after `PATH`, in order.
pub fn well_known_locations() -> Vec<PathBuf> {
    let mut dirs_to_probe: Vec<PathBuf> = Vec::new();

    match std::env::consts::OS {
        "macos" => {
            let bundle = Path::new("Applications/Dolphin.app/Contents/MacOS");
            dirs_to_probe.push(Path::new("/").join(bundle));
            if let Some(home) = dirs::home_dir() {
                dirs_to_probe.push(home.join(bundle));
            }
        }
        "windows" => {
            for var in ["ProgramFiles", "ProgramW6432"] {
                if let Ok(base) = std::env::var(var) {
                    dirs_to_probe.push(PathBuf::from(&base).join("Dolphin"));
                    dirs_to_probe.push(PathBuf::from(&base).join("Dolphin-x64"));
                }
            }
            if let Some(local) = dirs::data_local_dir() {
                dirs_to_probe.push(local.join("Dolphin"));
            }
        }
        _ => {
            dirs_to_probe.push(PathBuf::from("/usr/bin"));
            dirs_to_probe.push(PathBuf::from("/usr/local/bin"));
            // Inside the Flatpak sandbox
            dirs_to_probe.push(PathBuf::from("/app/bin"));
            if let Some(home) = dirs::home_dir() {
                dirs_to_probe.push(home.join(".local").join("bin"));
            }
        }
    }

    dirs_to_probe.dedup();
    dirs_to_probe
        .into_iter()
        .flat_map(|dir| candidate_names().iter().map(move |name| dir.join(name)))
        .collect()
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the path to DolphinTool, resolving it on first call.
///
/// Safe to call from multiple threads; later calls return the cached path
/// without touching the file system.
pub fn locate() -> Result<PathBuf, LocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = locate_uncached()?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Resolves DolphinTool without consulting or filling the process cache.
pub fn locate_uncached() -> Result<PathBuf, LocateError> {
    // 1. Environment variable override.
    if let Some(path) = std::env::var_os(TOOL_PATH_ENV).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
        return Err(LocateError::OverrideMissing { path });
    }

    // 2. PATH lookup.
    for name in candidate_names() {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
    }

    // 3. Well-known install locations.
    let probed = well_known_locations();
    first_existing(&probed).ok_or_else(|| LocateError::NotFound {
        names: candidate_names().to_vec(),
        searched: probed
            .iter()
            .map(|p| format!("  • {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
