//! Disposal: reversible removal of sources and failed outputs.
//!
//! Nothing is ever deleted outright. [`SystemTrash`] hands files to the
//! desktop trash / recycle bin; [`TrashDirectory`] moves them into a folder
//! of the operator's choosing. Either way a mistake can be undone by hand.

use crate::error::JobError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Why a file is being disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisposalReason {
    /// The RVZ failed conversion or verification and must not be trusted.
    DiscardFailedArtifact,
    /// The ISO converted and verified cleanly and the operator asked for it to go.
    TrashConvertedSource,
}

impl fmt::Display for DisposalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisposalReason::DiscardFailedArtifact => "discard failed output",
            DisposalReason::TrashConvertedSource => "trash converted source",
        })
    }
}

/// Something that can make a file go away reversibly.
pub trait Disposer {
    fn dispose(&self, path: &Path, reason: DisposalReason) -> Result<(), JobError>;
}

/// The platform trash (freedesktop trash, macOS Trash, Windows Recycle Bin).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrash;

impl Disposer for SystemTrash {
    fn dispose(&self, path: &Path, reason: DisposalReason) -> Result<(), JobError> {
        let failed = |detail: String| JobError::DisposalFailed {
            path: path.to_path_buf(),
            reason,
            detail,
        };

        // Never hand a directory to the platform trash.
        if !path.is_file() {
            return Err(failed("not a regular file".into()));
        }
        trash::delete(path).map_err(|e| failed(e.to_string()))?;
        info!("Moved {} to the trash ({})", path.display(), reason);
        Ok(())
    }
}

/// Moves files into a plain directory.
///
/// Name clashes get a ` (n)` suffix before the extension, so an earlier
/// disposal is never overwritten.
#[derive(Debug, Clone)]
pub struct TrashDirectory {
    dir: PathBuf,
}

impl TrashDirectory {
    /// The directory is created on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn destination_for(&self, path: &Path) -> Option<PathBuf> {
        let name = path.file_name()?;
        let first = self.dir.join(name);
        if !first.exists() {
            return Some(first);
        }

        let stem = path.file_stem()?.to_string_lossy().into_owned();
        let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
        (1u32..)
            .map(|n| match &ext {
                Some(ext) => self.dir.join(format!("{stem} ({n}).{ext}")),
                None => self.dir.join(format!("{stem} ({n})")),
            })
            .find(|candidate| !candidate.exists())
    }
}

impl Disposer for TrashDirectory {
    fn dispose(&self, path: &Path, reason: DisposalReason) -> Result<(), JobError> {
        let failed = |detail: String| JobError::DisposalFailed {
            path: path.to_path_buf(),
            reason,
            detail,
        };

        if !path.is_file() {
            return Err(failed("no such file".into()));
        }
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| failed(format!("cannot create {}: {e}", self.dir.display())))?;
        let dest = self
            .destination_for(path)
            .ok_or_else(|| failed("path has no file name".into()))?;

        if let Err(e) = std::fs::rename(path, &dest) {
            // Different file system: copy, then remove the original.
            debug!("rename into {} failed ({}); copying", self.dir.display(), e);
            std::fs::copy(path, &dest).map_err(|e| failed(e.to_string()))?;
            std::fs::remove_file(path).map_err(|e| failed(e.to_string()))?;
        }

        info!("Moved {} to {} ({})", path.display(), dest.display(), reason);
        Ok(())
    }
}
