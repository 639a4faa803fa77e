//! A single ISO → RVZ conversion unit.

use crate::config::TARGET_FORMAT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One source image and the RVZ path it converts to.
///
/// Created once per discovered file when its processing starts and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    source: PathBuf,
    output: PathBuf,
}

impl ConversionJob {
    /// Build a job for `source`, deriving the output path by swapping only
    /// the extension for `.rvz`.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let output = derive_output_path(&source);
        Self { source, output }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

/// `source` with its extension replaced by the target format's.
///
/// Directory and file stem are untouched, so `/data/Game.ISO` becomes
/// `/data/Game.rvz` and `/data/a.b.iso` becomes `/data/a.b.rvz`.
pub fn derive_output_path(source: &Path) -> PathBuf {
    source.with_extension(TARGET_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_replaces_extension_only() {
        let job = ConversionJob::new("/data/game.iso");
        assert_eq!(job.source(), Path::new("/data/game.iso"));
        assert_eq!(job.output(), Path::new("/data/game.rvz"));
    }

    #[test]
    fn uppercase_extension() {
        let job = ConversionJob::new("/data/Game.ISO");
        assert_eq!(job.output(), Path::new("/data/Game.rvz"));
    }

    #[test]
    fn dotted_stem_is_preserved() {
        let job = ConversionJob::new("/data/Metroid Prime (v1.02).disc1.iso");
        assert_eq!(job.output(), Path::new("/data/Metroid Prime (v1.02).disc1.rvz"));
    }

    #[test]
    fn directory_and_stem_unchanged() {
        let job = ConversionJob::new("nested/dir/x.iso");
        assert_eq!(job.output().parent(), job.source().parent());
        assert_eq!(job.output().file_stem(), job.source().file_stem());
        assert_eq!(job.output().extension().unwrap(), "rvz");
    }
}
