//! Input discovery: find the `.iso` images under the input root.
//!
//! The root is validated eagerly in [`discover`] so a mistyped path fails
//! before any prompt or conversion happens; the directory walk itself is
//! lazy and yields files one at a time as the batch loop asks for them.

use crate::config::has_source_extension;
use crate::error::BatchError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Lazy, single-pass sequence of source images.
///
/// Entries are sorted by file name within each directory, so the order is
/// stable for a given directory tree.
pub struct SourceFiles {
    walker: walkdir::IntoIter,
}

impl Iterator for SourceFiles {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !has_source_extension(entry.path()) {
                continue;
            }
            if entry.file_type().is_file() {
                debug!("Discovered {}", entry.path().display());
                return Some(entry.into_path());
            }
            if entry.path_is_symlink() {
                debug!("Skipping symbolic link {}", entry.path().display());
            }
        }
    }
}

/// Enumerate source images under `root`.
///
/// Only direct children are considered unless `recurse` is set. Symbolic
/// links are not followed.
///
/// # Errors
/// [`BatchError::DirectoryNotFound`] if `root` is missing or not a directory.
pub fn discover(root: &Path, recurse: bool) -> Result<SourceFiles, BatchError> {
    if !root.is_dir() {
        return Err(BatchError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut walk = WalkDir::new(root).min_depth(1).sort_by_file_name();
    if !recurse {
        walk = walk.max_depth(1);
    }

    Ok(SourceFiles {
        walker: walk.into_iter(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn names(files: SourceFiles) -> Vec<String> {
        let mut v: Vec<String> = files
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        v.sort();
        v
    }

    #[test]
    fn matches_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.iso"));
        touch(&dir.path().join("b.ISO"));
        touch(&dir.path().join("c.txt"));

        let found = names(discover(dir.path(), false).unwrap());
        assert_eq!(found, vec!["a.iso", "b.ISO"]);
    }

    #[test]
    fn non_recursive_ignores_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("top.iso"));
        touch(&dir.path().join("sub/deep.iso"));

        assert_eq!(names(discover(dir.path(), false).unwrap()), vec!["top.iso"]);
        assert_eq!(
            names(discover(dir.path(), true).unwrap()),
            vec!["deep.iso", "top.iso"]
        );
    }

    #[test]
    fn directories_named_like_images_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("folder.iso")).unwrap();
        touch(&dir.path().join("real.iso"));

        assert_eq!(names(discover(dir.path(), true).unwrap()), vec!["real.iso"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_images_are_skipped_with_a_log_line() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        struct Sink(Arc<Mutex<Vec<u8>>>);
        impl Write for Sink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let library = tempfile::tempdir().unwrap();
        touch(&library.path().join("linked.iso"));
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("real.iso"));
        std::os::unix::fs::symlink(library.path().join("linked.iso"), dir.path().join("linked.iso"))
            .unwrap();

        let logs = Arc::new(Mutex::new(Vec::new()));
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || Sink(sink.clone()))
            .finish();

        let found = tracing::subscriber::with_default(subscriber, || {
            names(discover(dir.path(), false).unwrap())
        });

        assert_eq!(found, vec!["real.iso"]);
        let logs = String::from_utf8(logs.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Skipping symbolic link"), "logs: {logs}");
        assert!(logs.contains("linked.iso"), "logs: {logs}");
    }

    #[test]
    fn order_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        for n in ["c.iso", "a.iso", "b.iso"] {
            touch(&dir.path().join(n));
        }
        let first: Vec<_> = discover(dir.path(), false).unwrap().collect();
        let second: Vec<_> = discover(dir.path(), false).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_root_fails_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover(&missing, false),
            Err(BatchError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.iso");
        touch(&file);
        assert!(matches!(
            discover(&file, false),
            Err(BatchError::DirectoryNotFound { .. })
        ));
    }
}
