//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! [`Walker`] is the path source of the pipeline: it lazily yields every
//! regular file under a root directory, in file-name order within each
//! directory. Symbolic links that point at files are yielded as ordinary
//! paths, and so are dangling links (keying them later fails with an
//! access error). Directory read failures are yielded as [`ScanError`]s so
//! the caller can decide whether they are fatal.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{ScanError, WalkerConfig};

/// Sequential directory walker.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker rooted at `path`.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Stop yielding entries once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Root directory of this walker.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, yielding file paths and traversal errors.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let skip_hidden = self.config.skip_hidden;

        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !skip_hidden || entry.depth() == 0 || !is_hidden(entry))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    return false;
                }
                true
            })
            .filter_map(move |entry| match entry {
                Ok(entry) => Self::classify(entry).map(Ok),
                Err(e) => Some(Err(self.convert_error(e))),
            })
    }

    /// Decide whether a directory entry is a file handle for the engine.
    fn classify(entry: DirEntry) -> Option<PathBuf> {
        let file_type = entry.file_type();

        if file_type.is_file() {
            return Some(entry.into_path());
        }
        if file_type.is_dir() {
            return None;
        }
        if file_type.is_symlink() {
            return match std::fs::metadata(entry.path()) {
                Ok(target) if target.is_file() => Some(entry.into_path()),
                Ok(_) => {
                    log::trace!("Skipping symlink to non-file: {}", entry.path().display());
                    None
                }
                Err(e) => {
                    log::debug!("Dangling symlink {}: {}", entry.path().display(), e);
                    Some(entry.into_path())
                }
            };
        }

        log::trace!("Skipping special file: {}", entry.path().display());
        None
    }

    fn convert_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(ErrorKind::NotFound) => {
                log::debug!("Entry vanished during walk: {}", path.display());
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                let message = error.to_string();
                let source = error
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other(message));
                ScanError::Io { path, source }
            }
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
