//! Path source and per-file keying primitives.
//!
//! This module provides:
//! - Sequential directory walking using walkdir ([`walker`])
//! - Streaming content digests with BLAKE3 or SHA-256 ([`hasher`])
//! - Physical file identity tracking for link collapsing ([`identity`])
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod identity;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

pub use hasher::{Digest, HashAlgorithm, Hasher, DEFAULT_BLOCK_SIZE};
pub use identity::IdentityTracker;
pub use walker::Walker;

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into directories reached through symbolic links.
    /// Symlinks to files are always yielded as ordinary paths.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl WalkerConfig {
    /// Create a new walker configuration.
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
        }
    }
}

/// Errors raised while enumerating the directory tree.
///
/// These belong to the path source, not to an individual file, and are never
/// silently dropped by the engine.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when reading a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An entry disappeared while the tree was being walked.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Any other traversal failure, including symlink loops.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(path) | Self::NotFound(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}

/// Errors raised while computing a key for a single file.
///
/// Both variants are recovered at file granularity: the file is dropped
/// from the current pass and the run continues.
#[derive(thiserror::Error, Debug)]
pub enum KeyError {
    /// Metadata lookup or open failed (permission, dangling link, removed file).
    #[error("Cannot access {path}: {source}")]
    Access {
        /// File that could not be accessed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A read failed partway through, or the file changed length while it
    /// was being hashed.
    #[error("Read failed for {path}: {source}")]
    Read {
        /// File whose content could not be fully read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl KeyError {
    /// Build an access error for `path`.
    #[must_use]
    pub fn access(path: &Path, source: io::Error) -> Self {
        Self::Access {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Build a read error for `path`.
    #[must_use]
    pub fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Path of the file that was excluded.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Access { path, .. } | Self::Read { path, .. } => path,
        }
    }

    /// Short machine-readable kind, used by the JSON reporter.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Access { .. } => "access",
            Self::Read { .. } => "read",
        }
    }

    /// Whether this is an [`KeyError::Access`] error.
    #[must_use]
    pub fn is_access(&self) -> bool {
        matches!(self, Self::Access { .. })
    }
}
