//! Physical file identity, used to collapse hard links and symlinks.
//!
//! # Overview
//!
//! Two paths can name the same underlying data: hard links share an inode,
//! and a symlink resolves to its target. Hashing both would report them as
//! duplicates of each other, which is technically true but rarely useful.
//! When link collapsing is enabled the engine feeds every path through an
//! [`IdentityTracker`] and drops the ones whose identity was already seen.
//!
//! # Platform Support
//!
//! - **Unix**: (device, inode) pairs from `std::fs::metadata` (follows symlinks)
//! - **Other**: identity is unavailable; every path is treated as distinct
//!
//! # Example
//!
//! ```no_run
//! use dupefind::scanner::IdentityTracker;
//! use std::path::Path;
//!
//! let mut tracker = IdentityTracker::new();
//! assert!(!tracker.observe(Path::new("original.txt")).unwrap());
//! assert!(tracker.observe(Path::new("hardlink.txt")).unwrap());
//! ```

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::Path;

use super::KeyError;

/// Remembers which physical files have been seen.
///
/// Not thread-safe; the engine owns one per run.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    seen: HashSet<FileIdentity>,
}

impl IdentityTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` and report whether it is an alias of an earlier path.
    ///
    /// Symlinks are resolved, so a link and its target share an identity.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Access`] if the path's metadata cannot be read.
    pub fn observe(&mut self, path: &Path) -> Result<bool, KeyError> {
        let metadata = std::fs::metadata(path).map_err(|e| KeyError::access(path, e))?;
        Ok(self.is_alias(&metadata))
    }

    /// Record `metadata` and report whether its identity was already seen.
    ///
    /// Always `false` when the platform has no identity information.
    pub fn is_alias(&mut self, metadata: &Metadata) -> bool {
        match FileIdentity::from_metadata(metadata) {
            Some(identity) => !self.seen.insert(identity),
            None => false,
        }
    }

    /// Number of distinct identities recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Whether identity tracking works on this platform.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    // Windows exposes file indexes only through unstable APIs or an open
    // handle; treat every path as distinct there.
    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}
