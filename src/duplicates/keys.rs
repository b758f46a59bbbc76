//! Key functions for the grouping passes.
//!
//! A [`KeyFunction`] maps a file path to a key without modifying the file.
//! The engine is generic over the key function of each pass, so the same
//! grouping primitive serves both the size pass and the content pass.

use std::fmt::Debug;
use std::hash::Hash;
use std::path::Path;

use crate::scanner::{Digest, Hasher, KeyError};

/// Deterministic, side-effect-free mapping from a file to a grouping key.
pub trait KeyFunction {
    /// Key produced for each file.
    type Key: Eq + Hash + Clone + Debug;

    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Compute the key for `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] if the file cannot be accessed or read.
    fn key(&self, path: &Path) -> Result<Self::Key, KeyError>;

    /// Compute the key along with the number of content bytes read for it.
    ///
    /// Metadata-only key functions read nothing and keep the default.
    ///
    /// # Errors
    ///
    /// Same as [`key`](Self::key).
    fn key_with_bytes(&self, path: &Path) -> Result<(Self::Key, u64), KeyError> {
        self.key(path).map(|key| (key, 0))
    }
}

impl<F: KeyFunction + ?Sized> KeyFunction for &F {
    type Key = F::Key;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn key(&self, path: &Path) -> Result<Self::Key, KeyError> {
        (**self).key(path)
    }

    fn key_with_bytes(&self, path: &Path) -> Result<(Self::Key, u64), KeyError> {
        (**self).key_with_bytes(path)
    }
}

/// Byte length from filesystem metadata. Never reads content.
///
/// Symlinks are followed, so a link is keyed by its target's length.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeKey;

impl KeyFunction for SizeKey {
    type Key = u64;

    fn name(&self) -> &'static str {
        "size"
    }

    fn key(&self, path: &Path) -> Result<u64, KeyError> {
        std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| KeyError::access(path, e))
    }
}

/// Full-content digest, streamed block by block through a [`Hasher`].
#[derive(Debug, Clone, Default)]
pub struct ContentKey {
    hasher: Hasher,
}

impl ContentKey {
    /// Content key backed by `hasher`.
    #[must_use]
    pub fn new(hasher: Hasher) -> Self {
        Self { hasher }
    }
}

impl KeyFunction for ContentKey {
    type Key = Digest;

    fn name(&self) -> &'static str {
        "content"
    }

    fn key(&self, path: &Path) -> Result<Digest, KeyError> {
        self.hasher.full_hash(path)
    }

    fn key_with_bytes(&self, path: &Path) -> Result<(Digest, u64), KeyError> {
        self.hasher.full_hash_counted(path)
    }
}
