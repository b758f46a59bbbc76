//! Streaming content digests.
//!
//! # Overview
//!
//! [`Hasher`] reads a file in fixed-size blocks and feeds each block into a
//! running hash state, so memory use is bounded by one block regardless of
//! file size. The digest does not depend on the block size.
//!
//! A file whose length changes while it is being read produces a
//! [`KeyError::Read`] instead of a digest: a partially hashed file must never
//! be grouped with complete ones.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::KeyError;

/// Default read block size in bytes (8 KiB, a multiple of common page sizes).
pub const DEFAULT_BLOCK_SIZE: usize = 8192;

/// Digest algorithm used for content keys.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (default)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Lowercase algorithm name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 32-byte content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal form (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        use fmt::Write as _;
        self.0.iter().fold(String::with_capacity(64), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Running hash state for one file.
enum StreamState {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
}

impl StreamState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
        }
    }

    fn update(&mut self, block: &[u8]) {
        match self {
            Self::Blake3(state) => {
                state.update(block);
            }
            Self::Sha256(state) => state.update(block),
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Blake3(state) => Digest(*state.finalize().as_bytes()),
            Self::Sha256(state) => {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&state.finalize());
                Digest(bytes)
            }
        }
    }
}

/// Block-streaming file hasher.
///
/// # Example
///
/// ```no_run
/// use dupefind::scanner::{HashAlgorithm, Hasher};
/// use std::path::Path;
///
/// let hasher = Hasher::new()
///     .with_algorithm(HashAlgorithm::Sha256)
///     .with_block_size(64 * 1024);
/// let digest = hasher.full_hash(Path::new("some/file.bin")).unwrap();
/// println!("{digest}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    block_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// BLAKE3 with [`DEFAULT_BLOCK_SIZE`] blocks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read block size. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Configured digest algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Configured block size in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Digest the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`KeyError::Access`] if the file cannot be opened or stat'ed.
    /// - [`KeyError::Read`] if a read fails, or if the number of bytes read
    ///   differs from the length reported when the file was opened.
    pub fn full_hash(&self, path: &Path) -> Result<Digest, KeyError> {
        self.full_hash_counted(path).map(|(digest, _)| digest)
    }

    /// Like [`full_hash`](Self::full_hash), also returning the number of
    /// bytes read.
    ///
    /// # Errors
    ///
    /// Same as [`full_hash`](Self::full_hash).
    pub fn full_hash_counted(&self, path: &Path) -> Result<(Digest, u64), KeyError> {
        let file = File::open(path).map_err(|e| KeyError::access(path, e))?;
        let expected = file
            .metadata()
            .map_err(|e| KeyError::access(path, e))?
            .len();

        let (digest, hashed) = self
            .hash_reader(file)
            .map_err(|e| KeyError::read(path, e))?;

        if hashed != expected {
            return Err(KeyError::read(
                path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("length changed during read: expected {expected} bytes, read {hashed}"),
                ),
            ));
        }

        Ok((digest, hashed))
    }

    /// Digest everything `reader` yields, one block at a time.
    ///
    /// Returns the digest and the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns the first non-`Interrupted` read error.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<(Digest, u64)> {
        let mut state = StreamState::new(self.algorithm);
        let mut block = vec![0u8; self.block_size];
        let mut total = 0u64;

        loop {
            let n = match reader.read(&mut block) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&block[..n]);
            total += n as u64;
        }

        Ok((state.finalize(), total))
    }

    /// Digest an in-memory buffer.
    #[must_use]
    pub fn hash_bytes(&self, data: &[u8]) -> Digest {
        let mut state = StreamState::new(self.algorithm);
        state.update(data);
        state.finalize()
    }
}
