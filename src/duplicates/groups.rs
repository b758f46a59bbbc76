//! Grouping state and duplicate groups.
//!
//! # Overview
//!
//! [`ClusterState`] is the accumulator of one grouping pass. Files are added
//! one at a time with a [`KeyFunction`]; files with equal keys land in the
//! same [`Group`], in the order they were added. At the end of the pass
//! [`ClusterState::extract_surviving_groups`] consumes the state and returns
//! only the groups with two or more members, in the order their keys were
//! first seen.
//!
//! # Example
//!
//! ```
//! use dupefind::duplicates::ClusterState;
//!
//! let mut state: ClusterState<u64, &str> = ClusterState::new();
//! state.insert(100, "/a.txt");
//! state.insert(200, "/c.txt");
//! state.insert(100, "/b.txt");
//!
//! let groups = state.extract_surviving_groups();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].key, 100);
//! assert_eq!(groups[0].members, vec!["/a.txt", "/b.txt"]);
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use super::keys::KeyFunction;
use crate::scanner::{Digest, HashAlgorithm, KeyError};

/// Files that produced the same key during one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<K, T> {
    /// Key shared by every member
    pub key: K,
    /// Members in insertion order
    pub members: Vec<T>,
}

impl<K, T> Group<K, T> {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the group has two or more members.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.members.len() > 1
    }
}

/// Accumulator for one grouping pass.
///
/// Keys are remembered in first-insertion order so that extraction is
/// reproducible regardless of the hash map's iteration order.
#[derive(Debug, Clone)]
pub struct ClusterState<K, T> {
    index: HashMap<K, usize>,
    groups: Vec<Group<K, T>>,
    files: usize,
}

impl<K, T> Default for ClusterState<K, T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
            files: 0,
        }
    }
}

impl<K: Eq + Hash + Clone, T> ClusterState<K, T> {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty state sized for roughly `capacity` distinct keys.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            groups: Vec::with_capacity(capacity),
            files: 0,
        }
    }

    /// Append `item` to the group for `key`, creating the group if needed.
    pub fn insert(&mut self, key: K, item: T) {
        self.files += 1;
        if let Some(&slot) = self.index.get(&key) {
            self.groups[slot].members.push(item);
            return;
        }
        self.index.insert(key.clone(), self.groups.len());
        self.groups.push(Group {
            key,
            members: vec![item],
        });
    }

    /// Key `item` with `key_fn` and insert it.
    ///
    /// Returns the computed key. On error nothing is inserted.
    ///
    /// # Errors
    ///
    /// Propagates the [`KeyError`] from `key_fn`.
    pub fn add_file<F>(&mut self, item: T, key_fn: &F) -> Result<K, KeyError>
    where
        K: Debug,
        T: AsRef<Path>,
        F: KeyFunction<Key = K> + ?Sized,
    {
        self.add_file_measured(item, key_fn).map(|(key, _)| key)
    }

    /// Like [`add_file`](Self::add_file), also returning the number of
    /// content bytes `key_fn` read.
    ///
    /// # Errors
    ///
    /// Propagates the [`KeyError`] from `key_fn`.
    pub fn add_file_measured<F>(&mut self, item: T, key_fn: &F) -> Result<(K, u64), KeyError>
    where
        K: Debug,
        T: AsRef<Path>,
        F: KeyFunction<Key = K> + ?Sized,
    {
        let (key, bytes) = key_fn.key_with_bytes(item.as_ref())?;
        log::trace!(
            "{} key {:?}: {}",
            key_fn.name(),
            key,
            item.as_ref().display()
        );
        self.insert(key.clone(), item);
        Ok((key, bytes))
    }

    /// Number of distinct keys seen so far.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of files inserted so far.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Whether nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files == 0
    }

    /// Consume the state, returning the groups with two or more members in
    /// first-insertion order of their keys.
    #[must_use]
    pub fn extract_surviving_groups(self) -> Vec<Group<K, T>> {
        self.groups
            .into_iter()
            .filter(Group::has_duplicates)
            .collect()
    }
}

/// A file carried from the size pass into the content pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path of the file
    pub path: PathBuf,
    /// Size observed during the size pass
    pub size: u64,
}

impl AsRef<Path> for Candidate {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// A set of two or more files with identical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content digest shared by every file
    pub digest: Digest,
    /// Size of each file in bytes
    pub size: u64,
    /// Paths in the order they were first observed
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(digest: Digest, size: u64, files: Vec<PathBuf>) -> Self {
        Self {
            digest,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of redundant copies (all files but one).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes held by the redundant copies.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Whether `path` is a member of this group.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path)
    }
}

/// Ordered result of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateReport {
    /// Duplicate groups in first-observation order
    pub groups: Vec<DuplicateGroup>,
    /// Algorithm that produced the digests
    pub algorithm: HashAlgorithm,
    /// False when enumeration errors were tolerated and some of the tree may
    /// not have been scanned
    pub complete: bool,
}

impl DuplicateReport {
    /// Create a complete report.
    #[must_use]
    pub fn new(groups: Vec<DuplicateGroup>, algorithm: HashAlgorithm) -> Self {
        Self {
            groups,
            algorithm,
            complete: true,
        }
    }

    /// An empty, complete report.
    #[must_use]
    pub fn empty(algorithm: HashAlgorithm) -> Self {
        Self::new(Vec::new(), algorithm)
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterate over the groups in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateGroup> {
        self.groups.iter()
    }

    /// Group containing `path`, if any.
    #[must_use]
    pub fn group_of(&self, path: &Path) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| g.contains(path))
    }

    /// Total redundant copies across all groups.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }

    /// Total bytes held by redundant copies.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_space).sum()
    }
}

impl<'a> IntoIterator for &'a DuplicateReport {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
