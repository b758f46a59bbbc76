//! Two-phase duplicate finder.
//!
//! # Overview
//!
//! [`DuplicateFinder`] drives the clustering pipeline over a sequence of
//! paths:
//! 1. **Phase 1 - Size grouping**: key every path with [`SizeKey`] and keep
//!    only size buckets holding two or more files
//! 2. **Phase 2 - Content grouping**: key every surviving candidate with
//!    [`ContentKey`] in a fresh [`ClusterState`] and keep only digests shared
//!    by two or more files
//!
//! Files that cannot be keyed are recorded in the [`ScanSummary`] and left
//! out of the pass; they never abort a run.
//!
//! # Example
//!
//! ```no_run
//! use dupefind::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let (report, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! for group in &report {
//!     println!("{} copies of {} bytes", group.len(), group.size);
//! }
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use serde::{Deserialize, Serialize};

use super::groups::{Candidate, ClusterState, DuplicateGroup, DuplicateReport, Group};
use super::keys::{ContentKey, KeyFunction, SizeKey};
use crate::progress::ProgressCallback;
use crate::scanner::{
    Digest, HashAlgorithm, Hasher, IdentityTracker, KeyError, ScanError, Walker, WalkerConfig,
};

/// Files at least this large get a debug line before hashing (100 MiB).
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Engine state. Transitions only move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing has run yet
    Idle,
    /// Keying every path by size
    Phase1Grouping,
    /// Dropping size buckets with a single member
    Phase1Filtering,
    /// Keying every candidate by content digest
    Phase2Grouping,
    /// Dropping digests with a single member
    Phase2Filtering,
    /// The report is ready
    Done,
}

impl Phase {
    /// Short human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Phase1Grouping => "phase 1 grouping",
            Self::Phase1Filtering => "phase 1 filtering",
            Self::Phase2Grouping => "phase 2 grouping",
            Self::Phase2Filtering => "phase 2 filtering",
            Self::Done => "done",
        }
    }

    /// The state that follows this one, or `None` once done.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Phase1Grouping),
            Self::Phase1Grouping => Some(Self::Phase1Filtering),
            Self::Phase1Filtering => Some(Self::Phase2Grouping),
            Self::Phase2Grouping => Some(Self::Phase2Filtering),
            Self::Phase2Filtering => Some(Self::Done),
            Self::Done => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How paths that name the same physical file are treated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    /// Every path is its own file; hard links and symlinks to the same data
    /// are reported as duplicates of each other.
    #[default]
    Report,
    /// Only the first path seen for each (device, inode) is kept.
    Collapse,
}

impl fmt::Display for LinkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Report => "report",
            Self::Collapse => "collapse",
        })
    }
}

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Hasher used by the content pass.
    pub hasher: Hasher,
    /// Treatment of hard links and symlinks.
    pub link_policy: LinkPolicy,
    /// Leave zero-length files out of the report.
    pub skip_empty: bool,
    /// Abort on the first enumeration error instead of recording it.
    pub strict: bool,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("hasher", &self.hasher)
            .field("link_policy", &self.link_policy)
            .field("skip_empty", &self.skip_empty)
            .field("strict", &self.strict)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the content hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Set the digest algorithm of the content hasher.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hasher = self.hasher.with_algorithm(algorithm);
        self
    }

    /// Set the read block size of the content hasher.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.hasher = self.hasher.with_block_size(block_size);
        self
    }

    /// Set the link policy.
    #[must_use]
    pub fn with_link_policy(mut self, policy: LinkPolicy) -> Self {
        self.link_policy = policy;
        self
    }

    /// Leave zero-length files out of the report.
    #[must_use]
    pub fn with_skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    /// Set fail-fast on enumeration errors.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics and diagnostics from one run.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Paths received from the path source
    pub total_files: usize,
    /// Combined size of every file that could be sized
    pub total_size: u64,
    /// Files alone in their size bucket (never hashed)
    pub eliminated_by_size: usize,
    /// Files carried into the content pass
    pub candidates: usize,
    /// Files whose digest was computed successfully
    pub hashed_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Paths dropped as aliases of an earlier path (collapse policy)
    pub aliases_skipped: usize,
    /// Zero-length files left out of the report
    pub empty_files: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies (group members minus one per group)
    pub duplicate_files: usize,
    /// Bytes held by redundant copies
    pub reclaimable_space: u64,
    /// Files that could not be keyed
    pub key_errors: Vec<KeyError>,
    /// Enumeration errors tolerated outside strict mode
    pub walk_errors: Vec<ScanError>,
    /// Time spent in the size pass
    pub size_duration: Duration,
    /// Time spent in the content pass
    pub content_duration: Duration,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Entries left out of the report because of an error: files that could
    /// not be keyed plus directories that could not be read.
    ///
    /// See [`file_error_count`](Self::file_error_count) for files alone.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.key_errors.len() + self.walk_errors.len()
    }

    /// Files that could not be keyed in either pass.
    #[must_use]
    pub fn file_error_count(&self) -> usize {
        self.key_errors.len()
    }

    /// Files that could not be accessed (metadata or open failed).
    #[must_use]
    pub fn access_errors(&self) -> usize {
        self.key_errors.iter().filter(|e| e.is_access()).count()
    }

    /// Files whose content could not be fully read.
    #[must_use]
    pub fn read_errors(&self) -> usize {
        self.key_errors.len() - self.access_errors()
    }

    /// Percentage of sized files that the size pass eliminated.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        let sized = self.eliminated_by_size + self.candidates + self.empty_files;
        if sized == 0 {
            0.0
        } else {
            (self.eliminated_by_size as f64 / sized as f64) * 100.0
        }
    }

    /// Percentage of the scanned bytes held by redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.total_size).to_string()
    }
}

/// Errors that end a run without a report.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Enumeration failed and strict mode is on.
    #[error("Enumeration failed: {0}")]
    Enumeration(#[source] ScanError),
}

/// Two-phase duplicate finder.
///
/// The finder holds configuration only. Every call to [`run`](Self::run)
/// builds its own grouping state, so a finder can be reused.
#[derive(Debug, Default)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `root`.
    ///
    /// # Errors
    ///
    /// - [`FinderError::PathNotFound`] / [`FinderError::NotADirectory`] if
    ///   `root` is not an existing directory
    /// - [`FinderError::Enumeration`] on a traversal error in strict mode
    /// - [`FinderError::Interrupted`] if the shutdown flag is raised
    pub fn find_duplicates(
        &self,
        root: &Path,
    ) -> Result<(DuplicateReport, ScanSummary), FinderError> {
        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        log::info!("Starting duplicate scan of {}", walker.root().display());

        self.run(walker.walk())
    }

    /// Find duplicates among an already collected list of paths.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] if the shutdown flag is raised.
    pub fn find_duplicates_from_paths<I>(
        &self,
        paths: I,
    ) -> Result<(DuplicateReport, ScanSummary), FinderError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.run(paths.into_iter().map(Ok))
    }

    /// Run both phases over `paths` with the standard key functions.
    ///
    /// # Errors
    ///
    /// See [`run_with`](Self::run_with).
    pub fn run<I>(&self, paths: I) -> Result<(DuplicateReport, ScanSummary), FinderError>
    where
        I: IntoIterator<Item = Result<PathBuf, ScanError>>,
    {
        let content_key = ContentKey::new(self.config.hasher.clone());
        self.run_with(paths, &SizeKey, &content_key)
    }

    /// Run both phases over `paths` with caller-supplied key functions.
    ///
    /// # Errors
    ///
    /// - [`FinderError::Enumeration`] on the first `Err` from `paths` in
    ///   strict mode
    /// - [`FinderError::Interrupted`] if the shutdown flag is raised
    pub fn run_with<I, S, C>(
        &self,
        paths: I,
        size_key: &S,
        content_key: &C,
    ) -> Result<(DuplicateReport, ScanSummary), FinderError>
    where
        I: IntoIterator<Item = Result<PathBuf, ScanError>>,
        S: KeyFunction<Key = u64> + ?Sized,
        C: KeyFunction<Key = Digest> + ?Sized,
    {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();
        let mut phase = Phase::Idle;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        self.advance(&mut phase);
        let candidates = self.phase1_size(paths, size_key, &mut summary)?;
        summary.size_duration = start_time.elapsed();

        self.advance(&mut phase);
        let candidates = self.filter_candidates(candidates, &mut summary);
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        if candidates.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_message("No files share a size");
            }
        }

        self.advance(&mut phase);
        let content_start = Instant::now();
        let groups = self.phase2_content(candidates, content_key, &mut summary)?;
        summary.content_duration = content_start.elapsed();

        self.advance(&mut phase);
        let groups: Vec<DuplicateGroup> = groups
            .into_iter()
            .map(|group| {
                let size = group.members.first().map_or(0, |c| c.size);
                let files = group.members.into_iter().map(|c| c.path).collect();
                DuplicateGroup::new(group.key, size, files)
            })
            .collect();

        let mut report = DuplicateReport::new(groups, self.config.hasher.algorithm());
        report.complete = summary.walk_errors.is_empty();

        summary.duplicate_groups = report.len();
        summary.duplicate_files = report.duplicate_files();
        summary.reclaimable_space = report.reclaimable_space();
        summary.scan_duration = start_time.elapsed();

        self.advance(&mut phase);
        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable, \
             {} entries skipped",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.error_count()
        );
        if !report.complete {
            log::warn!(
                "Report is incomplete: {} directories could not be read",
                summary.walk_errors.len()
            );
        }

        Ok((report, summary))
    }

    fn advance(&self, phase: &mut Phase) {
        if let Some(next) = phase.next() {
            log::debug!("Finder: {} -> {}", phase, next);
            *phase = next;
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_phase_change(next);
            }
        }
    }

    /// Phase 1: bucket every path by size.
    fn phase1_size<I, S>(
        &self,
        paths: I,
        size_key: &S,
        summary: &mut ScanSummary,
    ) -> Result<Vec<Group<u64, PathBuf>>, FinderError>
    where
        I: IntoIterator<Item = Result<PathBuf, ScanError>>,
        S: KeyFunction<Key = u64> + ?Sized,
    {
        log::info!("Phase 1: Grouping by size...");
        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_phase_start("size", 0);
        }

        let mut state: ClusterState<u64, PathBuf> = ClusterState::new();
        let mut identities = match self.config.link_policy {
            LinkPolicy::Collapse if IdentityTracker::is_supported() => {
                Some(IdentityTracker::new())
            }
            LinkPolicy::Collapse => {
                log::warn!("Link collapsing is not supported on this platform; reporting links");
                None
            }
            LinkPolicy::Report => None,
        };

        for entry in paths {
            if self.config.is_shutdown_requested() {
                log::debug!("Phase 1: Shutdown requested, stopping");
                return Err(FinderError::Interrupted);
            }

            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    if self.config.strict {
                        return Err(FinderError::Enumeration(e));
                    }
                    log::warn!("Skipping unreadable entry: {}", e);
                    summary.walk_errors.push(e);
                    continue;
                }
            };

            summary.total_files += 1;
            if let Some(cb) = callback {
                cb.on_progress(summary.total_files, &path.to_string_lossy());
            }

            if let Some(tracker) = identities.as_mut() {
                match tracker.observe(&path) {
                    Ok(true) => {
                        log::debug!("Skipping alias: {}", path.display());
                        summary.aliases_skipped += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        record_key_error(summary, e);
                        continue;
                    }
                }
            }

            match state.add_file(path, size_key) {
                Ok(size) => summary.total_size += size,
                Err(e) => record_key_error(summary, e),
            }
        }

        if let Some(cb) = callback {
            cb.on_phase_end("size");
        }
        if let Some(tracker) = identities {
            log::debug!(
                "{} distinct physical files, {} aliases skipped",
                tracker.seen_count(),
                summary.aliases_skipped
            );
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Found {} files ({} total) in {} size buckets",
            state.file_count(),
            summary.total_size_display(),
            state.key_count()
        );

        let sized = state.file_count();
        let groups = state.extract_surviving_groups();
        let surviving: usize = groups.iter().map(Group::len).sum();
        summary.eliminated_by_size = sized - surviving;

        Ok(groups)
    }

    /// Between the passes: drop empty files if asked and turn the size
    /// buckets into content-pass candidates.
    fn filter_candidates(
        &self,
        groups: Vec<Group<u64, PathBuf>>,
        summary: &mut ScanSummary,
    ) -> Vec<Vec<Candidate>> {
        let mut candidates = Vec::with_capacity(groups.len());
        for group in groups {
            if self.config.skip_empty && group.key == 0 {
                log::debug!("Skipping {} empty files", group.len());
                summary.empty_files += group.len();
                continue;
            }
            let size = group.key;
            candidates.push(
                group
                    .members
                    .into_iter()
                    .map(|path| Candidate { path, size })
                    .collect::<Vec<_>>(),
            );
        }

        summary.candidates = candidates.iter().map(Vec::len).sum();
        log::info!(
            "Phase 1 complete: {} → {} files ({:.1}% eliminated)",
            summary.eliminated_by_size + summary.candidates + summary.empty_files,
            summary.candidates,
            summary.elimination_rate()
        );

        candidates
    }

    /// Phase 2: bucket every candidate by content digest.
    fn phase2_content<C>(
        &self,
        candidates: Vec<Vec<Candidate>>,
        content_key: &C,
        summary: &mut ScanSummary,
    ) -> Result<Vec<Group<Digest, Candidate>>, FinderError>
    where
        C: KeyFunction<Key = Digest> + ?Sized,
    {
        log::info!("Phase 2: Hashing {} candidates...", summary.candidates);
        let callback = self.config.progress_callback.as_ref();
        if let Some(cb) = callback {
            cb.on_phase_start("content", summary.candidates);
        }

        let mut state: ClusterState<Digest, Candidate> =
            ClusterState::with_capacity(summary.candidates);
        let mut processed = 0;

        for candidate in candidates.into_iter().flatten() {
            if self.config.is_shutdown_requested() {
                log::debug!("Phase 2: Shutdown requested, stopping");
                return Err(FinderError::Interrupted);
            }

            processed += 1;
            if let Some(cb) = callback {
                cb.on_progress(processed, &candidate.path.to_string_lossy());
            }
            if candidate.size >= LARGE_FILE_THRESHOLD {
                log::debug!(
                    "Hashing large file ({}): {}",
                    ByteSize(candidate.size),
                    candidate.path.display()
                );
            }

            match state.add_file_measured(candidate, content_key) {
                Ok((_, bytes)) => {
                    summary.hashed_files += 1;
                    summary.bytes_hashed += bytes;
                    if let Some(cb) = callback {
                        cb.on_item_completed(bytes);
                    }
                }
                Err(e) => record_key_error(summary, e),
            }
        }

        if let Some(cb) = callback {
            cb.on_phase_end("content");
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let distinct = state.key_count();
        let groups = state.extract_surviving_groups();
        log::info!(
            "Phase 2 complete: {} files hashed, {} distinct digests, {} duplicate groups",
            summary.hashed_files,
            distinct,
            groups.len()
        );

        Ok(groups)
    }
}

fn record_key_error(summary: &mut ScanSummary, error: KeyError) {
    log::warn!("Skipping file: {}", error);
    summary.key_errors.push(error);
}
