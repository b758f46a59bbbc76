//! Progress reporting using indicatif.
//!
//! The engine reports through the [`ProgressCallback`] trait and never
//! depends on how (or whether) progress is drawn. [`Progress`] is the
//! terminal implementation: a spinner for the size pass, whose total is not
//! known in advance, and a bar with byte throughput for the content pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::duplicates::Phase;

/// Progress callback for the duplicate finder.
///
/// Implement this trait to receive progress updates during a scan.
pub trait ProgressCallback: Send + Sync {
    /// Called when a pass starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the pass (`"size"` or `"content"`)
    /// * `total` - Number of items to process, or 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called after an item was hashed, with its size in bytes.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a pass completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}

    /// Called on every engine state transition.
    fn on_phase_change(&self, _phase: Phase) {}
}

/// Terminal progress display on stderr.
pub struct Progress {
    multi: MultiProgress,
    size: Mutex<Option<ProgressBar>>,
    content: Mutex<Option<ProgressBar>>,
    bytes: AtomicU64,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Progress drawn on stderr.
    ///
    /// ```
    /// use dupefind::progress::Progress;
    ///
    /// let progress = Progress::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Progress that tracks state but draws nothing.
    #[must_use]
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            size: Mutex::new(None),
            content: Mutex::new(None),
            bytes: AtomicU64::new(0),
        }
    }

    /// Bytes reported through `on_item_completed` in the current content pass.
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    fn slot(&self, phase: &str) -> Option<MutexGuard<'_, Option<ProgressBar>>> {
        let slot = match phase {
            "size" => &self.size,
            "content" => &self.content,
            _ => return None,
        };
        Some(slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// The bar of the pass currently running, content first.
    fn active(&self) -> Option<ProgressBar> {
        ["content", "size"]
            .into_iter()
            .filter_map(|phase| self.slot(phase).and_then(|bar| bar.clone()))
            .next()
    }

    fn size_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn content_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} ({percent}%) \
             {prefix} {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        let bar = match phase {
            "size" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::size_style());
                pb.set_message("Sizing files");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            "content" => {
                self.bytes.store(0, Ordering::Relaxed);
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::content_style());
                pb.set_message("Hashing");
                pb
            }
            other => {
                log::debug!("Progress: unknown phase {other}");
                return;
            }
        };

        if let Some(mut slot) = self.slot(phase) {
            *slot = Some(bar);
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if let Some(pb) = self.active() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 30));
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        let total = self.bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        if let Some(pb) = self.slot("content").and_then(|bar| bar.clone()) {
            pb.set_prefix(ByteSize(total).to_string());
        }
    }

    fn on_phase_end(&self, phase: &str) {
        let Some(bar) = self.slot(phase).and_then(|mut bar| bar.take()) else {
            return;
        };
        match phase {
            "size" => bar.finish_with_message("Sizing complete"),
            _ => bar.finish_with_message(format!(
                "Hashing complete ({})",
                ByteSize(self.bytes_hashed())
            )),
        }
    }

    fn on_message(&self, message: &str) {
        if let Some(pb) = self.active() {
            pb.set_message(message.to_string());
        }
    }
}

/// Shorten a path to its file name when it is longer than `max_len`.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let chars = file_name.chars().count();
    if chars + 4 > max_len {
        let tail: String = file_name.chars().skip(chars + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
