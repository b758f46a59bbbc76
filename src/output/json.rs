//! JSON reporter.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2024-05-01T12:00:00Z",
//!   "algorithm": "blake3",
//!   "complete": true,
//!   "duplicates": [
//!     {
//!       "digest": "ea8f163d...",
//!       "size": 5,
//!       "files": ["./a.txt", "./b/b.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 3,
//!     "duplicate_groups": 1,
//!     "reclaimable_space": 5,
//!     "skipped_files": 0,
//!     "errors": [],
//!     ...
//!   }
//! }
//! ```

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{OutputError, Reporter};
use crate::duplicates::{DuplicateGroup, DuplicateReport, ScanSummary};
use crate::scanner::HashAlgorithm;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Content digest as hexadecimal string (64 characters)
    pub digest: String,
    /// File size in bytes
    pub size: u64,
    /// Paths in report order
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Convert a duplicate group.
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup) -> Self {
        Self {
            digest: group.digest.to_hex(),
            size: group.size,
            files: group.files.iter().map(|f| path_string(f)).collect(),
        }
    }
}

/// A file or directory left out of the report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSkipped {
    /// Path that failed
    pub path: String,
    /// `access`, `read` or `walk`
    pub kind: &'static str,
    /// Error message
    pub message: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Paths received from the directory walk
    pub total_files: usize,
    /// Total size of all sized files in bytes
    pub total_size: u64,
    /// Files alone in their size bucket
    pub eliminated_by_size: usize,
    /// Files carried into the content pass
    pub candidates: usize,
    /// Files hashed successfully
    pub hashed_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Paths dropped as links to an already seen file
    pub aliases_skipped: usize,
    /// Empty files left out of the report
    pub empty_files: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Redundant copies
    pub duplicate_files: usize,
    /// Bytes held by redundant copies
    pub reclaimable_space: u64,
    /// Number of files and directories left out because of errors
    pub skipped_files: usize,
    /// Details of every skipped file and directory
    pub errors: Vec<JsonSkipped>,
    /// Duration of the size pass in milliseconds
    pub size_duration_ms: u64,
    /// Duration of the content pass in milliseconds
    pub content_duration_ms: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
}

impl JsonSummary {
    /// Convert a scan summary.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary) -> Self {
        let errors = summary
            .key_errors
            .iter()
            .map(|e| JsonSkipped {
                path: path_string(e.path()),
                kind: e.kind(),
                message: e.to_string(),
            })
            .chain(summary.walk_errors.iter().map(|e| JsonSkipped {
                path: path_string(e.path()),
                kind: "walk",
                message: e.to_string(),
            }))
            .collect();

        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            eliminated_by_size: summary.eliminated_by_size,
            candidates: summary.candidates,
            hashed_files: summary.hashed_files,
            bytes_hashed: summary.bytes_hashed,
            aliases_skipped: summary.aliases_skipped,
            empty_files: summary.empty_files,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            skipped_files: summary.error_count(),
            errors,
            size_duration_ms: summary.size_duration.as_millis() as u64,
            content_duration_ms: summary.content_duration.as_millis() as u64,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
        }
    }
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// When the document was produced
    pub generated_at: DateTime<Utc>,
    /// Digest algorithm of the `digest` fields
    pub algorithm: HashAlgorithm,
    /// False if some directories could not be read
    pub complete: bool,
    /// Duplicate groups in report order
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document for a report, stamped with the current time.
    ///
    /// ```
    /// use dupefind::duplicates::{DuplicateReport, ScanSummary};
    /// use dupefind::output::JsonOutput;
    /// use dupefind::scanner::HashAlgorithm;
    ///
    /// let report = DuplicateReport::empty(HashAlgorithm::Blake3);
    /// let output = JsonOutput::new(&report, &ScanSummary::default());
    /// assert!(output.duplicates.is_empty());
    /// assert!(output.to_json().unwrap().starts_with('{'));
    /// ```
    #[must_use]
    pub fn new(report: &DuplicateReport, summary: &ScanSummary) -> Self {
        Self {
            generated_at: Utc::now(),
            algorithm: report.algorithm,
            complete: report.complete,
            duplicates: report
                .iter()
                .map(JsonDuplicateGroup::from_duplicate_group)
                .collect(),
            summary: JsonSummary::from_scan_summary(summary),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Writes one JSON document per report.
#[derive(Debug)]
pub struct JsonReporter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonReporter<W> {
    /// Pretty-printing reporter writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
        }
    }

    /// Choose between pretty and compact output.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(
        &mut self,
        report: &DuplicateReport,
        summary: &ScanSummary,
    ) -> Result<(), OutputError> {
        let output = JsonOutput::new(report, summary);
        let json = if self.pretty {
            output.to_json_pretty()?
        } else {
            output.to_json()?
        };
        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
