//! Reporters for duplicate scan results.
//!
//! A [`Reporter`] renders a finished [`DuplicateReport`] and its
//! [`ScanSummary`]. The engine never calls a reporter itself; it hands back
//! the whole report as a value and the application picks the format:
//! - [`TextReporter`] for people, with optional paging
//! - [`JsonReporter`] for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use dupefind::duplicates::DuplicateFinder;
//! use dupefind::output::{Reporter, TextReporter};
//! use std::path::Path;
//!
//! let (report, summary) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//!
//! let mut reporter = TextReporter::new(std::io::stdout().lock());
//! reporter.report(&report, &summary).unwrap();
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonReporter};
pub use text::TextReporter;

use crate::duplicates::{DuplicateReport, ScanSummary};

/// Errors that can occur while writing a report.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while writing or reading the pager input
    #[error("I/O error while writing report: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders a finished scan.
pub trait Reporter {
    /// Write `report` and the diagnostics in `summary`.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] if the destination cannot be written.
    fn report(&mut self, report: &DuplicateReport, summary: &ScanSummary)
        -> Result<(), OutputError>;
}
