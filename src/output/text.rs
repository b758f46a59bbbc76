//! Human-readable reporter.
//!
//! Each group is printed as a numbered block:
//!
//! ```text
//! Duplicate group 1 (2 files, 5 B each)
//! All of these files have the same content:
//!   ./a.txt
//!   ./b/b.txt
//! ```
//!
//! With a pager attached, the reporter stops after every `page_size` groups,
//! prints `Press Enter for more duplicates` and waits for a line on the
//! pager's input. A summary footer follows the groups, listing every file
//! that could not be read and whether the report covers the whole tree.

use std::io::{BufRead, Write};

use bytesize::ByteSize;
use yansi::{Paint, Style};

use super::{OutputError, Reporter};
use crate::duplicates::{DuplicateGroup, DuplicateReport, ScanSummary};

/// Prompt printed between pages.
pub const PAGE_PROMPT: &str = "Press Enter for more duplicates";

struct Pager {
    input: Box<dyn BufRead>,
    page_size: usize,
}

/// Plain-text reporter with optional paging and colour.
pub struct TextReporter<W: Write> {
    out: W,
    pager: Option<Pager>,
    color: bool,
}

impl<W: Write> TextReporter<W> {
    /// Colourless, unpaged reporter writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            pager: None,
            color: false,
        }
    }

    /// Pause after every `page_size` groups until `input` yields a line.
    ///
    /// A page size of 0 disables paging.
    #[must_use]
    pub fn with_pager(mut self, input: Box<dyn BufRead>, page_size: usize) -> Self {
        self.pager = (page_size > 0).then_some(Pager { input, page_size });
        self
    }

    /// Enable or disable ANSI colour.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&self, text: &str, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn write_group(&mut self, number: usize, group: &DuplicateGroup) -> Result<(), OutputError> {
        let header = self.styled(&format!("Duplicate group {number}"), Style::new().bold().cyan());
        writeln!(
            self.out,
            "{} ({} files, {} each)",
            header,
            group.len(),
            ByteSize(group.size)
        )?;
        writeln!(self.out, "All of these files have the same content:")?;
        for file in &group.files {
            writeln!(self.out, "  {}", file.display())?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// Show the prompt and wait. Returns `false` once the input is exhausted,
    /// after which the rest of the report is written without pausing.
    fn wait_for_next_page(&mut self) -> Result<bool, OutputError> {
        let prompt = self.styled(PAGE_PROMPT, Style::new().dim());
        write!(self.out, "{prompt}")?;
        self.out.flush()?;

        let Some(pager) = self.pager.as_mut() else {
            return Ok(false);
        };
        let mut line = String::new();
        let read = pager.input.read_line(&mut line)?;
        writeln!(self.out)?;
        Ok(read > 0)
    }

    fn write_footer(
        &mut self,
        report: &DuplicateReport,
        summary: &ScanSummary,
    ) -> Result<(), OutputError> {
        if report.is_empty() {
            writeln!(self.out, "No duplicate files found.")?;
        } else {
            let line = format!(
                "Found {} duplicate groups ({} redundant files, {} reclaimable)",
                report.len(),
                report.duplicate_files(),
                ByteSize(report.reclaimable_space())
            );
            let line = self.styled(&line, Style::new().bold().green());
            writeln!(self.out, "{line}")?;
        }

        writeln!(
            self.out,
            "Scanned {} files ({}), hashed {} in {:.2?}",
            summary.total_files,
            summary.total_size_display(),
            summary.hashed_files,
            summary.scan_duration
        )?;
        if summary.aliases_skipped > 0 {
            writeln!(
                self.out,
                "Skipped {} links to files already scanned",
                summary.aliases_skipped
            )?;
        }
        if summary.empty_files > 0 {
            writeln!(self.out, "Skipped {} empty files", summary.empty_files)?;
        }

        if !summary.key_errors.is_empty() {
            let line = format!("{} files could not be read:", summary.key_errors.len());
            let line = self.styled(&line, Style::new().yellow());
            writeln!(self.out, "{line}")?;
            for error in &summary.key_errors {
                writeln!(self.out, "  {error}")?;
            }
        }

        if !report.complete {
            let line = format!(
                "Warning: report is incomplete, {} directories could not be read:",
                summary.walk_errors.len()
            );
            let line = self.styled(&line, Style::new().yellow().bold());
            writeln!(self.out, "{line}")?;
            for error in &summary.walk_errors {
                writeln!(self.out, "  {error}")?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(
        &mut self,
        report: &DuplicateReport,
        summary: &ScanSummary,
    ) -> Result<(), OutputError> {
        let page_size = self.pager.as_ref().map_or(0, |p| p.page_size);
        let mut paging = page_size > 0;

        for (index, group) in report.iter().enumerate() {
            self.write_group(index + 1, group)?;

            let shown = index + 1;
            if paging && shown % page_size == 0 && shown < report.len() {
                paging = self.wait_for_next_page()?;
            }
        }

        self.write_footer(report, summary)?;
        self.out.flush()?;
        Ok(())
    }
}
