//! dupefind - two-phase duplicate file finder
//!
//! Finds groups of files with byte-identical content under a directory
//! tree. Files are grouped by size first; only files that share a size with
//! another file are hashed, block by block, and grouped by digest.
//!
//! The pipeline is Path Source ([`scanner::Walker`]) → Clustering Engine
//! ([`duplicates::DuplicateFinder`]) → Reporter ([`output`]).

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::{JsonReporter, Reporter, TextReporter};
use crate::progress::Progress;

/// Run the application with parsed arguments, writing the report to stdout.
///
/// Paging and colour are enabled only when stdin and stdout are terminals.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unusable root path, an
/// enumeration failure in strict mode, or an interrupted scan
/// ([`FinderError::Interrupted`](duplicates::FinderError::Interrupted)).
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let interactive = io::stdin().is_terminal() && io::stdout().is_terminal();
    run_app_with(cli, io::stdout().lock(), interactive)
}

/// Run the application, writing the report to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_app_with<W: Write>(cli: Cli, out: W, interactive: bool) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_cli(&cli);
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);

    if cli.print_config {
        let mut out = out;
        write!(out, "{}", config.to_toml()?)?;
        out.flush()?;
        return Ok(ExitCode::Success);
    }

    let handler = signal::install_handler()?;
    let mut finder_config = config
        .finder_config()
        .with_shutdown_flag(handler.get_flag());

    if config.progress && !cli.quiet && io::stderr().is_terminal() {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new()));
    }

    let finder = DuplicateFinder::new(finder_config);
    let (report, summary) = finder.find_duplicates(&cli.path)?;

    match config.output {
        OutputFormat::Text => {
            let mut reporter = TextReporter::new(out).with_color(interactive && !cli.no_color);
            if interactive {
                reporter = reporter.with_pager(Box::new(io::stdin().lock()), config.page_size);
            }
            reporter.report(&report, &summary)?;
        }
        OutputFormat::Json => {
            JsonReporter::new(out).report(&report, &summary)?;
        }
    }

    Ok(ExitCode::Success)
}
