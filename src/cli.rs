//! Command-line interface definitions for dupefind.
//!
//! Flags that also exist in the configuration file are optional here: an
//! absent flag leaves the configured value alone, a present one overrides
//! it (see [`Config::apply_cli`](crate::config::Config::apply_cli)).
//!
//! # Example
//!
//! ```bash
//! # Scan the current directory
//! dupefind
//!
//! # Scan with JSON output for scripting
//! dupefind ~/Downloads --output json
//!
//! # Use SHA-256 with 64 KiB reads, collapsing hard links
//! dupefind ~/Photos --algorithm sha256 --block-size 64KiB --links collapse
//!
//! # Verbose mode for debugging
//! dupefind -v ~/Downloads
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::duplicates::LinkPolicy;
use crate::scanner::HashAlgorithm;

/// Find files with identical content.
///
/// dupefind groups files by size, then hashes only the files that share a
/// size with another file, and reports every set of files whose content
/// digests match.
#[derive(Debug, Parser)]
#[command(name = "dupefind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    ///
    /// Any non-empty `NO_COLOR` value other than a falsey one (0, false, no,
    /// off) counts as set.
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Content digest algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Read block size for hashing (e.g., 8KiB, 64KiB, 1MiB)
    ///
    /// Must be a positive multiple of 512 bytes.
    #[arg(long, value_name = "SIZE", value_parser = parse_block_size)]
    pub block_size: Option<usize>,

    /// How hard links and symlinks to the same file are treated
    #[arg(long, value_enum, value_name = "POLICY")]
    pub links: Option<LinkPolicy>,

    /// Descend into symbolic links to directories
    ///
    /// Warning: may visit the same files twice if links form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Leave empty files out of the report
    #[arg(long)]
    pub skip_empty: bool,

    /// Abort on the first unreadable directory instead of reporting it
    #[arg(long)]
    pub strict: bool,

    /// Pause after this many groups when writing text to a terminal (0 disables)
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,

    /// Do not display progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Configuration file (default: the platform config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable groups
    #[default]
    Text,
    /// Machine-readable JSON document
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports the following formats:
/// - Plain numbers: "1024" (bytes)
/// - Decimal suffixes: "1KB", "1MB", "1GB", "1TB" (powers of 1000)
/// - Binary suffixes: "1KiB", "1MiB", "1GiB", "1TiB" (powers of 1024)
///
/// Suffixes are case-insensitive.
///
/// # Errors
///
/// Returns a message if the string is empty, negative, not a number, or has
/// an unknown suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

/// Parse a read block size: any [`parse_size`] string that is a positive
/// multiple of 512.
///
/// # Errors
///
/// Returns a message for unparsable, zero, or misaligned sizes.
pub fn parse_block_size(s: &str) -> Result<usize, String> {
    let bytes = parse_size(s)?;
    if bytes == 0 {
        return Err("Block size must be greater than zero".to_string());
    }
    if bytes % 512 != 0 {
        return Err(format!("Block size must be a multiple of 512 bytes, got {bytes}"));
    }
    usize::try_from(bytes).map_err(|_| format!("Block size too large: {bytes}"))
}
