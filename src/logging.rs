//! Logging setup for dupefind.
//!
//! Log records go through the `log` facade to an `env_logger` backend on
//! stderr. The level is chosen by, in priority order:
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! Debug builds print a timestamp, and a module path at `-v` and above.
//! Release builds print level and message only.
//!
//! # Example
//!
//! ```rust,no_run
//! use dupefind::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible at -v");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// Only the first call in a process installs a logger; later calls leave it
/// in place and return `false`.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by `RUST_LOG`)
pub fn init_logging(verbose: u8, quiet: bool) -> bool {
    let rust_log = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    match rust_log {
        Some(_) => {
            builder.parse_default_env();
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return false;
    }

    match rust_log {
        Some(spec) => log::debug!("Logging initialized from RUST_LOG={}", spec),
        None => log::debug!("Logging initialized at level: {}", current_level_name()),
    }
    true
}

/// Map CLI flags to a level. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let timestamp = buf.timestamp_seconds();
        let level = record.level();
        let level_style = buf.default_level_style(level);

        if verbose >= 1 {
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} [{}] {}",
                timestamp,
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{} {level_style}{:<5}{level_style:#} {}",
                timestamp,
                level,
                record.args()
            )
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);
        writeln!(
            buf,
            "{level_style}{:<5}{level_style:#} {}",
            level,
            record.args()
        )
    });
}

/// Name of the currently active maximum log level.
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
