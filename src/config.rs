//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. [`Config::default()`]
//! 2. A TOML file: `--config FILE`, else `config.toml` in the platform
//!    configuration directory (e.g. `~/.config/dupefind/config.toml`)
//! 3. Environment variables prefixed `DUPEFIND_` (e.g. `DUPEFIND_ALGORITHM=sha256`)
//! 4. Command-line flags, applied by [`Config::apply_cli`]
//!
//! ```toml
//! algorithm = "sha256"
//! block_size = 65536
//! links = "collapse"
//! skip_empty = true
//! page_size = 0
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, OutputFormat};
use crate::duplicates::{FinderConfig, LinkPolicy};
use crate::scanner::{HashAlgorithm, Hasher, WalkerConfig, DEFAULT_BLOCK_SIZE};

/// Groups shown per page by the text reporter.
pub const DEFAULT_PAGE_SIZE: usize = 3;

/// Errors raised while building the effective configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The block size is zero or not a multiple of 512.
    #[error("Invalid block size {0}: must be a positive multiple of 512 bytes")]
    InvalidBlockSize(usize),

    /// The configuration could not be rendered as TOML.
    #[error("Cannot render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Effective application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Report format.
    pub output: OutputFormat,
    /// Content digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Read block size for hashing, in bytes.
    pub block_size: usize,
    /// Treatment of hard links and symlinks.
    pub links: LinkPolicy,
    /// Descend into symlinked directories.
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Leave empty files out of the report.
    pub skip_empty: bool,
    /// Abort on enumeration errors.
    pub strict: bool,
    /// Groups per page in interactive text output (0 disables paging).
    pub page_size: usize,
    /// Show progress bars on an interactive stderr.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputFormat::Text,
            algorithm: HashAlgorithm::Blake3,
            block_size: DEFAULT_BLOCK_SIZE,
            links: LinkPolicy::Report,
            follow_symlinks: false,
            skip_hidden: false,
            skip_empty: false,
            strict: false,
            page_size: DEFAULT_PAGE_SIZE,
            progress: true,
        }
    }
}

impl Config {
    /// Prefix of the environment variables read by [`Config::load`].
    pub const ENV_PREFIX: &'static str = "DUPEFIND_";

    /// Platform-specific location of the configuration file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "dupefind", "dupefind")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The file, environment and default layers, without CLI flags.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(Self::ENV_PREFIX))
    }

    /// Load defaults, the configuration file and the environment.
    ///
    /// With `explicit` set, that file must exist. Otherwise the platform
    /// default file is used when present.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] if `explicit` does not exist
    /// - [`ConfigError::Load`] if a layer is malformed
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.is_file()),
        };

        match file {
            Some(ref path) => log::debug!("Loading configuration from {}", path.display()),
            None => log::debug!("No configuration file, using defaults and environment"),
        }

        Self::figment(file.as_deref())
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Override settings with the flags present on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(output) = cli.output {
            self.output = output;
        }
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(block_size) = cli.block_size {
            self.block_size = block_size;
        }
        if let Some(links) = cli.links {
            self.links = links;
        }
        if let Some(page_size) = cli.page_size {
            self.page_size = page_size;
        }
        self.follow_symlinks |= cli.follow_symlinks;
        self.skip_hidden |= cli.skip_hidden;
        self.skip_empty |= cli.skip_empty;
        self.strict |= cli.strict;
        if cli.no_progress {
            self.progress = false;
        }
    }

    /// Check values that the type system cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBlockSize`] for a zero or misaligned
    /// block size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 || self.block_size % 512 != 0 {
            return Err(ConfigError::InvalidBlockSize(self.block_size));
        }
        Ok(())
    }

    /// Render as TOML, in the format accepted by [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Finder settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_hasher(
                Hasher::new()
                    .with_algorithm(self.algorithm)
                    .with_block_size(self.block_size),
            )
            .with_link_policy(self.links)
            .with_skip_empty(self.skip_empty)
            .with_strict(self.strict)
            .with_walker_config(WalkerConfig::new(self.follow_symlinks, self.skip_hidden))
    }
}
