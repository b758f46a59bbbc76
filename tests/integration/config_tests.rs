use clap::Parser;
use dupefind::cli::{Cli, OutputFormat};
use dupefind::config::{Config, ConfigError};
use dupefind::duplicates::LinkPolicy;
use dupefind::scanner::HashAlgorithm;
use figment::providers::Serialized;
use figment::Figment;
use std::fs;
use std::sync::MutexGuard;
use tempfile::tempdir;

use super::ENV_MUTEX;

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

/// Removes the listed variables when dropped.
struct EnvGuard(&'static [&'static str]);

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in self.0 {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_defaults_extract() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_toml() {
    let _lock = env_lock();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
algorithm = "sha256"
block_size = 65536
links = "collapse"
skip_empty = true
page_size = 0
output = "json"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.algorithm, HashAlgorithm::Sha256);
    assert_eq!(config.block_size, 65536);
    assert_eq!(config.links, LinkPolicy::Collapse);
    assert!(config.skip_empty);
    assert_eq!(config.page_size, 0);
    assert_eq!(config.output, OutputFormat::Json);
    assert!(!config.strict);
}

#[test]
fn test_env_overrides_file() {
    let _lock = env_lock();
    let _env = EnvGuard(&["DUPEFIND_ALGORITHM", "DUPEFIND_BLOCK_SIZE"]);
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "algorithm = \"sha256\"\nblock_size = 1024\nstrict = true\n").unwrap();

    std::env::set_var("DUPEFIND_ALGORITHM", "blake3");
    std::env::set_var("DUPEFIND_BLOCK_SIZE", "4096");

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert_eq!(config.block_size, 4096);
    assert!(config.strict);
}

#[test]
fn test_cli_overrides_env() {
    let _lock = env_lock();
    let _env = EnvGuard(&["DUPEFIND_LINKS", "DUPEFIND_PAGE_SIZE"]);
    std::env::set_var("DUPEFIND_LINKS", "collapse");
    std::env::set_var("DUPEFIND_PAGE_SIZE", "7");

    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    fs::write(&path, "").unwrap();

    let mut config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.links, LinkPolicy::Collapse);
    assert_eq!(config.page_size, 7);

    let cli = Cli::try_parse_from(["dupefind", "--links", "report"]).unwrap();
    config.apply_cli(&cli);
    assert_eq!(config.links, LinkPolicy::Report);
    assert_eq!(config.page_size, 7);
}

#[test]
fn test_invalid_value_is_reported() {
    let _lock = env_lock();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "algorithm = \"md5\"\n").unwrap();

    assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Load(_))));
}

#[test]
fn test_malformed_toml_is_reported() {
    let _lock = env_lock();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "this is not [toml").unwrap();

    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn test_misaligned_block_size_fails_validation() {
    let _lock = env_lock();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "block_size = 1000\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidBlockSize(1000))
    ));
}

#[test]
fn test_rendered_config_loads_back() {
    let _lock = env_lock();
    let original = Config {
        algorithm: HashAlgorithm::Sha256,
        links: LinkPolicy::Collapse,
        follow_symlinks: true,
        page_size: 12,
        ..Config::default()
    };

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, original.to_toml().unwrap()).unwrap();

    assert_eq!(Config::load(Some(&path)).unwrap(), original);
}
