use clap::Parser;
use dupefind::cli::Cli;
use dupefind::error::ExitCode;
use std::fs;
use std::path::Path;
use std::sync::MutexGuard;
use tempfile::{tempdir, TempDir};

use super::ENV_MUTEX;

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

/// A tree with one duplicate pair and an empty config file to isolate the run
/// from any user configuration.
fn fixture() -> (TempDir, TempDir) {
    let tree = tempdir().unwrap();
    fs::write(tree.path().join("a.txt"), b"hello").unwrap();
    fs::create_dir(tree.path().join("b")).unwrap();
    fs::write(tree.path().join("b").join("b.txt"), b"hello").unwrap();
    fs::write(tree.path().join("c.txt"), b"world").unwrap();

    let conf = tempdir().unwrap();
    fs::write(conf.path().join("config.toml"), "").unwrap();
    (tree, conf)
}

fn run(tree: &Path, conf: &Path, extra: &[&str]) -> (ExitCode, String) {
    let _lock = env_lock();
    let config = conf.join("config.toml");
    let mut args = vec![
        "dupefind".to_string(),
        tree.to_string_lossy().into_owned(),
        "--config".to_string(),
        config.to_string_lossy().into_owned(),
        "--quiet".to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));

    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    let code = dupefind::run_app_with(cli, &mut out, false).unwrap();
    (code, String::from_utf8(out).unwrap())
}

#[test]
fn test_text_report() {
    let (tree, conf) = fixture();
    let (code, text) = run(tree.path(), conf.path(), &[]);

    assert_eq!(code, ExitCode::Success);
    assert!(text.contains("Duplicate group 1"));
    assert!(!text.contains("Duplicate group 2"));
    assert!(text.contains("a.txt"));
    assert!(text.contains("b.txt"));
    assert!(!text.contains("c.txt"));
    assert!(!text.contains("Press Enter"));
}

#[test]
fn test_json_report_schema() {
    let (tree, conf) = fixture();
    let (code, json) = run(
        tree.path(),
        conf.path(),
        &["--output", "json", "--algorithm", "sha256"],
    );
    assert_eq!(code, ExitCode::Success);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["generated_at"].is_string());
    assert_eq!(value["algorithm"], "sha256");
    assert_eq!(value["complete"], true);

    let duplicates = value["duplicates"].as_array().unwrap();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0]["size"], 5);
    assert_eq!(duplicates[0]["digest"].as_str().unwrap().len(), 64);
    let files: Vec<&str> = duplicates[0]["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert!(files[0].ends_with("a.txt"));
    assert!(files[1].ends_with("b.txt"));

    assert_eq!(value["summary"]["total_files"], 3);
    assert_eq!(value["summary"]["duplicate_groups"], 1);
    assert_eq!(value["summary"]["skipped_files"], 0);
}

#[test]
fn test_no_duplicates_is_success() {
    let tree = tempdir().unwrap();
    fs::write(tree.path().join("only.txt"), b"unique").unwrap();
    let conf = tempdir().unwrap();
    fs::write(conf.path().join("config.toml"), "").unwrap();

    let (code, text) = run(tree.path(), conf.path(), &[]);
    assert_eq!(code, ExitCode::Success);
    assert!(text.contains("No duplicate files found."));
}

#[test]
fn test_print_config() {
    let (tree, conf) = fixture();
    fs::write(conf.path().join("config.toml"), "page_size = 9\n").unwrap();

    let (code, text) = run(
        tree.path(),
        conf.path(),
        &["--print-config", "--links", "collapse"],
    );

    assert_eq!(code, ExitCode::Success);
    assert!(text.contains("page_size = 9"));
    assert!(text.contains("links = \"collapse\""));
    assert!(!text.contains("Duplicate group"));
}

#[test]
fn test_config_file_applies_to_scan() {
    let (tree, conf) = fixture();
    fs::write(conf.path().join("config.toml"), "output = \"json\"\n").unwrap();

    let (_, out) = run(tree.path(), conf.path(), &[]);
    assert!(serde_json::from_str::<serde_json::Value>(&out).is_ok());
}
