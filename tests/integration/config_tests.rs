use clap::Parser;
use dupesweep::actions::{DeleteMode, KeepPolicy};
use dupesweep::cli::{Cli, Commands, ScanArgs};
use dupesweep::config::{Config, ConfigError};
use dupesweep::scanner::HashAlgorithm;
use std::fs;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::tempdir;

/// Environment variables are process-wide.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    "DUPESWEEP_WORKERS",
    "DUPESWEEP_KEEP",
    "DUPESWEEP_MIN_SIZE",
    "DUPESWEEP_DELETE_MODE",
    "DUPESWEEP_HASH",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

fn scan_args(extra: &[&str]) -> ScanArgs {
    let mut argv = vec!["dupesweep", "scan", "/data"];
    argv.extend_from_slice(extra);
    match Cli::try_parse_from(argv).unwrap().command {
        Commands::Scan(args) => args,
        Commands::Config => unreachable!(),
    }
}

#[test]
fn test_file_overrides_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "min_size = 4096\nmin_age_secs = 60\nhash = \"blake3\"\nkeep = \"one\"\n",
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.min_size, 4096);
    assert_eq!(config.min_age_secs, 60);
    assert_eq!(config.hash, HashAlgorithm::Blake3);
    assert_eq!(config.keep, Some(KeepPolicy::One));
    assert_eq!(config.workers, 4, "unset keys keep their defaults");
}

#[test]
fn test_env_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = 2\nkeep = \"one\"\n").unwrap();

    std::env::set_var("DUPESWEEP_WORKERS", "12");
    std::env::set_var("DUPESWEEP_KEEP", "none");
    std::env::set_var("DUPESWEEP_DELETE_MODE", "dry-run");
    let config = Config::load_from_path(&path);
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.workers, 12);
    assert_eq!(config.keep, Some(KeepPolicy::None));
    assert_eq!(config.delete_mode, DeleteMode::DryRun);
}

#[test]
fn test_cli_overrides_env() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    std::env::set_var("DUPESWEEP_WORKERS", "12");
    std::env::set_var("DUPESWEEP_MIN_SIZE", "10");
    let config = Config::load_from_path(&path);
    clear_env();

    let mut config = config.unwrap();
    config.merge_scan_args(&scan_args(&["--workers", "3", "--keep", "one", "--trash"]));

    let settings = config.validate().unwrap();
    assert_eq!(settings.workers, 3);
    assert_eq!(settings.eligibility.min_size, 10, "unset flags fall through");
    assert_eq!(settings.keep, KeepPolicy::One);
    assert_eq!(settings.delete_mode, DeleteMode::Trash);
}

#[test]
fn test_cli_age_and_size_suffixes() {
    let mut config = Config::default();
    config.merge_scan_args(&scan_args(&[
        "--min-size",
        "1MiB",
        "--min-age",
        "2h",
        "--keep",
        "none",
    ]));

    let settings = config.validate().unwrap();
    assert_eq!(settings.eligibility.min_size, 1024 * 1024);
    assert_eq!(settings.eligibility.min_age, Duration::from_secs(7200));
}

#[test]
fn test_missing_keep_policy_is_refused() {
    let mut config = Config::default();
    config.merge_scan_args(&scan_args(&["--dry-run"]));
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingKeepPolicy)
    ));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempdir().unwrap();
    let result = Config::load(Some(&dir.path().join("nope.toml")));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn test_invalid_value_is_an_error() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "keep = \"some\"\n").unwrap();

    let result = Config::load_from_path(&path);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_to_toml_reloads() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let config = Config {
        keep: Some(KeepPolicy::One),
        delete_mode: DeleteMode::Trash,
        workers: 6,
        ..Config::default()
    };
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, config.to_toml().unwrap()).unwrap();

    assert_eq!(Config::load_from_path(&path).unwrap(), config);
}
