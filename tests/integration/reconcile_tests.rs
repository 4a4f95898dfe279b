use dupesweep::actions::{remover_for, DeleteMode, KeepPolicy, Reconciler};
use dupesweep::duplicates::{Aggregate, DuplicateFinder, FinderConfig};
use dupesweep::error::ExitCode;
use dupesweep::output::{JsonOutput, RunReport};
use dupesweep::scanner::{Eligibility, HashAlgorithm};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn write_aged(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    let old = SystemTime::now() - Duration::from_secs(3 * 86_400);
    filetime::set_file_mtime(&path, FileTime::from_system_time(old)).unwrap();
    path
}

fn scan(root: &Path) -> Aggregate {
    DuplicateFinder::with_defaults()
        .find_duplicates(root)
        .unwrap()
        .0
}

#[test]
fn test_keep_none_removes_every_copy() {
    let dir = tempdir().unwrap();
    let a = write_aged(dir.path(), "a.bin", &[3u8; 4096]);
    let b = write_aged(dir.path(), "b.bin", &[3u8; 4096]);
    let c = write_aged(dir.path(), "c.bin", &[3u8; 4096]);
    let unique = write_aged(dir.path(), "unique.bin", &[4u8; 4096]);

    let aggregate = scan(dir.path());
    let remover = remover_for(DeleteMode::Permanent);
    let result = Reconciler::new(KeepPolicy::None, remover.as_ref()).reconcile(aggregate.groups());

    assert_eq!(result.deleted_count(), 3);
    assert_eq!(result.failed_count(), 0);
    assert_eq!(result.bytes_reclaimed(), 3 * 4096);
    assert!(result.groups[0].kept.is_none());
    assert!(!a.exists() && !b.exists() && !c.exists());
    assert!(unique.exists(), "singletons are never touched");
}

#[test]
fn test_keep_one_retains_smallest_path() {
    let dir = tempdir().unwrap();
    let b = write_aged(dir.path(), "b.bin", &[5u8; 2048]);
    let a = write_aged(dir.path(), "a.bin", &[5u8; 2048]);
    let c = write_aged(dir.path(), "c.bin", &[5u8; 2048]);

    let aggregate = scan(dir.path());
    let remover = remover_for(DeleteMode::Permanent);
    let result = Reconciler::new(KeepPolicy::One, remover.as_ref()).reconcile(aggregate.groups());

    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].kept.as_deref(), Some(a.as_path()));
    assert_eq!(result.deleted_count(), 2);
    assert!(a.exists());
    assert!(!b.exists());
    assert!(!c.exists());
}

fn scan_following_links(root: &Path) -> Aggregate {
    let config = FinderConfig::default()
        .with_follow_symlinks(true)
        .with_eligibility(Eligibility::new(0, Duration::ZERO));
    DuplicateFinder::new(config).find_duplicates(root).unwrap().0
}

#[cfg(unix)]
#[test]
fn test_keep_one_with_followed_link_keeps_real_file() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("z_real.bin");
    fs::write(&real, [9u8; 4096]).unwrap();
    let link = dir.path().join("a_link.bin");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let aggregate = scan_following_links(dir.path());
    let result = Reconciler::new(KeepPolicy::One, remover_for(DeleteMode::Permanent).as_ref())
        .reconcile(aggregate.groups());

    assert_eq!(result.deleted_count(), 0);
    assert!(result.groups.is_empty());
    assert_eq!(fs::read(&real).unwrap(), vec![9u8; 4096]);
    assert!(link.exists());
}

#[cfg(unix)]
#[test]
fn test_keep_one_with_followed_link_and_real_copy() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("z_real.bin");
    fs::write(&real, [9u8; 4096]).unwrap();
    let copy = dir.path().join("m_copy.bin");
    fs::write(&copy, [9u8; 4096]).unwrap();
    std::os::unix::fs::symlink(&real, dir.path().join("a_link.bin")).unwrap();

    let aggregate = scan_following_links(dir.path());
    let result = Reconciler::new(KeepPolicy::One, remover_for(DeleteMode::Permanent).as_ref())
        .reconcile(aggregate.groups());

    assert_eq!(result.groups.len(), 1);
    let kept = result.groups[0].kept.as_deref().unwrap();
    assert_ne!(kept, dir.path().join("a_link.bin"));
    assert_eq!(fs::read(&real).unwrap(), vec![9u8; 4096]);
}

#[cfg(unix)]
#[test]
fn test_file_behind_symlinked_dir_is_one_member() {
    let dir = tempdir().unwrap();
    let real_dir = dir.path().join("real");
    fs::create_dir(&real_dir).unwrap();
    let data = real_dir.join("data.bin");
    fs::write(&data, [6u8; 2048]).unwrap();
    std::os::unix::fs::symlink(&real_dir, dir.path().join("alias")).unwrap();

    let aggregate = scan_following_links(dir.path());

    assert_eq!(aggregate.hashed_files(), 1);
    assert!(aggregate.duplicate_groups().is_empty());

    let result = Reconciler::new(KeepPolicy::None, remover_for(DeleteMode::Permanent).as_ref())
        .reconcile(aggregate.groups());
    assert_eq!(result.deleted_count(), 0);
    assert!(data.exists());
}

#[test]
fn test_dry_run_touches_nothing() {
    let dir = tempdir().unwrap();
    let a = write_aged(dir.path(), "a.bin", &[6u8; 2048]);
    let b = write_aged(dir.path(), "b.bin", &[6u8; 2048]);

    let aggregate = scan(dir.path());
    let remover = remover_for(DeleteMode::DryRun);
    let result = Reconciler::new(KeepPolicy::None, remover.as_ref()).reconcile(aggregate.groups());

    assert_eq!(result.deleted_count(), 2);
    assert!(result.outcomes().all(|o| o.dry_run));
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_failed_deletion_does_not_stop_the_rest() {
    let dir = tempdir().unwrap();
    let a = write_aged(dir.path(), "a.bin", &[8u8; 2048]);
    let b = write_aged(dir.path(), "b.bin", &[8u8; 2048]);
    let c = write_aged(dir.path(), "c.bin", &[8u8; 2048]);

    let aggregate = scan(dir.path());
    // Gone before reconciliation reaches it.
    fs::remove_file(&b).unwrap();

    let remover = remover_for(DeleteMode::Permanent);
    let result = Reconciler::new(KeepPolicy::None, remover.as_ref()).reconcile(aggregate.groups());

    assert_eq!(result.deleted_count(), 2);
    assert_eq!(result.failed_count(), 1);
    let failed = result.outcomes().find(|o| !o.success).unwrap();
    assert_eq!(failed.path, b);
    assert!(failed.error.is_some());
    assert!(!a.exists());
    assert!(!c.exists());
}

#[test]
fn test_shutdown_stops_reconciliation() {
    let dir = tempdir().unwrap();
    let a = write_aged(dir.path(), "a.bin", &[9u8; 2048]);
    let b = write_aged(dir.path(), "b.bin", &[9u8; 2048]);

    let aggregate = scan(dir.path());
    let remover = remover_for(DeleteMode::Permanent);
    let result = Reconciler::new(KeepPolicy::None, remover.as_ref())
        .with_shutdown_flag(Arc::new(AtomicBool::new(true)))
        .reconcile(aggregate.groups());

    assert!(result.interrupted);
    assert_eq!(result.deleted_count(), 0);
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_report_reflects_reconciliation() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "a.bin", &[1u8; 2048]);
    write_aged(dir.path(), "b.bin", &[1u8; 2048]);

    let (aggregate, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let remover = remover_for(DeleteMode::DryRun);
    let result = Reconciler::new(KeepPolicy::One, remover.as_ref()).reconcile(aggregate.groups());
    let report = RunReport::builder(
        dir.path(),
        KeepPolicy::One,
        DeleteMode::DryRun,
        HashAlgorithm::Sha256,
    )
    .finish(aggregate, summary, result, Duration::from_millis(5));

    assert_eq!(report.exit_code(), ExitCode::Success);
    let json: serde_json::Value =
        serde_json::from_str(&JsonOutput::new(&report).to_json().unwrap()).unwrap();
    assert_eq!(json["summary"]["duplicate_groups"], 1);
    assert_eq!(json["summary"]["deleted"], 1);
    assert_eq!(json["summary"]["dry_run"], true);
    assert_eq!(json["delete_mode"], "dry-run");
    assert_eq!(json["groups"][0]["paths"].as_array().unwrap().len(), 2);
}
