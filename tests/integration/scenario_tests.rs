//! End-to-end runs over small trees.

use dupesweep::actions::{remover_for, DeleteMode, KeepPolicy, Reconciler};
use dupesweep::duplicates::DuplicateFinder;
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn write_with_age(dir: &Path, name: &str, content: &[u8], age: Duration) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    let mtime = SystemTime::now() - age;
    filetime::set_file_mtime(&path, FileTime::from_system_time(mtime)).unwrap();
    path
}

const OLD: Duration = Duration::from_secs(2 * 86_400);

#[test]
fn test_identical_pair_is_removed_with_keep_none() {
    let dir = tempdir().unwrap();
    let a = write_with_age(dir.path(), "a.txt", &[b'q'; 2048], OLD);
    let b = write_with_age(dir.path(), "b.txt", &[b'q'; 2048], OLD);

    let (aggregate, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(summary.duplicate_groups, 1);
    let dupes = aggregate.duplicate_groups();
    assert!(dupes[0].contains(&a));
    assert!(dupes[0].contains(&b));

    let remover = remover_for(DeleteMode::Permanent);
    Reconciler::new(KeepPolicy::None, remover.as_ref()).reconcile(aggregate.groups());

    assert!(fs::metadata(&a).is_err());
    assert!(fs::metadata(&b).is_err());
}

#[test]
fn test_identical_pair_leaves_one_with_keep_one() {
    let dir = tempdir().unwrap();
    let a = write_with_age(dir.path(), "a.txt", &[b'q'; 2048], OLD);
    let b = write_with_age(dir.path(), "b.txt", &[b'q'; 2048], OLD);

    let (aggregate, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let remover = remover_for(DeleteMode::Permanent);
    Reconciler::new(KeepPolicy::One, remover.as_ref()).reconcile(aggregate.groups());

    let survivors = [&a, &b].iter().filter(|p| p.exists()).count();
    assert_eq!(survivors, 1);
    assert!(a.exists());
}

#[test]
fn test_small_file_is_never_hashed() {
    let dir = tempdir().unwrap();
    let small = write_with_age(dir.path(), "small.txt", &[b'z'; 500], OLD);
    let big = write_with_age(dir.path(), "big.txt", &[b'z'; 5000], OLD);

    let (aggregate, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(summary.files_seen, 2);
    assert_eq!(summary.eligible_files, 1);
    assert_eq!(summary.ineligible_files, 1);
    assert!(aggregate.group_of(&small).is_none());
    assert!(aggregate.group_of(&big).is_some());
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_recent_copies_are_left_alone() {
    let dir = tempdir().unwrap();
    let a = write_with_age(dir.path(), "a.txt", &[b'r'; 2048], Duration::from_secs(3600));
    let b = write_with_age(dir.path(), "b.txt", &[b'r'; 2048], Duration::from_secs(3600));

    let (aggregate, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let remover = remover_for(DeleteMode::Permanent);
    let result = Reconciler::new(KeepPolicy::None, remover.as_ref()).reconcile(aggregate.groups());

    assert_eq!(summary.eligible_files, 0);
    assert!(result.groups.is_empty());
    assert!(a.exists());
    assert!(b.exists());
}

#[test]
fn test_future_mtime_is_ineligible() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("future.txt");
    fs::write(&path, [b'f'; 2048]).unwrap();
    let future = SystemTime::now() + Duration::from_secs(86_400);
    filetime::set_file_mtime(&path, FileTime::from_system_time(future)).unwrap();

    let (_, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(summary.ineligible_files, 1);
    assert_eq!(summary.eligible_files, 0);
}

#[test]
fn test_empty_tree() {
    let dir = tempdir().unwrap();
    let (aggregate, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(aggregate.groups().is_empty());
    assert_eq!(summary.files_seen, 0);
    assert!(!summary.has_errors());
}

#[test]
fn test_nested_duplicates_across_directories() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("x/y")).unwrap();
    fs::create_dir_all(dir.path().join("z")).unwrap();
    let deep = write_with_age(dir.path(), "x/y/deep.dat", &[b'n'; 3000], OLD);
    let shallow = write_with_age(dir.path(), "z/shallow.dat", &[b'n'; 3000], OLD);

    let (aggregate, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let group = aggregate.group_of(&deep).unwrap();
    assert!(group.contains(&shallow));
    assert_eq!(group.size(), 3000);
}
