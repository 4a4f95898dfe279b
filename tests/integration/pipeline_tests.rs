use dupesweep::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupesweep::scanner::{Eligibility, HashAlgorithm, ScanError, TreeWalker, WalkEntry};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::{tempdir, TempDir};

fn two_days_ago() -> SystemTime {
    SystemTime::now() - Duration::from_secs(2 * 86_400)
}

fn write_aged(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    filetime::set_file_mtime(&path, FileTime::from_system_time(two_days_ago())).unwrap();
    path
}

/// 36 files in 6 content classes spread over nested directories.
fn populated_tree() -> TempDir {
    let dir = tempdir().unwrap();
    for i in 0..36 {
        let class = i % 6;
        let content = vec![b'a' + class as u8; 1024 + class * 100];
        write_aged(dir.path(), &format!("d{}/f{:02}.bin", i % 4, i), &content);
    }
    dir
}

fn sorted_groups(finder: &DuplicateFinder, root: &Path) -> Vec<Vec<PathBuf>> {
    let (aggregate, _) = finder.find_duplicates(root).unwrap();
    let mut groups: Vec<Vec<PathBuf>> = aggregate
        .duplicate_groups()
        .iter()
        .map(|g| {
            let mut paths = g.paths();
            paths.sort();
            paths
        })
        .collect();
    groups.sort();
    groups
}

/// Walker that replays a fixed listing, including errors.
struct ListedWalker {
    files: Vec<WalkEntry>,
    unreadable: Vec<PathBuf>,
}

impl TreeWalker for ListedWalker {
    fn walk<'a>(
        &'a self,
        _root: &Path,
    ) -> Box<dyn Iterator<Item = Result<WalkEntry, ScanError>> + 'a> {
        let files = self.files.iter().cloned().map(Ok);
        let errors = self
            .unreadable
            .iter()
            .map(|p| Err(ScanError::PermissionDenied(p.clone())));
        Box::new(files.chain(errors))
    }
}

#[test]
fn test_grouping_is_independent_of_worker_count() {
    let dir = populated_tree();

    let baseline = sorted_groups(
        &DuplicateFinder::new(FinderConfig::default().with_workers(1)),
        dir.path(),
    );
    assert_eq!(baseline.len(), 6);
    assert!(baseline.iter().all(|g| g.len() == 6));

    for workers in [2, 8, 32] {
        let finder = DuplicateFinder::new(FinderConfig::default().with_workers(workers));
        assert_eq!(sorted_groups(&finder, dir.path()), baseline, "{workers} workers");
    }
}

#[test]
fn test_queue_capacity_of_one_still_drains() {
    let dir = populated_tree();
    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_workers(3)
            .with_queue_capacity(1),
    );

    let (aggregate, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.eligible_files, 36);
    assert_eq!(summary.hashed_files, 36);
    assert_eq!(aggregate.hashed_files(), 36);
    assert_eq!(summary.duplicate_groups, 6);
    assert_eq!(summary.duplicate_files, 30);
}

#[test]
fn test_every_hashed_path_lands_in_exactly_one_group() {
    let dir = populated_tree();
    let (aggregate, _) = DuplicateFinder::new(FinderConfig::default().with_workers(8))
        .find_duplicates(dir.path())
        .unwrap();

    let mut all: Vec<PathBuf> = aggregate
        .groups()
        .values()
        .flat_map(|g| g.paths())
        .collect();
    let total = all.len();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), total);
    assert_eq!(total, 36);
}

#[test]
fn test_vanished_file_becomes_fingerprint_error() {
    let dir = tempdir().unwrap();
    let a = write_aged(dir.path(), "a.txt", &[7u8; 2048]);
    let b = write_aged(dir.path(), "b.txt", &[7u8; 2048]);
    let ghost = dir.path().join("ghost.txt");

    let walker = ListedWalker {
        files: vec![
            WalkEntry::file(a.clone(), 2048, two_days_ago()),
            WalkEntry::file(ghost.clone(), 2048, two_days_ago()),
            WalkEntry::file(b.clone(), 2048, two_days_ago()),
        ],
        unreadable: Vec::new(),
    };
    let finder = DuplicateFinder::with_defaults().with_walker(Box::new(walker));

    let (aggregate, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.eligible_files, 3);
    assert_eq!(summary.hashed_files, 2);
    assert_eq!(summary.fingerprint_errors, 1);
    assert_eq!(aggregate.failures()[0].path(), ghost.as_path());
    assert!(aggregate.group_of(&ghost).is_none());

    let dupes = aggregate.duplicate_groups();
    assert_eq!(dupes.len(), 1);
    assert!(dupes[0].contains(&a));
    assert!(dupes[0].contains(&b));
}

#[test]
fn test_walk_errors_do_not_stop_the_scan() {
    let dir = tempdir().unwrap();
    let a = write_aged(dir.path(), "a.txt", &[1u8; 4096]);
    let b = write_aged(dir.path(), "b.txt", &[1u8; 4096]);

    let walker = ListedWalker {
        files: vec![
            WalkEntry::dir(dir.path().to_path_buf()),
            WalkEntry::file(a, 4096, two_days_ago()),
            WalkEntry::file(b, 4096, two_days_ago()),
        ],
        unreadable: vec![dir.path().join("locked"), dir.path().join("locked2")],
    };
    let finder = DuplicateFinder::with_defaults().with_walker(Box::new(walker));

    let (_, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.walk_errors.len(), 2);
    assert!(summary.has_errors());
    assert_eq!(summary.files_seen, 2);
    assert_eq!(summary.duplicate_groups, 1);
}

#[test]
fn test_hash_algorithms_agree_on_grouping() {
    let dir = populated_tree();
    let sha = sorted_groups(
        &DuplicateFinder::new(FinderConfig::default().with_hash_algorithm(HashAlgorithm::Sha256)),
        dir.path(),
    );
    let blake = sorted_groups(
        &DuplicateFinder::new(FinderConfig::default().with_hash_algorithm(HashAlgorithm::Blake3)),
        dir.path(),
    );
    assert_eq!(sha, blake);
}

#[test]
fn test_shutdown_before_scan_is_interrupted() {
    let dir = populated_tree();
    let flag = Arc::new(AtomicBool::new(true));
    let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));

    let result = finder.find_duplicates(dir.path());
    assert!(matches!(result, Err(FinderError::Interrupted)));
}

#[test]
fn test_root_must_be_an_existing_directory() {
    let dir = tempdir().unwrap();
    let file = write_aged(dir.path(), "plain.txt", b"not a dir");
    let finder = DuplicateFinder::with_defaults();

    assert!(matches!(
        finder.find_duplicates(&dir.path().join("missing")),
        Err(FinderError::PathNotFound(_))
    ));
    assert!(matches!(
        finder.find_duplicates(&file),
        Err(FinderError::NotADirectory(_))
    ));
}

#[test]
fn test_custom_eligibility_admits_fresh_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"fresh").unwrap();
    fs::write(dir.path().join("b.txt"), b"fresh").unwrap();

    let strict = DuplicateFinder::with_defaults();
    let (_, summary) = strict.find_duplicates(dir.path()).unwrap();
    assert_eq!(summary.eligible_files, 0);
    assert_eq!(summary.ineligible_files, 2);

    let lenient = DuplicateFinder::new(
        FinderConfig::default().with_eligibility(Eligibility::new(0, Duration::ZERO)),
    );
    let (_, summary) = lenient.find_duplicates(dir.path()).unwrap();
    assert_eq!(summary.eligible_files, 2);
    assert_eq!(summary.duplicate_groups, 1);
}
