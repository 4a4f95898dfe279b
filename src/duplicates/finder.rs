//! Pipeline orchestration.
//!
//! # Overview
//!
//! [`DuplicateFinder`] wires the pipeline together inside one thread scope:
//!
//! 1. **Aggregator** - a single thread owning the digest map
//! 2. **Workers** - `workers` threads pulling from a bounded queue
//! 3. **Scanner** - runs on the calling thread, feeding the queue
//! 4. **Drain** - scanner closes the queue, every worker is joined, then the
//!    aggregator is joined and its map frozen into an [`Aggregate`]
//!
//! The caller only ever sees the finished [`Aggregate`]; there is no way to
//! read it while a worker may still be writing.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let config = FinderConfig::default().with_workers(8);
//! let finder = DuplicateFinder::new(config);
//!
//! let (aggregate, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
//!
//! println!("Found {} duplicate groups", summary.duplicate_groups);
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use bytesize::ByteSize;
use crossbeam_channel::bounded;

use super::aggregator::{self, Aggregator};
use super::groups::Aggregate;
use super::pool::{WorkerContext, WorkerPool};
use crate::progress::ProgressCallback;
use crate::scanner::{Eligibility, HashAlgorithm, Hasher, JwalkWalker, ScanError, Scanner, TreeWalker};

/// Default number of hashing workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default capacity of the work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing workers (at least 1)
    pub workers: usize,
    /// Capacity of the bounded queue between scanner and workers (at least 1)
    pub queue_capacity: usize,
    /// Size/age thresholds
    pub eligibility: Eligibility,
    /// Hash function for every file in the run
    pub hash_algorithm: HashAlgorithm,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Shutdown flag for graceful termination
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Progress callback for the scanning and hashing phases
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("workers", &self.workers)
            .field("queue_capacity", &self.queue_capacity)
            .field("eligibility", &self.eligibility)
            .field("hash_algorithm", &self.hash_algorithm)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            eligibility: Eligibility::default(),
            hash_algorithm: HashAlgorithm::default(),
            follow_symlinks: false,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing workers. Zero is raised to one.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the work queue capacity. Zero is raised to one.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the size/age thresholds.
    #[must_use]
    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// Set the hash algorithm.
    #[must_use]
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Follow symbolic links while walking.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from the scan phase.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Regular files reported by the walker
    pub files_seen: usize,
    /// Files that passed the size/age filter and were queued
    pub eligible_files: usize,
    /// Files rejected by the size/age filter
    pub ineligible_files: usize,
    /// Bytes of all eligible files
    pub eligible_bytes: u64,
    /// Files successfully fingerprinted
    pub hashed_files: usize,
    /// Bytes of successfully fingerprinted files
    pub hashed_bytes: u64,
    /// Files that could not be fingerprinted
    pub fingerprint_errors: usize,
    /// Number of digests shared by more than one file
    pub duplicate_groups: usize,
    /// Files in duplicate groups beyond one copy each
    pub duplicate_files: usize,
    /// Bytes held by those extra copies
    pub reclaimable_space: u64,
    /// Wall-clock time from scan start to drain
    pub scan_duration: Duration,
    /// Number of workers that ran
    pub workers: usize,
    /// Entries the walker could not read
    pub walk_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Whether any walk or fingerprint error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.walk_errors.is_empty() || self.fingerprint_errors > 0
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format hashed bytes as human-readable string.
    #[must_use]
    pub fn hashed_display(&self) -> String {
        ByteSize::b(self.hashed_bytes).to_string()
    }
}

/// Fatal errors that stop the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root exists but cannot be listed.
    #[error("Cannot read root directory {path}: {source}")]
    RootUnreadable {
        /// The root that was requested
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Hashing workers died before the queue was drained.
    #[error("Hashing workers stopped unexpectedly ({panicked} panicked)")]
    WorkersFailed {
        /// Number of workers that panicked
        panicked: usize,
    },

    /// The aggregator thread panicked; results are lost.
    #[error("Aggregator thread panicked")]
    AggregatorFailed,
}

/// Runs the scan → hash → aggregate pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    walker: Box<dyn TreeWalker>,
}

impl DuplicateFinder {
    /// Create a finder that walks the real filesystem.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let walker = Box::new(JwalkWalker::new(config.follow_symlinks));
        Self { config, walker }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Replace the tree walker.
    #[must_use]
    pub fn with_walker(mut self, walker: Box<dyn TreeWalker>) -> Self {
        self.walker = walker;
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Scan `root` and group every eligible file by content digest.
    ///
    /// Per-entry walk and fingerprint failures never abort the run; they
    /// are counted in the summary and kept in the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - `root` does not exist, is not a directory, or cannot be listed
    /// - shutdown was requested before the queue drained
    /// - a worker or the aggregator thread panicked
    pub fn find_duplicates(&self, root: &Path) -> Result<(Aggregate, ScanSummary), FinderError> {
        validate_root(root)?;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Starting duplicate scan of {} ({} workers, {})",
            root.display(),
            self.config.workers,
            self.config.hash_algorithm
        );

        let start_time = Instant::now();
        let now = SystemTime::now();

        let mut scanner = Scanner::new(self.walker.as_ref(), self.config.eligibility);
        if let Some(ref flag) = self.config.shutdown_flag {
            scanner = scanner.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.config.progress_callback {
            scanner = scanner.with_progress_callback(Arc::clone(callback));
        }

        let context = WorkerContext {
            hasher: Hasher::new(self.config.hash_algorithm),
            shutdown_flag: self.config.shutdown_flag.clone(),
            progress_callback: self.config.progress_callback.clone(),
        };

        let (queue_tx, queue_rx) = bounded(self.config.queue_capacity.max(1));
        let (results, results_rx) = aggregator::channel();

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("hashing", 0);
        }

        let (scan_stats, pool_stats, workers, aggregated) = thread::scope(|s| {
            let aggregator = s.spawn(move || Aggregator::new().run(&results_rx));
            let pool = WorkerPool::start(s, self.config.workers, queue_rx, results, &context);
            let workers = pool.len();

            let scan_stats = scanner.scan(root, now, queue_tx);
            log::debug!("Queue closed, waiting for workers to drain");
            let pool_stats = pool.join();

            (scan_stats, pool_stats, workers, aggregator.join())
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("hashing");
        }

        let aggregate = aggregated
            .map_err(|_| FinderError::AggregatorFailed)?
            .snapshot();

        if pool_stats.panicked > 0 || scan_stats.queue_disconnected {
            return Err(FinderError::WorkersFailed {
                panicked: pool_stats.panicked,
            });
        }
        if scan_stats.interrupted || self.config.is_shutdown_requested() {
            log::info!("Scan interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        let duplicates = aggregate.duplicate_groups();
        let summary = ScanSummary {
            files_seen: scan_stats.files_seen,
            eligible_files: scan_stats.enqueued,
            ineligible_files: scan_stats.ineligible,
            eligible_bytes: scan_stats.enqueued_bytes,
            hashed_files: aggregate.hashed_files(),
            hashed_bytes: aggregate.hashed_bytes(),
            fingerprint_errors: aggregate.failures().len(),
            duplicate_groups: duplicates.len(),
            duplicate_files: duplicates.iter().map(|g| g.len() - 1).sum(),
            reclaimable_space: duplicates.iter().map(|g| g.wasted_space()).sum(),
            scan_duration: start_time.elapsed(),
            workers,
            walk_errors: scan_stats.errors,
        };

        log::info!(
            "Scan finished in {:.2?}: {} eligible, {} hashed ({}), {} duplicate groups, {} reclaimable",
            summary.scan_duration,
            summary.eligible_files,
            summary.hashed_files,
            summary.hashed_display(),
            summary.duplicate_groups,
            summary.reclaimable_display()
        );

        Ok((aggregate, summary))
    }
}

/// Check that the root exists, is a directory and can be listed.
fn validate_root(root: &Path) -> Result<(), FinderError> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FinderError::PathNotFound(root.to_path_buf()),
        _ => FinderError::RootUnreadable {
            path: root.to_path_buf(),
            source: e,
        },
    })?;
    if !metadata.is_dir() {
        return Err(FinderError::NotADirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|e| FinderError::RootUnreadable {
        path: root.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
