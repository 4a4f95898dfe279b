//! The producer side of the pipeline.
//!
//! [`Scanner`] drives a [`TreeWalker`], applies the [`Eligibility`] filter
//! and hands every eligible file to the worker pool through a bounded
//! channel. Dropping the sender at the end of [`Scanner::scan`] is what
//! closes the queue, so workers only see "closed" once the walk has
//! fully terminated.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crossbeam_channel::Sender;

use super::{Eligibility, FileCandidate, ScanError, TreeWalker};
use crate::progress::ProgressCallback;

/// Counters and per-entry errors collected while walking.
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Regular files reported by the walker
    pub files_seen: usize,
    /// Files handed to the worker pool
    pub enqueued: usize,
    /// Files rejected by the size/age filter
    pub ineligible: usize,
    /// Bytes of all enqueued files
    pub enqueued_bytes: u64,
    /// Entries the walker could not read
    pub errors: Vec<ScanError>,
    /// The walk stopped early because shutdown was requested
    pub interrupted: bool,
    /// The walk stopped early because every worker had gone away
    pub queue_disconnected: bool,
}

/// Walks a tree and feeds eligible files into the work queue.
pub struct Scanner<'w> {
    walker: &'w dyn TreeWalker,
    eligibility: Eligibility,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl<'w> Scanner<'w> {
    #[must_use]
    pub fn new(walker: &'w dyn TreeWalker, eligibility: Eligibility) -> Self {
        Self {
            walker,
            eligibility,
            shutdown_flag: None,
            progress_callback: None,
        }
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

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk `root` and send every eligible file into `queue`.
    ///
    /// Blocks whenever the queue is full. Consumes the sender so the queue
    /// is closed when this returns.
    pub fn scan(&self, root: &Path, now: SystemTime, queue: Sender<FileCandidate>) -> ScanStats {
        let mut stats = ScanStats::default();

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("scanning", 0);
        }

        for result in self.walker.walk(root) {
            if self.is_shutdown_requested() {
                log::debug!("Scanner: Shutdown requested, stopping walk");
                stats.interrupted = true;
                break;
            }

            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    stats.errors.push(e);
                    continue;
                }
            };
            if entry.is_dir {
                continue;
            }

            stats.files_seen += 1;
            if !self.eligibility.is_eligible(entry.size, entry.modified, now) {
                log::trace!(
                    "Skipping ineligible file ({} bytes): {}",
                    entry.size,
                    entry.path.display()
                );
                stats.ineligible += 1;
                continue;
            }

            let size = entry.size;
            let candidate = FileCandidate::new(entry.path, size, entry.modified)
                .with_id(entry.id)
                .with_symlink(entry.is_symlink);
            if let Err(rejected) = queue.send(candidate) {
                log::error!(
                    "Work queue disconnected, no worker left to hash {}",
                    rejected.0.path.display()
                );
                stats.queue_disconnected = true;
                break;
            }
            stats.enqueued += 1;
            stats.enqueued_bytes += size;

            if let Some(ref callback) = self.progress_callback {
                callback.on_progress(stats.enqueued, &root.to_string_lossy());
            }
        }

        drop(queue);

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("scanning");
        }

        log::info!(
            "Scan complete: {} files seen, {} eligible, {} walk errors",
            stats.files_seen,
            stats.enqueued,
            stats.errors.len()
        );
        stats
    }
}
