//! Fixed-size pool of hashing workers.
//!
//! Each worker pulls [`FileCandidate`]s from the shared bounded queue,
//! fingerprints them and forwards the outcome to the aggregator. A worker
//! exits once the queue is closed and empty, so [`WorkerPool::join`] is the
//! drain barrier: when it returns, every enqueued file has been handled.
//!
//! After shutdown is requested, workers keep pulling from the queue but
//! discard items without reading them. The producer can never block on a
//! full queue with no consumer left.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam_channel::Receiver;

use super::aggregator::AggregatorHandle;
use crate::progress::ProgressCallback;
use crate::scanner::{FileCandidate, Hasher};

/// Per-worker counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// Files fingerprinted
    pub hashed: usize,
    /// Files that could not be fingerprinted
    pub failed: usize,
    /// Files drained without hashing after shutdown
    pub skipped: usize,
    /// Bytes of successfully hashed files
    pub hashed_bytes: u64,
}

impl WorkerStats {
    fn merge(&mut self, other: Self) {
        self.hashed += other.hashed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.hashed_bytes += other.hashed_bytes;
    }
}

/// Combined result of [`WorkerPool::join`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Sum over all workers that finished normally
    pub totals: WorkerStats,
    /// Workers that terminated by panicking
    pub panicked: usize,
}

/// Shared state every worker reads.
#[derive(Clone)]
pub struct WorkerContext {
    /// Fingerprinter
    pub hasher: Hasher,
    /// Set when the run should stop hashing
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Receives "hashing" progress
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl WorkerContext {
    #[must_use]
    pub fn new(hasher: Hasher) -> Self {
        Self {
            hasher,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

impl std::fmt::Debug for WorkerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerContext")
            .field("hasher", &self.hasher)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

/// Running workers inside a thread scope.
pub struct WorkerPool<'scope> {
    handles: Vec<ScopedJoinHandle<'scope, WorkerStats>>,
}

impl<'scope> WorkerPool<'scope> {
    /// Spawn `size` workers on `scope`.
    ///
    /// `queue` and `results` are moved in; each worker gets its own clone,
    /// so the originals are gone once this returns.
    pub fn start<'env>(
        scope: &'scope Scope<'scope, 'env>,
        size: usize,
        queue: Receiver<FileCandidate>,
        results: AggregatorHandle,
        context: &WorkerContext,
    ) -> Self {
        let size = size.max(1);
        let completed = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(size);

        for id in 0..size {
            let queue = queue.clone();
            let results = results.clone();
            let context = context.clone();
            let completed = Arc::clone(&completed);
            let handle = thread::Builder::new()
                .name(format!("dupesweep-worker-{id}"))
                .spawn_scoped(scope, move || {
                    worker_loop(id, &queue, &results, &context, &completed)
                });
            match handle {
                Ok(handle) => handles.push(handle),
                Err(e) => log::error!("Failed to spawn worker {}: {}", id, e),
            }
        }

        log::debug!("Started {} hashing workers", handles.len());
        Self { handles }
    }

    /// Number of workers that were started.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no worker could be started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit.
    ///
    /// Workers only exit once the queue is closed, so the producer must
    /// have dropped its sender (or be about to) for this to return.
    #[must_use]
    pub fn join(self) -> PoolStats {
        let mut stats = PoolStats::default();
        for handle in self.handles {
            match handle.join() {
                Ok(worker) => stats.totals.merge(worker),
                Err(_) => {
                    log::error!("A hashing worker panicked");
                    stats.panicked += 1;
                }
            }
        }
        stats
    }
}

fn worker_loop(
    id: usize,
    queue: &Receiver<FileCandidate>,
    results: &AggregatorHandle,
    context: &WorkerContext,
    completed: &AtomicUsize,
) -> WorkerStats {
    let mut stats = WorkerStats::default();

    for file in queue.iter() {
        if context.is_shutdown_requested() {
            stats.skipped += 1;
            continue;
        }

        match context.hasher.fingerprint(&file.path) {
            Ok(digest) => {
                stats.hashed += 1;
                stats.hashed_bytes += file.size;
                let size = file.size;
                let display = file.path.to_string_lossy().into_owned();
                if results.record(digest, file).is_err() {
                    log::error!("Worker {}: aggregator is gone, dropping {}", id, display);
                }
                if let Some(ref callback) = context.progress_callback {
                    let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    callback.on_progress(current, &display);
                    callback.on_item_completed(size);
                }
            }
            Err(e) => {
                log::warn!("Failed to fingerprint {}", e);
                stats.failed += 1;
                let display = file.path.to_string_lossy().into_owned();
                if results.record_failure(e).is_err() {
                    log::error!("Worker {}: aggregator is gone", id);
                }
                let current = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = context.progress_callback {
                    callback.on_progress(current, &display);
                }
            }
        }
    }

    log::trace!(
        "Worker {} done: {} hashed, {} failed, {} skipped",
        id,
        stats.hashed,
        stats.failed,
        stats.skipped
    );
    stats
}
