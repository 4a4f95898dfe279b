//! Digest → group aggregation.
//!
//! # Overview
//!
//! The [`Aggregator`] is the single owner of the digest map. Workers never
//! touch the map directly: they send [`HashOutcome`] messages through a
//! cloneable [`AggregatorHandle`], and the aggregator folds them in on its
//! own thread. Every `record` is therefore applied exactly once, with no
//! lock around the map.
//!
//! [`Aggregator::run`] returns only after every handle has been dropped,
//! which is what guarantees that [`Aggregator::snapshot`] never observes a
//! half-filled map.
//!
//! A file is recorded at most once. Repeats are detected by path and, where
//! the platform provides one, by [`FileId`], so two paths that alias the
//! same file never form a group of their own.
//!
//! # Example
//!
//! ```
//! use dupesweep::duplicates::Aggregator;
//! use dupesweep::scanner::FileCandidate;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let (handle, join) = Aggregator::spawn();
//! let file = FileCandidate::new(PathBuf::from("/a"), 10, SystemTime::now());
//! handle.record([1u8; 32], file).unwrap();
//! drop(handle);
//!
//! let aggregate = join.join().unwrap().snapshot();
//! assert_eq!(aggregate.hashed_files(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, SendError, Sender};

use super::groups::{Aggregate, DigestGroup};
use crate::scanner::{Digest, FileCandidate, FileId, HashError};

/// What a worker learned about one file.
#[derive(Debug)]
pub enum HashOutcome {
    /// The file was fully read and fingerprinted.
    Hashed {
        /// Content digest
        digest: Digest,
        /// The file it belongs to
        file: FileCandidate,
    },
    /// The file could not be fingerprinted.
    Failed(HashError),
}

/// Cloneable sending side used by workers.
#[derive(Debug, Clone)]
pub struct AggregatorHandle {
    tx: Sender<HashOutcome>,
}

impl AggregatorHandle {
    /// Record that `file` has content digest `digest`.
    ///
    /// Safe to call from any number of threads at once.
    ///
    /// # Errors
    ///
    /// Fails only if the aggregator is no longer running.
    pub fn record(&self, digest: Digest, file: FileCandidate) -> Result<(), SendError<HashOutcome>> {
        self.tx.send(HashOutcome::Hashed { digest, file })
    }

    /// Record that a file could not be fingerprinted.
    ///
    /// # Errors
    ///
    /// Fails only if the aggregator is no longer running.
    pub fn record_failure(&self, error: HashError) -> Result<(), SendError<HashOutcome>> {
        self.tx.send(HashOutcome::Failed(error))
    }
}

/// Create a connected handle / receiver pair.
#[must_use]
pub fn channel() -> (AggregatorHandle, Receiver<HashOutcome>) {
    let (tx, rx) = unbounded();
    (AggregatorHandle { tx }, rx)
}

/// Owner of the digest map.
#[derive(Debug, Default)]
pub struct Aggregator {
    groups: HashMap<Digest, DigestGroup>,
    seen: HashSet<PathBuf>,
    seen_ids: HashSet<FileId>,
    failures: Vec<HashError>,
    hashed_bytes: u64,
    ignored: usize,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an aggregator on its own thread.
    ///
    /// The thread exits once every clone of the returned handle is dropped.
    #[must_use]
    pub fn spawn() -> (AggregatorHandle, JoinHandle<Self>) {
        let (handle, rx) = channel();
        let join = thread::spawn(move || Self::new().run(&rx));
        (handle, join)
    }

    /// Add `file` to the group for `digest`.
    ///
    /// Returns `false` if the same path, or another path to the same file,
    /// was already recorded. The repeat is ignored.
    pub fn record(&mut self, digest: Digest, file: FileCandidate) -> bool {
        let repeated_id = file.id.is_some_and(|id| self.seen_ids.contains(&id));
        if repeated_id || self.seen.contains(&file.path) {
            log::debug!("Ignoring repeated record for {}", file.path.display());
            self.ignored += 1;
            return false;
        }
        self.seen.insert(file.path.clone());
        if let Some(id) = file.id {
            self.seen_ids.insert(id);
        }
        self.hashed_bytes += file.size;
        self.groups
            .entry(digest)
            .or_insert_with(|| DigestGroup::new(digest))
            .push(file);
        true
    }

    /// Keep a fingerprint failure for the run summary.
    pub fn record_failure(&mut self, error: HashError) {
        self.failures.push(error);
    }

    /// Apply one message.
    pub fn apply(&mut self, outcome: HashOutcome) {
        match outcome {
            HashOutcome::Hashed { digest, file } => {
                self.record(digest, file);
            }
            HashOutcome::Failed(error) => self.record_failure(error),
        }
    }

    /// Fold in messages until every sender is gone.
    #[must_use]
    pub fn run(mut self, results: &Receiver<HashOutcome>) -> Self {
        for outcome in results.iter() {
            self.apply(outcome);
        }
        log::debug!(
            "Aggregator drained: {} digests, {} failures, {} repeats ignored",
            self.groups.len(),
            self.failures.len(),
            self.ignored
        );
        self
    }

    /// Freeze the aggregation.
    #[must_use]
    pub fn snapshot(self) -> Aggregate {
        Aggregate::new(self.groups, self.failures, self.hashed_bytes)
    }
}
