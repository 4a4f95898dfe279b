//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Running the hashing worker pool over the scanner's queue
//! - Aggregating `(digest, path)` results from every worker
//! - Freezing the aggregation into duplicate groups once workers drain
//!
//! # Architecture
//!
//! - [`pool`]: fixed-size worker threads with an explicit join barrier
//! - [`aggregator`]: single-owner digest map fed through a channel
//! - [`groups`]: [`DigestGroup`] and the frozen [`Aggregate`]
//! - [`finder`]: the [`DuplicateFinder`] orchestrator

pub mod aggregator;
pub mod finder;
pub mod groups;
pub mod pool;

pub use aggregator::{Aggregator, AggregatorHandle, HashOutcome};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{Aggregate, DigestGroup};
pub use pool::{PoolStats, WorkerContext, WorkerPool, WorkerStats};
