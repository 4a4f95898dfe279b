//! Run reports.
//!
//! A [`RunReport`] collects everything one run produced: the scan summary,
//! every fingerprint failure, the reconciler's per-group outcomes and the
//! total elapsed time. It is rendered by one of two formatters:
//! - [`text::TextOutput`] for people
//! - [`json::JsonOutput`] for scripts
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::actions::{remover_for, DeleteMode, KeepPolicy, Reconciler};
//! use dupesweep::duplicates::DuplicateFinder;
//! use dupesweep::output::{json::JsonOutput, RunReport};
//! use dupesweep::scanner::HashAlgorithm;
//! use std::path::Path;
//! use std::time::Instant;
//!
//! let started = Instant::now();
//! let finder = DuplicateFinder::with_defaults();
//! let (aggregate, summary) = finder.find_duplicates(Path::new(".")).unwrap();
//! let remover = remover_for(DeleteMode::DryRun);
//! let result = Reconciler::new(KeepPolicy::One, remover.as_ref()).reconcile(aggregate.groups());
//!
//! let report = RunReport::builder(Path::new("."), KeepPolicy::One, DeleteMode::DryRun, HashAlgorithm::Sha256)
//!     .finish(aggregate, summary, result, started.elapsed());
//! println!("{}", JsonOutput::new(&report).to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::actions::{DeleteMode, KeepPolicy, ReconcileResult};
use crate::duplicates::{Aggregate, ScanSummary};
use crate::error::ExitCode;
use crate::scanner::{HashAlgorithm, HashError};

pub use json::JsonOutput;
pub use text::TextOutput;

/// Everything one run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Directory that was scanned
    pub root: PathBuf,
    /// Keep policy in effect
    pub keep: KeepPolicy,
    /// Removal mode in effect
    pub delete_mode: DeleteMode,
    /// Hash algorithm in effect
    pub hash: HashAlgorithm,
    /// Scan-phase statistics and walk errors
    pub summary: ScanSummary,
    /// Files that could not be fingerprinted
    pub fingerprint_errors: Vec<HashError>,
    /// Per-group deletion outcomes
    pub reconciliation: ReconcileResult,
    /// Wall-clock time for the whole run
    pub elapsed: Duration,
}

/// Run parameters known before the scan starts.
#[derive(Debug, Clone)]
pub struct RunReportBuilder {
    root: PathBuf,
    keep: KeepPolicy,
    delete_mode: DeleteMode,
    hash: HashAlgorithm,
}

impl RunReportBuilder {
    /// Attach the results of the run.
    #[must_use]
    pub fn finish(
        self,
        aggregate: Aggregate,
        summary: ScanSummary,
        reconciliation: ReconcileResult,
        elapsed: Duration,
    ) -> RunReport {
        let (_, fingerprint_errors) = aggregate.into_parts();
        RunReport {
            root: self.root,
            keep: self.keep,
            delete_mode: self.delete_mode,
            hash: self.hash,
            summary,
            fingerprint_errors,
            reconciliation,
            elapsed,
        }
    }
}

impl RunReport {
    /// Start a report for a run over `root`.
    #[must_use]
    pub fn builder(
        root: &Path,
        keep: KeepPolicy,
        delete_mode: DeleteMode,
        hash: HashAlgorithm,
    ) -> RunReportBuilder {
        RunReportBuilder {
            root: root.to_path_buf(),
            keep,
            delete_mode,
            hash,
        }
    }

    /// Whether nothing was actually removed.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.delete_mode == DeleteMode::DryRun
    }

    /// Number of successful deletions.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.reconciliation.deleted_count()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.reconciliation.failed_count()
    }

    /// Bytes freed (or that would be freed, for dry runs).
    #[must_use]
    pub fn bytes_reclaimed(&self) -> u64 {
        self.reconciliation.bytes_reclaimed()
    }

    /// Any walk, fingerprint or deletion error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.summary.walk_errors.is_empty()
            || !self.fingerprint_errors.is_empty()
            || self.failed_count() > 0
    }

    /// Exit code for this run.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.reconciliation.interrupted {
            ExitCode::Interrupted
        } else if self.has_errors() {
            ExitCode::PartialSuccess
        } else if self.reconciliation.groups.is_empty() {
            ExitCode::NoDuplicates
        } else {
            ExitCode::Success
        }
    }
}
