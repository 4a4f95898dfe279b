//! Turning duplicate groups into deletions.
//!
//! The [`Reconciler`] runs single-threaded after the worker pool has
//! drained. Every group with more than one member is processed in digest
//! order; within a group, paths are handled in lexicographic order. A
//! failed removal is recorded and processing moves on to the next path.
//!
//! With [`KeepPolicy::One`] the lexicographically smallest path of each
//! group is left in place, skipping paths that are symbolic links while a
//! regular path remains. Removing a link never frees its target, so a
//! link is never the only copy left behind. With [`KeepPolicy::None`] every member is
//! removed, including the one that would usually count as the original.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::delete::{DeleteMode, Remover};
use crate::duplicates::DigestGroup;
use crate::progress::ProgressCallback;
use crate::scanner::Digest;

/// Which members of a duplicate group survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeepPolicy {
    /// Keep the member with the smallest path, preferring non-links
    One,
    /// Delete every member
    None,
}

impl fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "one"),
            Self::None => write!(f, "none"),
        }
    }
}

/// What happened to one path selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    /// The path
    pub path: PathBuf,
    /// Size recorded at scan time
    pub size: u64,
    /// Whether removal succeeded (or would succeed, for dry runs)
    pub success: bool,
    /// Why removal failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Nothing was actually removed
    pub dry_run: bool,
}

/// Reconciliation result for one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOutcome {
    /// Content digest as hex
    pub digest: String,
    /// Size of one copy
    pub size: u64,
    /// Every member, sorted
    pub paths: Vec<PathBuf>,
    /// The member left in place, if any
    pub kept: Option<PathBuf>,
    /// One entry per path selected for deletion
    pub deletions: Vec<DeletionOutcome>,
}

/// Everything the reconciler did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileResult {
    /// Per-group outcomes in digest order
    pub groups: Vec<GroupOutcome>,
    /// Reconciliation stopped early on a shutdown request
    pub interrupted: bool,
}

impl ReconcileResult {
    /// All deletion outcomes in processing order.
    pub fn outcomes(&self) -> impl Iterator<Item = &DeletionOutcome> {
        self.groups.iter().flat_map(|g| g.deletions.iter())
    }

    /// Number of successful deletions.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.outcomes().filter(|o| o.success).count()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes().filter(|o| !o.success).count()
    }

    /// Bytes freed by successful deletions.
    #[must_use]
    pub fn bytes_reclaimed(&self) -> u64 {
        self.outcomes().filter(|o| o.success).map(|o| o.size).sum()
    }
}

/// Applies the keep policy to duplicate groups.
pub struct Reconciler<'r> {
    policy: KeepPolicy,
    remover: &'r dyn Remover,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl<'r> Reconciler<'r> {
    #[must_use]
    pub fn new(policy: KeepPolicy, remover: &'r dyn Remover) -> Self {
        Self {
            policy,
            remover,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Stop between removals once this flag is set.
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

    /// Split a group into the kept path and the paths to delete.
    fn plan(&self, group: &DigestGroup) -> (Vec<PathBuf>, Option<PathBuf>, Vec<(PathBuf, u64)>) {
        let mut members: Vec<(PathBuf, u64, bool)> = group
            .files
            .iter()
            .map(|f| (f.path.clone(), f.size, f.is_symlink))
            .collect();
        members.sort_by(|a, b| a.0.cmp(&b.0));

        let paths: Vec<PathBuf> = members.iter().map(|(p, _, _)| p.clone()).collect();
        let kept = match self.policy {
            KeepPolicy::One if !members.is_empty() => {
                let survivor = members.iter().position(|m| !m.2).unwrap_or(0);
                Some(members.remove(survivor).0)
            }
            _ => None,
        };
        let doomed = members.into_iter().map(|(p, size, _)| (p, size)).collect();
        (paths, kept, doomed)
    }

    /// Delete redundant members of every group with more than one file.
    ///
    /// Groups of one are left untouched. Failures are recorded in the
    /// result and never stop the remaining deletions.
    pub fn reconcile(&self, groups: &HashMap<Digest, DigestGroup>) -> ReconcileResult {
        let mut duplicates: Vec<&DigestGroup> =
            groups.values().filter(|g| g.is_duplicate()).collect();
        duplicates.sort_by(|a, b| a.digest.cmp(&b.digest));

        let plans: Vec<_> = duplicates.iter().map(|g| (*g, self.plan(g))).collect();
        let total: usize = plans.iter().map(|(_, (_, _, doomed))| doomed.len()).sum();
        let dry_run = self.remover.mode() == DeleteMode::DryRun;

        log::info!(
            "Reconciling {} duplicate groups: {} files to remove (keep {}, {})",
            plans.len(),
            total,
            self.policy,
            self.remover.mode()
        );
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("reconciling", total);
        }

        let mut result = ReconcileResult::default();
        let mut processed = 0usize;

        'groups: for (group, (paths, kept, doomed)) in plans {
            let mut outcome = GroupOutcome {
                digest: group.digest_hex(),
                size: group.size(),
                paths,
                kept,
                deletions: Vec::with_capacity(doomed.len()),
            };

            for (path, size) in doomed {
                if self.is_shutdown_requested() {
                    log::info!("Reconciliation interrupted by shutdown signal");
                    result.interrupted = true;
                    result.groups.push(outcome);
                    break 'groups;
                }

                let deletion = match self.remover.remove(&path) {
                    Ok(_) => DeletionOutcome {
                        path,
                        size,
                        success: true,
                        error: None,
                        dry_run,
                    },
                    Err(e) => {
                        log::warn!("Could not delete {}: {}", path.display(), e);
                        DeletionOutcome {
                            path,
                            size,
                            success: false,
                            error: Some(e.to_string()),
                            dry_run,
                        }
                    }
                };

                processed += 1;
                if let Some(ref callback) = self.progress_callback {
                    callback.on_progress(processed, &deletion.path.to_string_lossy());
                }
                outcome.deletions.push(deletion);
            }

            result.groups.push(outcome);
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("reconciling");
        }

        log::info!(
            "Reconciliation complete: {} deleted, {} failed",
            result.deleted_count(),
            result.failed_count()
        );
        result
    }
}
