//! File actions module.
//!
//! This module provides functionality for:
//! - Removing files permanently, to the trash, or not at all (dry run)
//! - Reconciling duplicate groups under a keep policy
//!
//! ```no_run
//! use dupesweep::actions::{remover_for, DeleteMode, KeepPolicy, Reconciler};
//! use std::collections::HashMap;
//!
//! let remover = remover_for(DeleteMode::DryRun);
//! let reconciler = Reconciler::new(KeepPolicy::One, remover.as_ref());
//! let result = reconciler.reconcile(&HashMap::new());
//! assert_eq!(result.deleted_count(), 0);
//! ```

pub mod delete;
pub mod reconcile;

pub use delete::{
    delete_to_trash, permanent_delete, remover_for, DeleteError, DeleteMode, DeleteResult,
    DryRunRemover, PermanentRemover, Remover, TrashRemover,
};
pub use reconcile::{DeletionOutcome, GroupOutcome, KeepPolicy, ReconcileResult, Reconciler};
