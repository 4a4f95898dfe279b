//! File removal primitives.
//!
//! # Overview
//!
//! The reconciler removes files through the [`Remover`] trait so the
//! removal strategy is chosen once per run:
//! - [`PermanentRemover`]: `std::fs::remove_file`
//! - [`TrashRemover`]: move to the system recycle bin (recoverable)
//! - [`DryRunRemover`]: check the file is still there, remove nothing
//!
//! Every remover stats the path first, so a file that vanished since the
//! scan is reported as [`DeleteError::NotFound`] rather than as a generic
//! I/O failure.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::actions::delete::{remover_for, DeleteMode};
//! use std::path::Path;
//!
//! let remover = remover_for(DeleteMode::Trash);
//! match remover.remove(Path::new("/path/to/duplicate.txt")) {
//!     Ok(result) => println!("Removed {} bytes", result.size),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How duplicates are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteMode {
    /// Unlink the file
    #[default]
    Permanent,
    /// Move the file to the system trash
    Trash,
    /// Report what would be removed without touching anything
    DryRun,
}

impl fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Trash => write!(f, "trash"),
            Self::DryRun => write!(f, "dry-run"),
        }
    }
}

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path is no longer a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Classify an I/O error raised while removing `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::NotAFile(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// Result of a successful removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was removed.
    pub path: PathBuf,
    /// Size of the file in bytes at removal time.
    pub size: u64,
    /// Whether the file was actually touched (false for dry runs).
    pub applied: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, applied: bool) -> Self {
        Self {
            path,
            size,
            applied,
        }
    }
}

/// Strategy for removing one file.
pub trait Remover: Send + Sync {
    /// Remove `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`DeleteError`] naming `path` if it cannot be removed.
    fn remove(&self, path: &Path) -> Result<DeleteResult, DeleteError>;

    /// The mode this remover implements.
    fn mode(&self) -> DeleteMode;
}

/// Build the remover for `mode`.
#[must_use]
pub fn remover_for(mode: DeleteMode) -> Box<dyn Remover> {
    match mode {
        DeleteMode::Permanent => Box::new(PermanentRemover),
        DeleteMode::Trash => Box::new(TrashRemover),
        DeleteMode::DryRun => Box::new(DryRunRemover),
    }
}

/// Size of the regular file at `path`, or the reason it cannot be removed.
fn stat_file(path: &Path) -> Result<u64, DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    if metadata.is_dir() {
        return Err(DeleteError::NotAFile(path.to_path_buf()));
    }
    Ok(metadata.len())
}

/// Unlinks files with `std::fs::remove_file`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermanentRemover;

impl Remover for PermanentRemover {
    fn remove(&self, path: &Path) -> Result<DeleteResult, DeleteError> {
        permanent_delete(path)
    }

    fn mode(&self) -> DeleteMode {
        DeleteMode::Permanent
    }
}

/// Moves files to the system trash.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrashRemover;

impl Remover for TrashRemover {
    fn remove(&self, path: &Path) -> Result<DeleteResult, DeleteError> {
        delete_to_trash(path)
    }

    fn mode(&self) -> DeleteMode {
        DeleteMode::Trash
    }
}

/// Reports what would be removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRemover;

impl Remover for DryRunRemover {
    fn remove(&self, path: &Path) -> Result<DeleteResult, DeleteError> {
        let size = stat_file(path)?;
        log::info!("[dry-run] Would delete: {} ({} bytes)", path.display(), size);
        Ok(DeleteResult::new(path.to_path_buf(), size, false))
    }

    fn mode(&self) -> DeleteMode {
        DeleteMode::DryRun
    }
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file no longer exists
/// - `PermissionDenied` if the file cannot be inspected
/// - `TrashFailed` if the platform trash rejects it
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = stat_file(path)?;

    trash::delete(path).map_err(|e| {
        log::warn!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::debug!("Moved to trash: {} ({} bytes)", path.display(), size);
    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}

/// Permanently delete a single file.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// Returns `NotFound`, `PermissionDenied` or `Io` depending on why the
/// unlink failed.
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = stat_file(path)?;

    fs::remove_file(path).map_err(|e| {
        log::warn!("Permanent delete failed for {}: {}", path.display(), e);
        DeleteError::from_io(path, e)
    })?;

    log::debug!("Permanently deleted: {} ({} bytes)", path.display(), size);
    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}
