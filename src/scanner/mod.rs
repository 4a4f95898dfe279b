//! Scanner module: file discovery, eligibility filtering and fingerprinting.
//!
//! This module provides functionality for:
//! - Walking a directory tree (parallel traversal using jwalk)
//! - Deciding which files are dedup candidates (size and age thresholds)
//! - Streaming file contents through a 256-bit content hash
//! - Feeding eligible files into the worker pool's bounded queue
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: The [`TreeWalker`] seam and its jwalk implementation
//! - [`identity`]: `(device, inode)` identity for aliased paths
//! - [`eligibility`]: The size/age predicate
//! - [`hasher`]: Streaming SHA-256 / BLAKE3 fingerprints
//! - [`producer`]: The [`Scanner`] that pushes candidates into the work queue
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::scanner::{Eligibility, JwalkWalker, TreeWalker};
//! use std::path::Path;
//! use std::time::{Duration, SystemTime};
//!
//! let filter = Eligibility::new(1024, Duration::from_secs(86_400));
//! let now = SystemTime::now();
//! let walker = JwalkWalker::default();
//! for entry in walker.walk(Path::new(".")) {
//!     match entry {
//!         Ok(e) if !e.is_dir && filter.is_eligible(e.size, e.modified, now) => {
//!             println!("{}: {} bytes", e.path.display(), e.size)
//!         }
//!         Ok(_) => {}
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod eligibility;
pub mod hasher;
pub mod identity;
pub mod producer;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

// Re-export main types
pub use eligibility::{is_eligible, Eligibility};
pub use hasher::{digest_to_hex, Digest, HashAlgorithm, Hasher};
pub use identity::{FileId, IdentityTracker};
pub use producer::{ScanStats, Scanner};
pub use walker::{JwalkWalker, TreeWalker, WalkEntry};

/// An eligible file on its way to the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCandidate {
    /// Path to the file as reported by the walker
    pub path: PathBuf,
    /// File size in bytes at enumeration time
    pub size: u64,
    /// Last modification time at enumeration time
    #[serde(skip)]
    pub modified: SystemTime,
    /// Identity of the underlying file, where the platform has one
    #[serde(skip)]
    pub id: Option<FileId>,
    /// Whether the path is a symbolic link to the file
    #[serde(skip)]
    pub is_symlink: bool,
}

impl FileCandidate {
    /// Create a new candidate.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
            id: None,
            is_symlink: false,
        }
    }

    /// Attach the file's identity.
    #[must_use]
    pub fn with_id(mut self, id: Option<FileId>) -> Self {
        self.id = id;
        self
    }

    /// Mark the path as a symbolic link.
    #[must_use]
    pub fn with_symlink(mut self, is_symlink: bool) -> Self {
        self.is_symlink = is_symlink;
        self
    }
}

/// Errors reported by the tree walker for individual entries.
///
/// None of these abort a scan; the entry is skipped and the error is
/// carried into the run summary.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry disappeared between listing and stat.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The walker detected a symlink cycle.
    #[error("Filesystem loop at {path} (points back to {ancestor})")]
    Loop {
        /// Path of the link that closes the cycle
        path: PathBuf,
        /// Ancestor directory the link resolves to
        ancestor: PathBuf,
    },

    /// Any other I/O error while reading a directory or its metadata.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while inspecting `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the entry that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) => p,
            Self::Loop { path, .. } | Self::Io { path, .. } => path,
        }
    }
}

/// Errors that can occur while fingerprinting a file.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file was removed after it was enumerated.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when opening or reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
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

    /// Path of the file that could not be fingerprinted.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
