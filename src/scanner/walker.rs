//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! The [`TreeWalker`] trait is the seam between the scanner and the
//! filesystem: it yields one [`WalkEntry`] per directory or regular file
//! under a root, or a [`ScanError`] for entries that cannot be read.
//! [`JwalkWalker`] is the production implementation; tests substitute
//! in-memory walkers to inject errors.
//!
//! Walk order is implementation-defined. Every reachable regular file is
//! visited exactly once, and symlink cycles are reported as
//! [`ScanError::Loop`] instead of being followed. A file reachable under
//! several paths (hard links, followed symlinks) is reported under the
//! first path the walk reaches; later paths to the same [`FileId`] are
//! skipped.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use jwalk::WalkDir;

use super::identity::{FileId, IdentityTracker};
use super::ScanError;

/// One filesystem entry reported by a walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Path of the entry
    pub path: PathBuf,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Identity of the underlying file, where the platform has one
    pub id: Option<FileId>,
    /// Whether the path itself is a symbolic link
    pub is_symlink: bool,
}

impl WalkEntry {
    /// A regular file entry.
    #[must_use]
    pub fn file(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            is_dir: false,
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

    /// A directory entry.
    #[must_use]
    pub fn dir(path: PathBuf) -> Self {
        Self {
            path,
            is_dir: true,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            id: None,
            is_symlink: false,
        }
    }
}

/// Source of filesystem entries for the scanner.
pub trait TreeWalker: Send + Sync {
    /// Walk everything under `root`.
    ///
    /// Non-regular files (sockets, devices, unfollowed symlinks) are not
    /// yielded. Per-entry failures are yielded as errors and iteration
    /// continues.
    fn walk<'a>(
        &'a self,
        root: &Path,
    ) -> Box<dyn Iterator<Item = Result<WalkEntry, ScanError>> + 'a>;
}

/// Parallel directory walker backed by jwalk.
#[derive(Debug, Clone, Default)]
pub struct JwalkWalker {
    follow_symlinks: bool,
}

impl JwalkWalker {
    /// Create a walker.
    ///
    /// # Arguments
    ///
    /// * `follow_symlinks` - Resolve symbolic links (cycles are detected)
    #[must_use]
    pub fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }

    fn convert(&self, entry: jwalk::DirEntry<((), ())>) -> Option<Result<WalkEntry, ScanError>> {
        let path = entry.path();
        let file_type = entry.file_type();
        let is_symlink = entry.path_is_symlink();

        if file_type.is_dir() {
            return Some(Ok(WalkEntry::dir(path)));
        }
        if file_type.is_symlink() && !self.follow_symlinks {
            log::trace!("Skipping symlink: {}", path.display());
            return None;
        }

        let metadata = if self.follow_symlinks {
            std::fs::metadata(&path)
        } else {
            std::fs::symlink_metadata(&path)
        };
        let metadata = match metadata {
            Ok(m) => m,
            Err(e) => {
                let err = ScanError::from_io(&path, e);
                log::warn!("{}", err);
                return Some(Err(err));
            }
        };

        if metadata.is_dir() {
            // A followed symlink to a directory; jwalk descends into it itself.
            return Some(Ok(WalkEntry::dir(path)));
        }
        if !metadata.is_file() {
            log::trace!("Skipping non-regular file: {}", path.display());
            return None;
        }

        let modified = match modified_time(&path, metadata.modified()) {
            Ok(t) => t,
            Err(err) => {
                log::warn!("{}", err);
                return Some(Err(err));
            }
        };
        Some(Ok(WalkEntry::file(path, metadata.len(), modified)
            .with_id(FileId::from_metadata(&metadata))
            .with_symlink(is_symlink)))
    }

    fn convert_error(root: &Path, error: &jwalk::Error) -> ScanError {
        let path = error.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);

        if let Some(ancestor) = error.loop_ancestor() {
            log::warn!(
                "Filesystem loop at {} (points back to {})",
                path.display(),
                ancestor.display()
            );
            return ScanError::Loop {
                path,
                ancestor: ancestor.to_path_buf(),
            };
        }

        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.io_error() {
            Some(io) => ScanError::from_io(&path, std::io::Error::new(io.kind(), io.to_string())),
            None => ScanError::Io {
                path,
                source: std::io::Error::other(error.to_string()),
            },
        }
    }
}

impl TreeWalker for JwalkWalker {
    fn walk<'a>(
        &'a self,
        root: &Path,
    ) -> Box<dyn Iterator<Item = Result<WalkEntry, ScanError>> + 'a> {
        let root = root.to_path_buf();
        let walk_dir = WalkDir::new(&root)
            .follow_links(self.follow_symlinks)
            .skip_hidden(false)
            .sort(true);

        let mut identities = IdentityTracker::new();

        Box::new(
            walk_dir
                .into_iter()
                .filter_map(move |entry_result| match entry_result {
                    Ok(entry) => match self.convert(entry)? {
                        Ok(e) if !e.is_dir && !identities.first_sighting(e.id) => {
                            log::debug!("Skipping second path to the same file: {}", e.path.display());
                            None
                        }
                        converted => Some(converted),
                    },
                    Err(e) => Some(Err(Self::convert_error(&root, &e))),
                }),
        )
    }
}

/// Modification time, or a scan error when the platform cannot report one.
///
/// An unknown mtime must never count as old enough to delete.
fn modified_time(path: &Path, modified: io::Result<SystemTime>) -> Result<SystemTime, ScanError> {
    modified.map_err(|e| ScanError::from_io(path, e))
}
