//! File identity tracking.
//!
//! One file can be reachable under several paths: hard links, a followed
//! symlink next to its target, or a file seen through a symlinked
//! directory. Those paths share content but are not duplicates, and
//! deleting "the others" would delete the file itself.
//!
//! # Platform Support
//!
//! - **Unix**: `(device_id, inode)` from file metadata
//! - **Other**: no identity; every path is treated as a distinct file
//!
//! # Example
//!
//! ```
//! use dupesweep::scanner::identity::{FileId, IdentityTracker};
//!
//! let mut tracker = IdentityTracker::new();
//! let id = FileId::new(1, 42);
//! assert!(tracker.first_sighting(Some(id)));
//! assert!(!tracker.first_sighting(Some(id)));
//! assert!(tracker.first_sighting(None));
//! ```

use std::collections::HashSet;
use std::fs::Metadata;

/// Identity of the underlying file, independent of the path used to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    #[must_use]
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// Identity from metadata, if the platform exposes one.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self::new(metadata.dev(), metadata.ino()))
    }

    /// Identity from metadata, if the platform exposes one.
    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// Remembers which files have already been seen.
///
/// Not thread-safe; the walker owns one per walk.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    seen: HashSet<FileId>,
}

impl IdentityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `id` is offered and `false` after.
    ///
    /// Files without an identity are always first sightings.
    pub fn first_sighting(&mut self, id: Option<FileId>) -> bool {
        match id {
            Some(id) => self.seen.insert(id),
            None => true,
        }
    }

    /// Number of distinct identities recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
