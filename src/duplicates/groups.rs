//! Digest groups and the frozen aggregation snapshot.
//!
//! # Overview
//!
//! A [`DigestGroup`] holds every file observed with one content digest, in
//! the order workers finished hashing them. That order differs from run to
//! run and nothing downstream may depend on it.
//!
//! An [`Aggregate`] is the read-only result of a completed scan: the full
//! digest → group mapping plus the files that could not be fingerprinted.
//!
//! # Example
//!
//! ```
//! use dupesweep::duplicates::DigestGroup;
//! use dupesweep::scanner::FileCandidate;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let mut group = DigestGroup::new([0u8; 32]);
//! group.push(FileCandidate::new(PathBuf::from("/a.txt"), 2048, SystemTime::now()));
//! group.push(FileCandidate::new(PathBuf::from("/b.txt"), 2048, SystemTime::now()));
//!
//! assert!(group.is_duplicate());
//! assert_eq!(group.wasted_space(), 2048);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scanner::{digest_to_hex, Digest, FileCandidate, HashError};

/// All files sharing one content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestGroup {
    /// Content digest shared by every member
    pub digest: Digest,
    /// Members in worker completion order
    pub files: Vec<FileCandidate>,
}

impl DigestGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new(digest: Digest) -> Self {
        Self {
            digest,
            files: Vec::new(),
        }
    }

    /// Append a member.
    pub fn push(&mut self, file: FileCandidate) {
        self.files.push(file);
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// More than one file shares this digest.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.files.len() > 1
    }

    /// Size of one copy, taken from the first member.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.files.first().map_or(0, |f| f.size)
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        if self.is_duplicate() {
            self.total_size().saturating_sub(self.size())
        } else {
            0
        }
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        digest_to_hex(&self.digest)
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Check whether `path` is a member.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

/// Frozen result of the scan phase.
#[derive(Debug, Default)]
pub struct Aggregate {
    groups: HashMap<Digest, DigestGroup>,
    failures: Vec<HashError>,
    hashed_bytes: u64,
}

impl Aggregate {
    pub(crate) fn new(
        groups: HashMap<Digest, DigestGroup>,
        failures: Vec<HashError>,
        hashed_bytes: u64,
    ) -> Self {
        Self {
            groups,
            failures,
            hashed_bytes,
        }
    }

    /// The complete digest → group mapping.
    #[must_use]
    pub fn groups(&self) -> &HashMap<Digest, DigestGroup> {
        &self.groups
    }

    /// Look up the group for one digest.
    #[must_use]
    pub fn group(&self, digest: &Digest) -> Option<&DigestGroup> {
        self.groups.get(digest)
    }

    /// Groups with more than one member, ordered by digest so reports are
    /// stable across runs.
    #[must_use]
    pub fn duplicate_groups(&self) -> Vec<&DigestGroup> {
        let mut dupes: Vec<&DigestGroup> =
            self.groups.values().filter(|g| g.is_duplicate()).collect();
        dupes.sort_by(|a, b| a.digest.cmp(&b.digest));
        dupes
    }

    /// Find the group containing `path`, if it was hashed.
    #[must_use]
    pub fn group_of(&self, path: &Path) -> Option<&DigestGroup> {
        self.groups.values().find(|g| g.contains(path))
    }

    /// Files that could not be fingerprinted.
    #[must_use]
    pub fn failures(&self) -> &[HashError] {
        &self.failures
    }

    /// Number of files successfully hashed.
    #[must_use]
    pub fn hashed_files(&self) -> usize {
        self.groups.values().map(DigestGroup::len).sum()
    }

    /// Bytes read while hashing.
    #[must_use]
    pub fn hashed_bytes(&self) -> u64 {
        self.hashed_bytes
    }

    /// Consume the snapshot.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<Digest, DigestGroup>, Vec<HashError>) {
        (self.groups, self.failures)
    }
}
