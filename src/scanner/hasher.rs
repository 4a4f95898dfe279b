//! Streaming content fingerprints.
//!
//! # Overview
//! This module provides the [`Hasher`] struct for computing a 256-bit
//! digest of a file's full content. Files are read in fixed-size chunks,
//! so memory use does not depend on file size.
//!
//! Two algorithms are supported and both yield a [`Digest`] (`[u8; 32]`):
//! - [`HashAlgorithm::Sha256`] (default)
//! - [`HashAlgorithm::Blake3`]

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::HashError;

/// A 256-bit content fingerprint.
pub type Digest = [u8; 32];

/// Read buffer size for streaming hashes.
pub const BUFFER_SIZE: usize = 64 * 1024;

/// Hash function used for every file in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// BLAKE3 (256-bit output)
    Blake3,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Incremental hasher state for one file.
enum StreamState {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl StreamState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Sha256(h) => h.finalize().into(),
            Self::Blake3(h) => *h.finalize().as_bytes(),
        }
    }
}

/// Stateless file fingerprinter.
///
/// Cheap to clone and safe to share between worker threads; every call
/// opens its own file handle, which is closed when the call returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Algorithm this hasher uses.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Compute the digest of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] naming `path` if the file cannot be opened
    /// or any read fails. No partial digest is ever returned.
    pub fn fingerprint(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.fingerprint_reader(file)
            .map_err(|e| HashError::from_io(path, e))
    }

    /// Compute the digest of everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Propagates the first non-`Interrupted` read error.
    pub fn fingerprint_reader<R: Read>(&self, mut reader: R) -> io::Result<Digest> {
        let mut state = StreamState::new(self.algorithm);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(state.finalize())
    }

    /// Digest of an in-memory byte slice.
    #[must_use]
    pub fn fingerprint_bytes(&self, bytes: &[u8]) -> Digest {
        let mut state = StreamState::new(self.algorithm);
        state.update(bytes);
        state.finalize()
    }
}

/// Render a digest as lowercase hex.
#[must_use]
pub fn digest_to_hex(digest: &Digest) -> String {
    use fmt::Write;
    digest.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
