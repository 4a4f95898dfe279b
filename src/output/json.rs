//! JSON run report.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "root": "/data/cache",
//!   "keep": "one",
//!   "delete_mode": "permanent",
//!   "hash": "sha256",
//!   "groups": [
//!     {
//!       "digest": "9f86d0...",
//!       "size": 2048,
//!       "paths": ["/data/cache/a.txt", "/data/cache/b.txt"],
//!       "kept": "/data/cache/a.txt",
//!       "deletions": [
//!         { "path": "/data/cache/b.txt", "size": 2048, "success": true, "dry_run": false }
//!       ]
//!     }
//!   ],
//!   "errors": {
//!     "walk": [{ "path": "/data/cache/locked", "message": "Permission denied: ..." }],
//!     "fingerprint": []
//!   },
//!   "summary": {
//!     "files_seen": 3,
//!     "eligible_files": 2,
//!     "hashed_files": 2,
//!     "duplicate_groups": 1,
//!     "deleted": 1,
//!     "failed": 0,
//!     "bytes_reclaimed": 2048,
//!     "elapsed_ms": 12,
//!     "exit_code": 3,
//!     "exit_code_name": "DS003"
//!   }
//! }
//! ```

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use super::RunReport;
use crate::actions::{DeleteMode, GroupOutcome, KeepPolicy};
use crate::scanner::HashAlgorithm;

/// One walk or fingerprint error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    /// Path the error refers to
    pub path: PathBuf,
    /// Human-readable cause
    pub message: String,
}

/// Per-entry errors, by pipeline stage.
#[derive(Debug, Clone, Serialize)]
pub struct JsonErrors {
    /// Entries the walker could not read
    pub walk: Vec<JsonError>,
    /// Files that could not be fingerprinted
    pub fingerprint: Vec<JsonError>,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Regular files reported by the walker
    pub files_seen: usize,
    /// Files that passed the size/age filter
    pub eligible_files: usize,
    /// Files rejected by the size/age filter
    pub ineligible_files: usize,
    /// Files successfully fingerprinted
    pub hashed_files: usize,
    /// Bytes read while fingerprinting
    pub hashed_bytes: u64,
    /// Number of walk errors
    pub walk_errors: usize,
    /// Number of fingerprint errors
    pub fingerprint_errors: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Successful deletions
    pub deleted: usize,
    /// Failed deletions
    pub failed: usize,
    /// Bytes freed (or that would be freed, for dry runs)
    pub bytes_reclaimed: u64,
    /// Nothing was removed
    pub dry_run: bool,
    /// Reconciliation stopped early
    pub interrupted: bool,
    /// Hashing workers used
    pub workers: usize,
    /// Scan phase duration in milliseconds
    pub scan_duration_ms: u64,
    /// Whole run duration in milliseconds
    pub elapsed_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Directory that was scanned
    pub root: &'a PathBuf,
    /// Keep policy in effect
    pub keep: KeepPolicy,
    /// Removal mode in effect
    pub delete_mode: DeleteMode,
    /// Hash algorithm in effect
    pub hash: HashAlgorithm,
    /// Per-group outcomes in digest order
    pub groups: &'a [GroupOutcome],
    /// Per-entry errors
    pub errors: JsonErrors,
    /// Run statistics
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Build the JSON view of `report`.
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        let summary = &report.summary;
        let exit_code = report.exit_code();

        let walk = summary
            .walk_errors
            .iter()
            .map(|e| JsonError {
                path: e.path().to_path_buf(),
                message: e.to_string(),
            })
            .collect();
        let fingerprint = report
            .fingerprint_errors
            .iter()
            .map(|e| JsonError {
                path: e.path().to_path_buf(),
                message: e.to_string(),
            })
            .collect();

        Self {
            root: &report.root,
            keep: report.keep,
            delete_mode: report.delete_mode,
            hash: report.hash,
            groups: &report.reconciliation.groups,
            errors: JsonErrors { walk, fingerprint },
            summary: JsonSummary {
                files_seen: summary.files_seen,
                eligible_files: summary.eligible_files,
                ineligible_files: summary.ineligible_files,
                hashed_files: summary.hashed_files,
                hashed_bytes: summary.hashed_bytes,
                walk_errors: summary.walk_errors.len(),
                fingerprint_errors: report.fingerprint_errors.len(),
                duplicate_groups: summary.duplicate_groups,
                deleted: report.deleted_count(),
                failed: report.failed_count(),
                bytes_reclaimed: report.bytes_reclaimed(),
                dry_run: report.is_dry_run(),
                interrupted: report.reconciliation.interrupted,
                workers: summary.workers,
                scan_duration_ms: summary.scan_duration.as_millis() as u64,
                elapsed_ms: report.elapsed.as_millis() as u64,
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::{group, report_with};
    use crate::scanner::HashError;

    #[test]
    fn test_json_output_empty() {
        let report = report_with(Vec::new(), 0);
        let value: serde_json::Value =
            serde_json::from_str(&JsonOutput::new(&report).to_json().unwrap()).unwrap();

        assert_eq!(value["groups"].as_array().unwrap().len(), 0);
        assert_eq!(value["summary"]["exit_code"], 2);
        assert_eq!(value["summary"]["exit_code_name"], "DS002");
        assert_eq!(value["keep"], "one");
        assert_eq!(value["delete_mode"], "permanent");
        assert_eq!(value["hash"], "sha256");
    }

    #[test]
    fn test_json_output_with_groups() {
        let report = report_with(vec![group(&["/root/b.txt"], &["/root/c.txt"])], 0);
        let value: serde_json::Value =
            serde_json::from_str(&JsonOutput::new(&report).to_json().unwrap()).unwrap();

        let g = &value["groups"][0];
        assert_eq!(g["digest"].as_str().unwrap().len(), 64);
        assert_eq!(g["kept"], "/root/a.txt");
        assert_eq!(g["paths"].as_array().unwrap().len(), 3);
        assert_eq!(g["deletions"][0]["success"], true);
        assert!(g["deletions"][0].get("error").is_none());
        assert_eq!(g["deletions"][1]["success"], false);
        assert!(g["deletions"][1]["error"]
            .as_str()
            .unwrap()
            .contains("permission denied"));

        assert_eq!(value["summary"]["deleted"], 1);
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["summary"]["elapsed_ms"], 1234);
        assert_eq!(value["summary"]["exit_code"], 3);
    }

    #[test]
    fn test_json_lists_errors_with_paths() {
        let mut report = report_with(Vec::new(), 2);
        report
            .fingerprint_errors
            .push(HashError::NotFound(PathBuf::from("/root/vanished")));
        let output = JsonOutput::new(&report);

        assert_eq!(output.errors.walk.len(), 2);
        assert_eq!(output.errors.fingerprint[0].path, PathBuf::from("/root/vanished"));
        assert_eq!(output.summary.fingerprint_errors, 1);
    }

    #[test]
    fn test_to_json_compact_vs_pretty() {
        let report = report_with(Vec::new(), 0);
        let output = JsonOutput::new(&report);
        assert!(!output.to_json().unwrap().contains('\n'));
        assert!(output.to_json_pretty().unwrap().contains('\n'));
    }

    #[test]
    fn test_write_to_appends_newline() {
        let report = report_with(Vec::new(), 0);
        let mut buf = Vec::new();
        JsonOutput::new(&report).write_to(&mut buf, false).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
    }
}
