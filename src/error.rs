//! Structured error handling and exit codes.

use serde::Serialize;

use crate::config::ConfigError;
use crate::duplicates::FinderError;

/// Exit codes for the dupesweep binary.
///
/// - 0: Success (duplicates processed without per-entry errors)
/// - 1: General error (unexpected or fatal failure)
/// - 2: No duplicates found
/// - 3: Partial success (completed with walk, fingerprint or delete errors)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: duplicates were found and processed.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: run completed but some entries failed.
    PartialSuccess = 3,
    /// Interrupted: run was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }

    /// Pick the exit code for a fatal error.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Broad category of the failure
    pub kind: &'static str,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            kind: error_kind(err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

fn error_kind(err: &anyhow::Error) -> &'static str {
    if let Some(finder) = err.downcast_ref::<FinderError>() {
        return match finder {
            FinderError::Interrupted => "interrupted",
            FinderError::PathNotFound(_)
            | FinderError::NotADirectory(_)
            | FinderError::RootUnreadable { .. } => "root",
            FinderError::WorkersFailed { .. } | FinderError::AggregatorFailed => "pipeline",
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return "config";
    }
    "other"
}
