//! Exit codes and structured error output.

use serde::Serialize;

/// Exit codes for the simdupe binary.
///
/// - 0: Success (duplicate groups found)
/// - 1: General error (invalid configuration, unreadable manifest, ...)
/// - 2: No duplicate groups found
/// - 3: Partial success (groups computed, but some files failed extraction)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: duplicate groups were found.
    Success = 0,
    /// General error: the run could not complete.
    GeneralError = 1,
    /// No duplicates: the run completed without any group of 2+ files.
    NoDuplicates = 2,
    /// Partial success: completed, but some fingerprints were unavailable.
    PartialSuccess = 3,
    /// Interrupted: extraction was interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "SD000",
            Self::GeneralError => "SD001",
            Self::NoDuplicates => "SD002",
            Self::PartialSuccess => "SD003",
            Self::Interrupted => "SD130",
        }
    }

    /// Exit code for a completed run.
    ///
    /// Extraction failures take precedence over the "no duplicates" outcome.
    #[must_use]
    pub fn for_outcome(duplicate_groups: usize, failed_files: usize) -> Self {
        if failed_files > 0 {
            Self::PartialSuccess
        } else if duplicate_groups == 0 {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }
}

/// The run was stopped by Ctrl+C before grouping started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Interrupted after fingerprinting {extracted} of {total} files")]
pub struct InterruptedError {
    /// Fingerprints produced before the interruption
    pub extracted: usize,
    /// Files that were due for fingerprinting
    pub total: usize,
}

impl ExitCode {
    /// Exit code for an error returned by `run_app`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<InterruptedError>().is_some() {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "SD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its cause chain
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
