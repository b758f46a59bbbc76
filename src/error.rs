//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::FinderError;

/// Process exit codes.
///
/// - 0: Success (completed normally, with or without duplicates)
/// - 1: General error (bad arguments, bad configuration, unreadable root)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the scan completed and a report was written.
    Success = 0,
    /// General error: the run ended without a report.
    GeneralError = 1,
    /// Interrupted: the scan was stopped by Ctrl+C.
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
            Self::Success => "DF000",
            Self::GeneralError => "DF001",
            Self::Interrupted => "DF130",
        }
    }

    /// Exit code for an error returned by the application.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err
            .downcast_ref::<FinderError>()
            .is_some_and(|e| matches!(e, FinderError::Interrupted))
        {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
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
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
