//! Harness error types and exit codes

use pyo3::prelude::*;
use thiserror::Error;

/// Exit code for a load failure or any other unhandled error.
pub const EXIT_LOAD_FAILURE: i32 = 99;

/// Exit code when the handler path does not reference an existing file.
pub const EXIT_PATH_NOT_FOUND: i32 = 100;

/// Terminal harness failures.
///
/// These abort the run before any invocation result is produced; a failure
/// inside the handler call itself is not an error here, it is reported in the
/// JSON body with `success=false` and exit code 0.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("handler path does not exist or is not a file: {0}")]
    HandlerPathNotFound(String),

    #[error("invalid event JSON: {0}")]
    InvalidEvent(String),

    #[error("{0}")]
    LoadFailure(String),

    #[error("{0}")]
    Unhandled(String),
}

impl HarnessError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::HandlerPathNotFound(_) => EXIT_PATH_NOT_FOUND,
            Self::InvalidEvent(_) | Self::LoadFailure(_) | Self::Unhandled(_) => EXIT_LOAD_FAILURE,
        }
    }
}

/// Format a Python exception as a full stack trace followed by the
/// `Type: message` line, matching what the interpreter would print.
pub fn format_exception(py: Python<'_>, err: &PyErr) -> String {
    let trace = err
        .traceback(py)
        .and_then(|tb| tb.format().ok())
        .unwrap_or_default();
    format!("{trace}{err}")
}
