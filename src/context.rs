//! Mock Lambda execution context

use pyo3::prelude::*;

/// Fixed function name reported to the handler.
pub const FUNCTION_NAME: &str = "Fake";

/// Fixed function version reported to the handler.
pub const FUNCTION_VERSION: &str = "LATEST";

/// Fixed memory limit, in megabytes.
pub const MEMORY_LIMIT_MB: i32 = 1024;

/// Fixed request id (the nil UUID).
pub const AWS_REQUEST_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Fixed remaining time, in milliseconds. Reported, never enforced.
pub const REMAINING_TIME_MS: i64 = 10_000;

/// Build a function ARN from a function name.
pub fn function_arn(function_name: &str) -> String {
    format!(
        "arn:aws:lambda:us-east-1:000000000000:function:{}",
        function_name
    )
}

/// Context object passed as the handler's second argument.
///
/// Mirrors the fields the Lambda platform supplies. All fields are fixed
/// constants and read-only from Python; a fresh instance is built per
/// invocation and discarded after the call returns.
#[pyclass(frozen)]
#[derive(Debug, Clone)]
pub struct LambdaContext {
    #[pyo3(get)]
    pub function_name: String,

    #[pyo3(get)]
    pub function_version: String,

    #[pyo3(get)]
    pub invoked_function_arn: String,

    #[pyo3(get)]
    pub memory_limit_in_mb: i32,

    #[pyo3(get)]
    pub aws_request_id: String,
}

#[pymethods]
impl LambdaContext {
    /// Remaining execution time in milliseconds.
    fn get_remaining_time_in_millis(&self) -> i64 {
        REMAINING_TIME_MS
    }
}

impl LambdaContext {
    /// Create a fresh context with the fixed field values.
    pub fn new() -> Self {
        Self {
            function_name: FUNCTION_NAME.to_string(),
            function_version: FUNCTION_VERSION.to_string(),
            invoked_function_arn: function_arn(FUNCTION_NAME),
            memory_limit_in_mb: MEMORY_LIMIT_MB,
            aws_request_id: AWS_REQUEST_ID.to_string(),
        }
    }
}

impl Default for LambdaContext {
    fn default() -> Self {
        Self::new()
    }
}
