//! Handler invocation and result reporting

use crate::capture::CaptureGuard;
use crate::context::LambdaContext;
use crate::error::format_exception;
use pyo3::exceptions::{PyAttributeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyModule;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Outcome record serialized as the single JSON output line.
///
/// Exactly one of `result`/`exception` is populated; `stdout`/`stderr` hold
/// whatever the handler wrote to the standard streams during the call.
#[derive(Debug, Serialize)]
pub struct InvocationReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationReport {
    pub fn success(result: Value, stdout: String, stderr: String) -> Self {
        Self {
            success: true,
            result: Some(result),
            exception: None,
            stdout,
            stderr,
        }
    }

    pub fn failure(exception: String, stdout: String, stderr: String) -> Self {
        Self {
            success: false,
            result: None,
            exception: Some(exception),
            stdout,
            stderr,
        }
    }
}

/// Call `handler_name` from the loaded module with the event and a fresh
/// execution context, capturing the standard streams for the duration of
/// the call.
///
/// A missing handler function or an exception raised by the handler is an
/// invocation failure reported inside the record; a `PyErr` return means
/// the harness plumbing itself broke.
pub fn invoke(
    py: Python<'_>,
    module: &Bound<'_, PyModule>,
    handler_name: &str,
    handler_path: &Path,
    event: &Value,
) -> PyResult<InvocationReport> {
    let context = Bound::new(py, LambdaContext::new())?;
    let event_obj = json_to_py(py, event)?;

    debug!(handler = handler_name, "invoking handler");
    let capture = CaptureGuard::install(py)?;
    let call_result = call_handler(py, module, handler_name, handler_path, &event_obj, &context);
    let (stdout, stderr) = capture.finish()?;

    Ok(match call_result {
        Ok(value) => match py_to_json(py, &value) {
            Ok(json) => InvocationReport::success(json, stdout, stderr),
            Err(err) => InvocationReport::failure(
                format!(
                    "handler return value is not JSON serializable: {}",
                    format_exception(py, &err)
                ),
                stdout,
                stderr,
            ),
        },
        Err(trace) => InvocationReport::failure(trace, stdout, stderr),
    })
}

/// Resolve the handler attribute and call it with `(event, context)`.
///
/// Failures come back as preformatted trace strings so they can be embedded
/// in the report as-is.
fn call_handler<'py>(
    py: Python<'py>,
    module: &Bound<'py, PyModule>,
    handler_name: &str,
    handler_path: &Path,
    event: &Bound<'py, PyAny>,
    context: &Bound<'py, LambdaContext>,
) -> Result<Bound<'py, PyAny>, String> {
    let handler = match module.getattr(handler_name) {
        Ok(handler) => handler,
        Err(err) if err.is_instance_of::<PyAttributeError>(py) => {
            return Err(format!(
                "handler function '{}' not found in {}",
                handler_name,
                handler_path.display()
            ));
        }
        Err(err) => return Err(format_exception(py, &err)),
    };

    handler
        .call1((event, context))
        .map_err(|err| format_exception(py, &err))
}

/// Decode a JSON value into the corresponding Python object.
fn json_to_py<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    let text = serde_json::to_string(value).map_err(|err| PyValueError::new_err(err.to_string()))?;
    py.import("json")?.call_method1("loads", (text,))
}

/// Encode a Python object as a JSON value via the interpreter's own
/// serializer, so anything `json.dumps` accepts round-trips.
fn py_to_json(py: Python<'_>, value: &Bound<'_, PyAny>) -> PyResult<Value> {
    let text: String = py
        .import("json")?
        .call_method1("dumps", (value,))?
        .extract()?;
    serde_json::from_str(&text).map_err(|err| PyValueError::new_err(err.to_string()))
}
