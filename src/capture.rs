//! Scoped capture of the interpreter's stdout/stderr

use pyo3::prelude::*;
use pyo3::types::PyModule;

/// Guard that redirects `sys.stdout` and `sys.stderr` into in-memory
/// buffers for the duration of a handler call.
///
/// The original stream objects are put back on [`CaptureGuard::finish`], and
/// on drop if the guard is abandoned mid-scope, so the final report always
/// goes to the real stdout.
pub struct CaptureGuard<'py> {
    sys: Bound<'py, PyModule>,
    saved_stdout: Bound<'py, PyAny>,
    saved_stderr: Bound<'py, PyAny>,
    stdout_buf: Bound<'py, PyAny>,
    stderr_buf: Bound<'py, PyAny>,
    restored: bool,
}

impl<'py> CaptureGuard<'py> {
    /// Swap both standard streams for fresh `io.StringIO` buffers.
    pub fn install(py: Python<'py>) -> PyResult<Self> {
        let sys = py.import("sys")?;
        let string_io = py.import("io")?.getattr("StringIO")?;

        let stdout_buf = string_io.call0()?;
        let stderr_buf = string_io.call0()?;

        let saved_stdout = sys.getattr("stdout")?;
        let saved_stderr = sys.getattr("stderr")?;

        sys.setattr("stdout", &stdout_buf)?;
        sys.setattr("stderr", &stderr_buf)?;

        Ok(Self {
            sys,
            saved_stdout,
            saved_stderr,
            stdout_buf,
            stderr_buf,
            restored: false,
        })
    }

    /// Restore the original streams, then flush, rewind and drain both
    /// buffers, returning their accumulated contents.
    pub fn finish(mut self) -> PyResult<(String, String)> {
        self.restore()?;
        let stdout = drain(&self.stdout_buf)?;
        let stderr = drain(&self.stderr_buf)?;
        Ok((stdout, stderr))
    }

    fn restore(&mut self) -> PyResult<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        self.sys.setattr("stdout", &self.saved_stdout)?;
        self.sys.setattr("stderr", &self.saved_stderr)?;
        Ok(())
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        // Restoration must never be skipped; errors here are unreportable.
        let _ = self.restore();
    }
}

/// Flush a buffer, seek back to its start and read everything it holds.
fn drain(buf: &Bound<'_, PyAny>) -> PyResult<String> {
    buf.call_method0("flush")?;
    buf.call_method1("seek", (0,))?;
    buf.call_method0("read")?.extract()
}
