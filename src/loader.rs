//! Dynamic loading of the handler source file

use crate::error::{format_exception, HarnessError};
use pyo3::ffi::c_str;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use std::ffi::CString;
use std::fs;
use std::path::Path;
use tracing::debug;

/// `sys.modules` key the loaded handler module is registered under.
pub const HANDLER_MODULE_NAME: &str = "lambda_handler_module";

/// Read and compile the handler source file as a module bound to
/// [`HANDLER_MODULE_NAME`], decoupled from the regular import machinery.
///
/// Bytecode caching is disabled for the duration of the load and the
/// previous `sys.dont_write_bytecode` value is restored whether or not the
/// load succeeds, so no compiled artifacts are left next to the handler
/// file. On success the module is also registered in `sys.modules` under
/// the fixed key so the handler can introspect itself.
pub fn load_handler_module<'py>(
    py: Python<'py>,
    path: &Path,
) -> Result<Bound<'py, PyModule>, HarnessError> {
    let source = fs::read_to_string(path).map_err(|err| {
        HarnessError::LoadFailure(format!("failed to read {}: {err}", path.display()))
    })?;

    let code = CString::new(source).map_err(|_| {
        HarnessError::LoadFailure(format!(
            "handler source {} contains a NUL byte",
            path.display()
        ))
    })?;
    let file_name = CString::new(path.to_string_lossy().into_owned()).map_err(|_| {
        HarnessError::LoadFailure(format!(
            "handler path {} contains a NUL byte",
            path.display()
        ))
    })?;

    let sys = py
        .import("sys")
        .map_err(|err| HarnessError::Unhandled(format_exception(py, &err)))?;

    // Executing the handler's own top-level imports must not write .pyc
    // caches; save the flag and put it back on every path out.
    let saved_flag = sys
        .getattr("dont_write_bytecode")
        .map_err(|err| HarnessError::Unhandled(format_exception(py, &err)))?;
    sys.setattr("dont_write_bytecode", true)
        .map_err(|err| HarnessError::Unhandled(format_exception(py, &err)))?;

    debug!(path = %path.display(), "compiling handler module");
    let loaded = PyModule::from_code(
        py,
        code.as_c_str(),
        file_name.as_c_str(),
        c_str!("lambda_handler_module"),
    );

    let restored = sys.setattr("dont_write_bytecode", saved_flag);

    let module = loaded.map_err(|err| HarnessError::LoadFailure(format_exception(py, &err)))?;
    restored.map_err(|err| HarnessError::Unhandled(format_exception(py, &err)))?;

    sys.getattr("modules")
        .and_then(|modules| modules.set_item(HANDLER_MODULE_NAME, &module))
        .map_err(|err| HarnessError::Unhandled(format_exception(py, &err)))?;

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_handler(source: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".py")
            .tempfile()
            .unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_exposes_top_level_names() {
        let _guard = crate::test_guard();
        let file = write_handler("def lambda_handler(event, context):\n    return event\n");

        Python::with_gil(|py| {
            let module = load_handler_module(py, file.path()).unwrap();
            assert!(module.getattr("lambda_handler").is_ok());
        });
    }

    #[test]
    fn test_load_registers_module_for_introspection() {
        let _guard = crate::test_guard();
        let file = write_handler("VALUE = 42\n");

        Python::with_gil(|py| {
            load_handler_module(py, file.path()).unwrap();
            let registered = py
                .import("sys")
                .unwrap()
                .getattr("modules")
                .unwrap()
                .get_item(HANDLER_MODULE_NAME)
                .unwrap();
            let value: i64 = registered.getattr("VALUE").unwrap().extract().unwrap();
            assert_eq!(value, 42);
        });
    }

    #[test]
    fn test_syntax_error_is_a_load_failure() {
        let _guard = crate::test_guard();
        let file = write_handler("def lambda_handler(event, context)\n    return event\n");

        Python::with_gil(|py| {
            let err = load_handler_module(py, file.path()).unwrap_err();
            match err {
                HarnessError::LoadFailure(trace) => assert!(trace.contains("SyntaxError")),
                other => panic!("expected load failure, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_bytecode_flag_restored_after_failed_load() {
        let _guard = crate::test_guard();
        let file = write_handler("this is not python\n");

        Python::with_gil(|py| {
            let sys = py.import("sys").unwrap();
            sys.setattr("dont_write_bytecode", false).unwrap();

            let _ = load_handler_module(py, file.path()).unwrap_err();

            let flag: bool = sys
                .getattr("dont_write_bytecode")
                .unwrap()
                .extract()
                .unwrap();
            assert!(!flag);
        });
    }

    #[test]
    fn test_import_error_in_handler_is_a_load_failure() {
        let _guard = crate::test_guard();
        let file = write_handler("import module_that_does_not_exist_anywhere\n");

        Python::with_gil(|py| {
            let err = load_handler_module(py, file.path()).unwrap_err();
            match err {
                HarnessError::LoadFailure(trace) => {
                    assert!(trace.contains("ModuleNotFoundError"));
                }
                other => panic!("expected load failure, got {other:?}"),
            }
        });
    }
}
