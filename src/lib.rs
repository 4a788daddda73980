//! lambda-harness - Local test harness for AWS Lambda Python handlers
//!
//! Loads a single handler source file into an embedded interpreter, calls a
//! named entry-point function with a JSON event and a mock execution
//! context, captures the handler's stdout/stderr, and reports the outcome
//! as one JSON line.

pub mod capture;
pub mod context;
pub mod error;
pub mod invoke;
pub mod loader;

pub use context::LambdaContext;
pub use error::HarnessError;
pub use invoke::InvocationReport;

/// Serializes tests that touch interpreter-global state (the standard
/// stream bindings, `sys.modules`, `sys.dont_write_bytecode`).
#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
