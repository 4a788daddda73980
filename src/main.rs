//! lambda-harness - run a Lambda handler file locally, report JSON
//!
//! One invocation per process: parse arguments, load the handler module,
//! call it under output capture, print a single JSON result line and exit.

use clap::Parser;
use lambda_harness::error::format_exception;
use lambda_harness::{invoke, loader, HarnessError, InvocationReport};
use pyo3::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lambda-harness")]
#[command(about = "Run an AWS Lambda handler file locally and report the result as JSON", long_about = None)]
struct Args {
    /// Event JSON passed to the handler (defaults to an empty object)
    #[arg(long, value_name = "JSON", conflicts_with = "event_file")]
    event: Option<String>,

    /// Read the event JSON from a file instead
    #[arg(long, value_name = "PATH")]
    event_file: Option<PathBuf>,

    /// Path to the handler source file
    #[arg(long, value_name = "PATH")]
    handler_path: String,

    /// Name of the handler function to invoke
    #[arg(long, default_value = "lambda_handler", env = "LAMBDA_HARNESS_FUNCTION")]
    handler_function: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "LAMBDA_HARNESS_LOG_LEVEL")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    // Diagnostics go to stderr; stdout carries exactly one JSON line.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lambda_harness={}", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let code = match run(&args) {
        Ok(()) => 0,
        Err(err) => bail_out(&err),
    };
    std::process::exit(code);
}

/// Print the terminal failure record and return the exit code for it.
fn bail_out(err: &HarnessError) -> i32 {
    let record = serde_json::json!({
        "success": false,
        "exception": err.to_string(),
    });
    println!("{record}");
    err.exit_code()
}

fn run(args: &Args) -> Result<(), HarnessError> {
    let event = read_event(args)?;

    let handler_path = expand_tilde(&args.handler_path);
    if !handler_path.is_file() {
        return Err(HarnessError::HandlerPathNotFound(
            handler_path.display().to_string(),
        ));
    }

    debug!(path = %handler_path.display(), function = %args.handler_function, "starting invocation");
    let report: InvocationReport = Python::with_gil(|py| {
        let module = loader::load_handler_module(py, &handler_path)?;
        invoke::invoke(py, &module, &args.handler_function, &handler_path, &event)
            .map_err(|err| HarnessError::Unhandled(format_exception(py, &err)))
    })?;

    let line = serde_json::to_string(&report)
        .map_err(|err| HarnessError::Unhandled(err.to_string()))?;
    println!("{line}");
    Ok(())
}

/// Decode the event from `--event` or `--event-file`; absent both, the
/// handler receives an empty mapping.
fn read_event(args: &Args) -> Result<Value, HarnessError> {
    let text = match (&args.event, &args.event_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|err| {
            HarnessError::InvalidEvent(format!(
                "failed to read event file {}: {err}",
                path.display()
            ))
        })?,
        (None, None) => return Ok(Value::Object(serde_json::Map::new())),
    };
    serde_json::from_str(&text).map_err(|err| HarnessError::InvalidEvent(err.to_string()))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = home::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
