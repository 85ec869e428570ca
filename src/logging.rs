//! Logging initialization
//!
//! Reads `RUST_LOG` (level) and `LOG_FILE` (path) from the environment.
//! When `LOG_FILE` is set, logs are appended to that file as plain text.
//! Otherwise structured runs log to stderr, keeping stdout for the JSON
//! document, and dashboard runs drop logs because the terminal belongs to
//! the dashboard.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::OutputMode;
use crate::{PerfError, Result};

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "clusterperf=debug,info"
        } else {
            "info"
        })
    })
}

/// Install the global subscriber for this process
pub fn init(output: OutputMode, verbose: bool) -> Result<()> {
    let filter = filter(verbose);

    let installed = if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_filter(filter);
        let installed = tracing_subscriber::registry().with(file_layer).try_init();
        tracing::debug!(path = %path, "logging to file");
        installed
    } else {
        match output {
            OutputMode::Structured => {
                let stderr_layer = tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(filter);
                tracing_subscriber::registry().with(stderr_layer).try_init()
            }
            OutputMode::Interactive => {
                let sink_layer = tracing_subscriber::fmt::layer()
                    .with_writer(std::io::sink)
                    .with_filter(filter);
                tracing_subscriber::registry().with(sink_layer).try_init()
            }
        }
    };

    installed.map_err(|e| PerfError::ConfigError(format!("logging already initialized: {}", e)))
}
