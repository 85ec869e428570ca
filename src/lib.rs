//! clusterperf - live cluster performance tests
//!
//! Runs server-side drive, object and disk-metrics tests against an
//! object-storage cluster and presents the streamed results either on a
//! live terminal dashboard or as a single JSON document.

use thiserror::Error;

pub mod app;
pub mod bench;
pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod models;
pub mod util;

// Common error types
#[derive(Debug, Error)]
pub enum PerfError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Configuration validation or parsing error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The remote benchmark call failed before producing results
    #[error("{0}")]
    RemoteError(String),
    /// TUI rendering or interaction error
    #[error("TUI error: {0}")]
    TuiError(String),
    /// Structured output could not be encoded or written
    #[error("Output error: {0}")]
    OutputError(String),
    /// A run task ended abnormally, e.g. the aggregation task panicked
    #[error("Internal error: {0}")]
    TaskError(String),
}

impl From<serde_json::Error> for PerfError {
    fn from(err: serde_json::Error) -> Self {
        PerfError::OutputError(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for PerfError {
    fn from(err: toml::de::Error) -> Self {
        PerfError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

/// Result type alias for clusterperf operations
pub type Result<T> = std::result::Result<T, PerfError>;

/// Error classification and user-facing messages
pub mod error {
    use super::PerfError;

    /// Process exit status for a run that ended with `error`.
    ///
    /// Remote failures are data, not crashes: they are reported inside the
    /// run's outcome and the process still exits successfully.
    pub fn exit_code(error: &PerfError) -> i32 {
        match error {
            PerfError::RemoteError(_) => 0,
            _ => 1,
        }
    }

    /// Whether the error means the terminal display is unusable
    pub fn is_display_fatal(error: &PerfError) -> bool {
        matches!(error, PerfError::TuiError(_))
    }

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &PerfError) -> String {
        match error {
            PerfError::ConfigError(msg) => {
                format!("Configuration error: {}. Check your flags and settings file.", msg)
            }
            PerfError::TuiError(_) => {
                "Unable to start the terminal display. Retry with --json for machine-readable output."
                    .to_string()
            }
            PerfError::OutputError(_) => {
                "Failed to write results. Check that stdout is writable.".to_string()
            }
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "clusterperf";
pub const CONFIG_FILE: &str = "clusterperf.toml";
