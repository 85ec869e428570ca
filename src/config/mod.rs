//! Configuration management module
//!
//! Holds the immutable per-run request handed to the run coordinator and
//! the validation rules shared by the CLI and the settings file.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{PerfError, Result};

pub mod settings;

pub use settings::Settings;

/// Output mode selected once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Live terminal dashboard
    #[default]
    Interactive,
    /// One final JSON document on stdout
    Structured,
}

/// Benchmark kind, also the `type` tag of every emitted outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkKind {
    /// Multi-drive read/write throughput test
    Drive,
    /// Cluster-wide PUT/GET object throughput test
    Object,
    /// Continuously sampled per-disk I/O statistics
    #[serde(rename = "disk")]
    DiskMetrics,
}

impl BenchmarkKind {
    /// Whether accepted results are forwarded one by one in live delivery
    /// rather than buffered until the stream closes
    pub fn streams_updates(&self) -> bool {
        matches!(self, BenchmarkKind::Object | BenchmarkKind::DiskMetrics)
    }

    /// Get a human-readable description of the kind
    pub fn description(&self) -> &'static str {
        match self {
            BenchmarkKind::Drive => "Drive Speedtest",
            BenchmarkKind::Object => "Object Speedtest",
            BenchmarkKind::DiskMetrics => "Top Disks",
        }
    }
}

/// Options for the drive throughput test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveTestOptions {
    /// Test drives one at a time instead of in parallel
    pub serial: bool,
    /// I/O block size in bytes
    pub block_size: u64,
    /// Bytes written and read per drive
    pub file_size: u64,
}

impl Default for DriveTestOptions {
    fn default() -> Self {
        Self {
            serial: false,
            block_size: 4 * 1024 * 1024, // 4 MiB
            file_size: 1024 * 1024 * 1024, // 1 GiB
        }
    }
}

/// Options for the object throughput test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTestOptions {
    /// Object size in bytes
    pub size: u64,
    /// Duration of each measurement round
    pub duration: Duration,
    /// Concurrent requests per server
    pub concurrency: usize,
    /// Let the server pick concurrency; set unless concurrency was given
    pub autotune: bool,
    /// Bucket used for test objects, server default when unset
    pub bucket: Option<String>,
}

impl Default for ObjectTestOptions {
    fn default() -> Self {
        Self {
            size: 64 * 1024 * 1024, // 64 MiB
            duration: Duration::from_secs(10),
            concurrency: 32,
            autotune: true,
            bucket: None,
        }
    }
}

/// Metric families the remote metrics API can stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Disk,
}

/// Options passed to the remote metrics call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsOptions {
    pub metric_type: MetricType,
    /// Time between two samples
    pub interval: Duration,
    /// Report each disk separately
    pub by_disk: bool,
    /// Stop after this many samples; stream until cancelled when unset
    pub samples: Option<u32>,
}

/// Options for the disk statistics view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskMetricsOptions {
    pub metrics: MetricsOptions,
    /// Show up to this many disks
    pub count: usize,
}

impl Default for DiskMetricsOptions {
    fn default() -> Self {
        Self {
            metrics: MetricsOptions {
                metric_type: MetricType::Disk,
                interval: Duration::from_secs(1),
                by_disk: true,
                samples: None,
            },
            count: 10,
        }
    }
}

/// The test to run, with its kind-specific options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestSpec {
    Drive(DriveTestOptions),
    Object(ObjectTestOptions),
    DiskMetrics(DiskMetricsOptions),
}

impl TestSpec {
    pub fn kind(&self) -> BenchmarkKind {
        match self {
            TestSpec::Drive(_) => BenchmarkKind::Drive,
            TestSpec::Object(_) => BenchmarkKind::Object,
            TestSpec::DiskMetrics(_) => BenchmarkKind::DiskMetrics,
        }
    }
}

/// Immutable configuration for one benchmark run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    /// Cluster alias or URL the test runs against
    pub target: String,
    pub test: TestSpec,
    pub output: OutputMode,
    /// Show per-server details
    pub verbose: bool,
}

impl BenchmarkRequest {
    /// Create a validated request
    pub fn new(target: impl Into<String>, test: TestSpec, output: OutputMode) -> Result<Self> {
        let request = Self {
            target: target.into(),
            test,
            output,
            verbose: false,
        };
        request.validate()?;
        Ok(request)
    }

    /// Set verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn kind(&self) -> BenchmarkKind {
        self.test.kind()
    }

    /// Validate the request parameters
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(PerfError::ConfigError("Target alias cannot be empty".to_string()));
        }

        match &self.test {
            TestSpec::Drive(opts) => {
                if opts.block_size == 0 {
                    return Err(PerfError::ConfigError("blocksize cannot be <= 0".to_string()));
                }
                if opts.file_size == 0 {
                    return Err(PerfError::ConfigError("filesize cannot be <= 0".to_string()));
                }
                if opts.file_size < opts.block_size {
                    return Err(PerfError::ConfigError(
                        "filesize must not be smaller than blocksize".to_string(),
                    ));
                }
            }
            TestSpec::Object(opts) => {
                if opts.duration.is_zero() {
                    return Err(PerfError::ConfigError(
                        "duration cannot be 0 or negative".to_string(),
                    ));
                }
                if opts.size == 0 {
                    return Err(PerfError::ConfigError("size cannot be <= 0".to_string()));
                }
                if opts.concurrency == 0 {
                    return Err(PerfError::ConfigError(
                        "concurrency cannot be '0' or negative".to_string(),
                    ));
                }
            }
            TestSpec::DiskMetrics(opts) => {
                if opts.count == 0 {
                    return Err(PerfError::ConfigError("count cannot be 0".to_string()));
                }
                if opts.metrics.interval.is_zero() {
                    return Err(PerfError::ConfigError(
                        "interval cannot be 0 or negative".to_string(),
                    ));
                }
                if opts.metrics.samples == Some(0) {
                    return Err(PerfError::ConfigError("samples cannot be 0".to_string()));
                }
            }
        }

        Ok(())
    }
}

/// Parse a human-readable size such as `4MiB` or `64MB` into bytes
pub fn parse_size(flag: &str, input: &str) -> Result<u64> {
    let bytes = byte_unit::Byte::parse_str(input.trim(), true)
        .map_err(|e| PerfError::ConfigError(format!("Unable to parse {} '{}': {}", flag, input, e)))?
        .as_u64();
    if bytes == 0 {
        return Err(PerfError::ConfigError(format!("{} cannot be <= 0", flag)));
    }
    Ok(bytes)
}

/// Parse a human-readable duration such as `10s` or `1m 30s`
pub fn parse_duration(flag: &str, input: &str) -> Result<Duration> {
    let duration = humantime::parse_duration(input.trim())
        .map_err(|e| PerfError::ConfigError(format!("Unable to parse {} '{}': {}", flag, input, e)))?;
    if duration.is_zero() {
        return Err(PerfError::ConfigError(format!(
            "{} cannot be 0 or negative",
            flag
        )));
    }
    Ok(duration)
}
