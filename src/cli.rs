//! Command-line interface
//!
//! Flags override the settings file; whatever is left unset falls back to
//! it. Converting to a [`BenchmarkRequest`] validates every value.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::settings::Settings;
use crate::config::{
    parse_duration, parse_size, BenchmarkRequest, DiskMetricsOptions, DriveTestOptions,
    ObjectTestOptions, OutputMode, TestSpec,
};
use crate::Result;

#[derive(Parser, Debug)]
#[command(name = "clusterperf")]
#[command(about = "Run live performance tests against an object-storage cluster")]
pub struct Cli {
    /// Print one JSON document instead of starting the dashboard
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose: debug logging and per-server details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file; default: the standard config location
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Measure read/write throughput of every drive
    Drive(DriveArgs),
    /// Measure PUT/GET throughput of the cluster
    Object(ObjectArgs),
    /// Show the busiest disks by live I/O statistics
    Disk(DiskArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DriveArgs {
    /// Cluster alias or URL
    pub target: String,
    /// Test drives one at a time
    #[arg(long)]
    pub serial: bool,
    /// Block size, e.g. 4MiB
    #[arg(long, value_name = "SIZE")]
    pub blocksize: Option<String>,
    /// Bytes written and read per drive, e.g. 1GiB
    #[arg(long, value_name = "SIZE")]
    pub filesize: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ObjectArgs {
    /// Cluster alias or URL
    pub target: String,
    /// Duration of each measurement round, e.g. 10s
    #[arg(long, value_name = "DURATION")]
    pub duration: Option<String>,
    /// Object size, e.g. 64MiB
    #[arg(long, value_name = "SIZE")]
    pub size: Option<String>,
    /// Concurrent requests per server; disables autotuning
    #[arg(long, value_name = "N")]
    pub concurrent: Option<usize>,
    #[arg(long, hide = true)]
    pub bucket: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DiskArgs {
    /// Cluster alias or URL
    pub target: String,
    /// Number of disks shown
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,
    /// Sampling interval, e.g. 1s
    #[arg(long, value_name = "DURATION")]
    pub interval: Option<String>,
    /// Stop after this many samples
    #[arg(long, value_name = "N")]
    pub samples: Option<u32>,
}

impl Cli {
    /// JSON output when asked for on the command line or in settings
    pub fn output_mode(&self, settings: &Settings) -> OutputMode {
        if self.json || settings.json {
            OutputMode::Structured
        } else {
            OutputMode::Interactive
        }
    }

    /// Build the validated request for this invocation
    pub fn into_request(self, settings: &Settings) -> Result<BenchmarkRequest> {
        let output = self.output_mode(settings);
        let (target, test) = match self.command {
            Command::Drive(args) => {
                let block_size = parse_size(
                    "blocksize",
                    args.blocksize.as_deref().unwrap_or(settings.drive.blocksize.as_str()),
                )?;
                let file_size = parse_size(
                    "filesize",
                    args.filesize.as_deref().unwrap_or(settings.drive.filesize.as_str()),
                )?;
                let opts = DriveTestOptions {
                    serial: args.serial || settings.drive.serial,
                    block_size,
                    file_size,
                };
                (args.target, TestSpec::Drive(opts))
            }
            Command::Object(args) => {
                let size = parse_size("size", args.size.as_deref().unwrap_or(settings.object.size.as_str()))?;
                let duration = parse_duration(
                    "duration",
                    args.duration.as_deref().unwrap_or(settings.object.duration.as_str()),
                )?;
                let opts = ObjectTestOptions {
                    size,
                    duration,
                    concurrency: args.concurrent.unwrap_or(settings.object.concurrent),
                    autotune: args.concurrent.is_none(),
                    bucket: args.bucket,
                };
                (args.target, TestSpec::Object(opts))
            }
            Command::Disk(args) => {
                let mut opts = DiskMetricsOptions::default();
                opts.count = args.count.unwrap_or(settings.disk.count);
                opts.metrics.interval = parse_duration(
                    "interval",
                    args.interval.as_deref().unwrap_or(settings.disk.interval.as_str()),
                )?;
                opts.metrics.samples = match (args.samples, output) {
                    (Some(samples), _) => Some(samples),
                    (None, OutputMode::Structured) => Some(settings.disk.json_samples),
                    (None, OutputMode::Interactive) => None,
                };
                (args.target, TestSpec::DiskMetrics(opts))
            }
        };

        Ok(BenchmarkRequest::new(target, test, output)?.with_verbose(self.verbose))
    }
}
