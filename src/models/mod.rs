//! Data models module
//!
//! Contains the remote result shapes, the classified progress messages
//! and the outcome envelope shared by both presentation sinks.

pub mod outcome;
pub mod result;

// Re-export commonly used types
pub use outcome::{AggregatedResult, Measurement, ProgressMessage, RunOutcome, RunResults};
pub use result::{
    DiskIoSample, DiskIoStats, DiskMetric, DiskRates, DrivePerf, DriveSpeedTestResult,
    ObjectSpeedTestResult, RealtimeMetrics, SpeedTestStatServer, SpeedTestStats,
};
