//! Remote benchmark result data models
//!
//! Shapes of the messages the cluster streams back for each test kind,
//! plus the derived figures the dashboard shows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-drive measurement inside a drive speedtest result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DrivePerf {
    /// Mount path of the drive on its server
    pub path: String,
    /// Read throughput in bytes per second
    pub read_throughput: u64,
    /// Write throughput in bytes per second
    pub write_throughput: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DrivePerf {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Drive speedtest result for one server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriveSpeedTestResult {
    /// Empty for progress pings
    pub version: String,
    pub endpoint: String,
    #[serde(default)]
    pub drive_perf: Vec<DrivePerf>,
    /// Server-level failure, drives may be missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DriveSpeedTestResult {
    /// A progress ping with no measurement
    pub fn ping() -> Self {
        Self::default()
    }

    /// Whether the server and all of its drives completed the test
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.drive_perf.iter().all(DrivePerf::is_ok)
    }
}

/// Throughput reported by a single server during an object speedtest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpeedTestStatServer {
    pub endpoint: String,
    pub throughput_per_sec: u64,
    pub objects_per_sec: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

/// Aggregate PUT or GET statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SpeedTestStats {
    pub throughput_per_sec: u64,
    pub objects_per_sec: u64,
    #[serde(default)]
    pub servers: Vec<SpeedTestStatServer>,
}

impl SpeedTestStats {
    /// Build totals from the per-server figures
    pub fn from_servers(servers: Vec<SpeedTestStatServer>) -> Self {
        Self {
            throughput_per_sec: servers.iter().map(|s| s.throughput_per_sec).sum(),
            objects_per_sec: servers.iter().map(|s| s.objects_per_sec).sum(),
            servers,
        }
    }

    /// Servers that reported an error
    pub fn failed_servers(&self) -> impl Iterator<Item = &SpeedTestStatServer> {
        self.servers.iter().filter(|s| s.err.is_some())
    }
}

/// Object speedtest result, one per autotune step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSpeedTestResult {
    /// Empty for progress pings
    pub version: String,
    pub servers: usize,
    pub disks: usize,
    /// Object size in bytes
    pub size: u64,
    pub concurrent: usize,
    pub put_stats: SpeedTestStats,
    pub get_stats: SpeedTestStats,
}

impl ObjectSpeedTestResult {
    /// A progress ping with no measurement
    pub fn ping() -> Self {
        Self::default()
    }
}

/// Cumulative block-device counters of one disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiskIoStats {
    pub read_ios: u64,
    pub read_sectors: u64,
    /// Milliseconds spent reading
    pub read_ticks: u64,
    pub write_ios: u64,
    pub write_sectors: u64,
    /// Milliseconds spent writing
    pub write_ticks: u64,
    /// Requests in flight
    pub current_ios: u64,
    /// Milliseconds the device was busy
    pub total_ticks: u64,
}

const SECTOR_SIZE: u64 = 512;

impl DiskIoStats {
    /// Rates between two samples taken `interval_secs` apart
    pub fn rates_since(&self, previous: &DiskIoStats, interval_secs: f64) -> DiskRates {
        if interval_secs <= 0.0 {
            return DiskRates::default();
        }
        let reads = self.read_ios.saturating_sub(previous.read_ios);
        let writes = self.write_ios.saturating_sub(previous.write_ios);
        let ios = reads + writes;
        let ticks = self.read_ticks.saturating_sub(previous.read_ticks)
            + self.write_ticks.saturating_sub(previous.write_ticks);
        let busy_ms = self.total_ticks.saturating_sub(previous.total_ticks) as f64;

        DiskRates {
            tps: ios as f64 / interval_secs,
            read_bytes_per_sec: (self.read_sectors.saturating_sub(previous.read_sectors)
                * SECTOR_SIZE) as f64
                / interval_secs,
            write_bytes_per_sec: (self.write_sectors.saturating_sub(previous.write_sectors)
                * SECTOR_SIZE) as f64
                / interval_secs,
            await_ms: if ios > 0 { ticks as f64 / ios as f64 } else { 0.0 },
            utilization: (busy_ms / (interval_secs * 1000.0) * 100.0).min(100.0),
        }
    }
}

/// Per-second figures derived from two counter samples
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiskRates {
    pub tps: f64,
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
    /// Average time per request
    pub await_ms: f64,
    /// Percentage of the interval the disk was busy
    pub utilization: f64,
}

/// Metrics of one disk in a realtime sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiskMetric {
    pub io_stats: DiskIoStats,
}

/// One push from the realtime metrics API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeMetrics {
    /// Keyed by disk name; ordered so replays are deterministic
    pub by_disk: BTreeMap<String, DiskMetric>,
}

impl RealtimeMetrics {
    /// Split into one sample per disk, in disk-name order
    pub fn into_samples(self) -> impl Iterator<Item = DiskIoSample> {
        self.by_disk.into_iter().map(|(disk, metric)| DiskIoSample {
            disk,
            stats: metric.io_stats,
        })
    }
}

/// Counters of a single disk at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiskIoSample {
    pub disk: String,
    pub stats: DiskIoStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_result_status() {
        let mut result = DriveSpeedTestResult {
            version: "1".to_string(),
            endpoint: "node1:9000".to_string(),
            drive_perf: vec![DrivePerf {
                path: "/data1".to_string(),
                read_throughput: 100,
                write_throughput: 80,
                error: None,
            }],
            error: None,
        };
        assert!(result.is_ok());

        result.drive_perf[0].error = Some("faulty disk".to_string());
        assert!(!result.is_ok());
    }

    #[test]
    fn test_stats_totals() {
        let stats = SpeedTestStats::from_servers(vec![
            SpeedTestStatServer {
                endpoint: "a".to_string(),
                throughput_per_sec: 100,
                objects_per_sec: 2,
                err: None,
            },
            SpeedTestStatServer {
                endpoint: "b".to_string(),
                throughput_per_sec: 50,
                objects_per_sec: 1,
                err: Some("timeout".to_string()),
            },
        ]);
        assert_eq!(stats.throughput_per_sec, 150);
        assert_eq!(stats.objects_per_sec, 3);
        assert_eq!(stats.failed_servers().count(), 1);
    }

    #[test]
    fn test_disk_rates() {
        let previous = DiskIoStats::default();
        let current = DiskIoStats {
            read_ios: 60,
            read_sectors: 2048,
            read_ticks: 120,
            write_ios: 40,
            write_sectors: 4096,
            write_ticks: 80,
            current_ios: 1,
            total_ticks: 500,
        };
        let rates = current.rates_since(&previous, 1.0);
        assert_eq!(rates.tps, 100.0);
        assert_eq!(rates.read_bytes_per_sec, 1024.0 * 1024.0);
        assert_eq!(rates.write_bytes_per_sec, 2.0 * 1024.0 * 1024.0);
        assert_eq!(rates.await_ms, 2.0);
        assert_eq!(rates.utilization, 50.0);

        assert_eq!(current.rates_since(&previous, 0.0), DiskRates::default());
    }

    #[test]
    fn test_samples_in_disk_order() {
        let mut metrics = RealtimeMetrics::default();
        metrics.by_disk.insert("sdb".to_string(), DiskMetric::default());
        metrics.by_disk.insert("sda".to_string(), DiskMetric::default());
        let names: Vec<String> = metrics.into_samples().map(|s| s.disk).collect();
        assert_eq!(names, vec!["sda", "sdb"]);
    }
}
