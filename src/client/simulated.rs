//! Simulated cluster backend
//!
//! Produces realistic, seeded result streams for all three remote
//! operations so the commands can run without a live cluster. Progress
//! pings are interleaved with versioned results the way a real server
//! keeps its connection alive while a measurement is in flight.

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::{AdminClient, RESULT_CHANNEL_CAPACITY};
use crate::config::settings::ClusterSettings;
use crate::config::{DriveTestOptions, MetricsOptions, ObjectTestOptions};
use crate::models::{
    DiskIoStats, DiskMetric, DrivePerf, DriveSpeedTestResult, ObjectSpeedTestResult,
    RealtimeMetrics, SpeedTestStatServer, SpeedTestStats,
};
use crate::{PerfError, Result};

const RESULT_VERSION: &str = "1";
const MIB: f64 = 1024.0 * 1024.0;
/// Pings sent per drive while its measurement runs
const DRIVE_PINGS: u32 = 2;
/// Autotune stops when a step improves throughput by less than this
const AUTOTUNE_MIN_GAIN: f64 = 0.025;
const AUTOTUNE_MAX_STEPS: usize = 8;
/// Probability that a simulated drive reports a failure
const DRIVE_FAILURE_RATE: f64 = 0.02;

/// In-process stand-in for a cluster's admin API
#[derive(Debug, Clone)]
pub struct SimulatedCluster {
    target: String,
    servers: usize,
    drives_per_server: usize,
    seed: u64,
    tick: Duration,
    fail_dispatch: Option<String>,
}

impl SimulatedCluster {
    /// Create a cluster with `servers` nodes of `drives_per_server` drives
    pub fn new(target: impl Into<String>, servers: usize, drives_per_server: usize) -> Self {
        Self {
            target: target.into(),
            servers,
            drives_per_server,
            seed: 42,
            tick: Duration::from_millis(250),
            fail_dispatch: None,
        }
    }

    /// Build from the `[cluster]` settings section
    pub fn from_settings(target: &str, settings: &ClusterSettings) -> Result<Self> {
        let tick = crate::config::parse_duration("tick", &settings.tick)?;
        let mut cluster = Self::new(target, settings.servers, settings.drives_per_server)
            .with_seed(settings.seed)
            .with_tick(tick);
        if let Some(msg) = &settings.fail_dispatch {
            cluster = cluster.with_dispatch_failure(msg.clone());
        }
        Ok(cluster)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the pacing between simulated messages
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Make every operation fail up front with `message`
    pub fn with_dispatch_failure(mut self, message: impl Into<String>) -> Self {
        self.fail_dispatch = Some(message.into());
        self
    }

    fn check_dispatch(&self) -> Result<()> {
        match &self.fail_dispatch {
            Some(msg) => Err(PerfError::RemoteError(msg.clone())),
            None => Ok(()),
        }
    }

    fn endpoint(&self, server: usize) -> String {
        let host = self.target.trim_end_matches('/');
        format!("{}-node{}:9000", host, server + 1)
    }

    fn disk_name(&self, server: usize, drive: usize) -> String {
        format!("node{}/sd{}", server + 1, (b'a' + (drive % 26) as u8) as char)
    }

    /// Waits one tick; `false` when the scope was cancelled meanwhile
    async fn wait_tick(&self, scope: &CancellationToken) -> bool {
        tokio::select! {
            _ = scope.cancelled() => false,
            _ = sleep(self.tick) => true,
        }
    }

    fn drive_result(&self, rng: &mut SmallRng, server: usize, opts: &DriveTestOptions) -> DriveSpeedTestResult {
        // Small blocks cost per-request overhead.
        let efficiency = (opts.block_size as f64 / (4.0 * MIB)).min(1.0).powf(0.25);
        let drive_perf = (0..self.drives_per_server)
            .map(|drive| {
                let path = format!("/data{}", drive + 1);
                if rng.gen_bool(DRIVE_FAILURE_RATE) {
                    return DrivePerf {
                        path,
                        error: Some("drive not responding".to_string()),
                        ..Default::default()
                    };
                }
                let write = rng.gen_range(600.0..1400.0) * MIB * efficiency;
                let read = write * rng.gen_range(1.1..1.4);
                DrivePerf {
                    path,
                    read_throughput: read as u64,
                    write_throughput: write as u64,
                    error: None,
                }
            })
            .collect();

        DriveSpeedTestResult {
            version: RESULT_VERSION.to_string(),
            endpoint: self.endpoint(server),
            drive_perf,
            error: None,
        }
    }

    fn object_result(&self, rng: &mut SmallRng, concurrency: usize, opts: &ObjectTestOptions) -> ObjectSpeedTestResult {
        // Throughput saturates as concurrency grows past the knee.
        let knee = 24.0 * self.drives_per_server as f64;
        let saturation = 1.0 - (-(concurrency as f64) / knee).exp();
        let size = opts.size.max(1);

        let stats = |rng: &mut SmallRng, ceiling: f64| {
            let servers = (0..self.servers)
                .map(|server| {
                    let tp = ceiling * saturation * rng.gen_range(0.9..1.1);
                    SpeedTestStatServer {
                        endpoint: self.endpoint(server),
                        throughput_per_sec: tp as u64,
                        objects_per_sec: (tp / size as f64) as u64,
                        err: None,
                    }
                })
                .collect();
            SpeedTestStats::from_servers(servers)
        };

        let per_server_ceiling = 400.0 * MIB * self.drives_per_server as f64;
        let put_stats = stats(&mut *rng, per_server_ceiling);
        let get_stats = stats(&mut *rng, per_server_ceiling * 1.5);

        ObjectSpeedTestResult {
            version: RESULT_VERSION.to_string(),
            servers: self.servers,
            disks: self.servers * self.drives_per_server,
            size: opts.size,
            concurrent: concurrency,
            put_stats,
            get_stats,
        }
    }
}

#[async_trait]
impl AdminClient for SimulatedCluster {
    async fn drive_speedtest(
        &self,
        scope: CancellationToken,
        opts: DriveTestOptions,
    ) -> Result<mpsc::Receiver<DriveSpeedTestResult>> {
        self.check_dispatch()?;
        tracing::debug!(serial = opts.serial, block_size = opts.block_size, "starting drive speedtest");

        let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let cluster = self.clone();
        tokio::spawn(async move {
            let mut rng = SmallRng::seed_from_u64(cluster.seed);
            // Serial runs measure one drive at a time on each server.
            let pings = if opts.serial {
                DRIVE_PINGS * cluster.drives_per_server as u32
            } else {
                DRIVE_PINGS
            };
            for server in 0..cluster.servers {
                for _ in 0..pings {
                    if !cluster.wait_tick(&scope).await
                        || tx.send(DriveSpeedTestResult::ping()).await.is_err()
                    {
                        return;
                    }
                }
                let result = cluster.drive_result(&mut rng, server, &opts);
                if tx.send(result).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }

    async fn speedtest(
        &self,
        scope: CancellationToken,
        opts: ObjectTestOptions,
    ) -> Result<mpsc::Receiver<ObjectSpeedTestResult>> {
        self.check_dispatch()?;
        tracing::debug!(
            autotune = opts.autotune,
            concurrency = opts.concurrency,
            bucket = opts.bucket.as_deref().unwrap_or("default"),
            "starting object speedtest"
        );

        let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let cluster = self.clone();
        tokio::spawn(async move {
            let mut rng = SmallRng::seed_from_u64(cluster.seed ^ 0x0b1e_c7);
            let pings_per_step = (opts.duration.as_millis() / cluster.tick.as_millis().max(1)).max(1) as u32;
            let mut concurrency = opts.concurrency;
            let mut best = 0u64;

            for _ in 0..AUTOTUNE_MAX_STEPS {
                for _ in 0..pings_per_step {
                    if !cluster.wait_tick(&scope).await
                        || tx.send(ObjectSpeedTestResult::ping()).await.is_err()
                    {
                        return;
                    }
                }
                let result = cluster.object_result(&mut rng, concurrency, &opts);
                let throughput = result.put_stats.throughput_per_sec;
                if tx.send(result).await.is_err() {
                    return;
                }

                let gain = (throughput as f64 - best as f64) / best.max(1) as f64;
                if !opts.autotune || (best > 0 && gain < AUTOTUNE_MIN_GAIN) {
                    break;
                }
                best = best.max(throughput);
                concurrency += (concurrency / 2).max(1);
            }
        });
        Ok(rx)
    }

    async fn metrics(
        &self,
        scope: CancellationToken,
        opts: MetricsOptions,
        out: &mut (dyn FnMut(RealtimeMetrics) + Send),
    ) -> Result<()> {
        self.check_dispatch()?;

        let mut rng = SmallRng::seed_from_u64(self.seed ^ 0xd15c);
        let mut counters: BTreeMap<String, DiskIoStats> = BTreeMap::new();
        for server in 0..self.servers {
            for drive in 0..self.drives_per_server {
                counters.insert(self.disk_name(server, drive), DiskIoStats::default());
            }
        }

        let interval_ms = opts.interval.as_millis() as u64;
        let mut taken = 0u32;
        loop {
            if opts.samples.is_some_and(|limit| taken >= limit) {
                return Ok(());
            }
            tokio::select! {
                _ = scope.cancelled() => return Ok(()),
                _ = sleep(opts.interval) => {}
            }

            let mut sample = RealtimeMetrics::default();
            for (name, stats) in counters.iter_mut() {
                let reads = rng.gen_range(0..400u64);
                let writes = rng.gen_range(0..300u64);
                stats.read_ios += reads;
                stats.write_ios += writes;
                stats.read_sectors += reads * rng.gen_range(8..256u64);
                stats.write_sectors += writes * rng.gen_range(8..256u64);
                stats.read_ticks += reads * rng.gen_range(1..4u64);
                stats.write_ticks += writes * rng.gen_range(1..6u64);
                stats.current_ios = rng.gen_range(0..8u64);
                stats.total_ticks += rng.gen_range(0..=interval_ms);
                sample
                    .by_disk
                    .insert(name.clone(), DiskMetric { io_stats: *stats });
            }
            out(sample);
            taken += 1;
        }
    }
}
