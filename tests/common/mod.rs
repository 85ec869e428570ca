//! Scripted admin client and headless display shared by the integration
//! tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use clusterperf::bench::{InteractiveDisplay, OutcomeSink};
use clusterperf::client::AdminClient;
use clusterperf::config::{DriveTestOptions, MetricsOptions, ObjectTestOptions};
use clusterperf::models::{
    DiskIoStats, DiskMetric, DriveSpeedTestResult, ObjectSpeedTestResult, RealtimeMetrics,
    RunOutcome,
};
use clusterperf::{PerfError, Result};

/// Replays recorded result streams
#[derive(Default)]
pub struct ScriptedClient {
    pub drive: Vec<DriveSpeedTestResult>,
    pub object: Vec<ObjectSpeedTestResult>,
    pub metrics: Vec<RealtimeMetrics>,
    /// Fail every dispatch with this message
    pub dispatch_error: Option<String>,
    /// Fail the metrics call with this message after replaying `metrics`
    pub metrics_error: Option<String>,
    /// Keep the channel open after the script until the scope is cancelled
    pub hold_open: bool,
    /// Pause between scripted items
    pub pace: Duration,
    /// Panic with this message when a test is dispatched
    pub panic_on_dispatch: Option<String>,
}

impl ScriptedClient {
    pub fn drive(results: Vec<DriveSpeedTestResult>) -> Self {
        Self {
            drive: results,
            ..Default::default()
        }
    }

    pub fn object(results: Vec<ObjectSpeedTestResult>) -> Self {
        Self {
            object: results,
            ..Default::default()
        }
    }

    pub fn metrics(samples: Vec<RealtimeMetrics>) -> Self {
        Self {
            metrics: samples,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            dispatch_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn replay<T: Send + 'static>(
        &self,
        scope: CancellationToken,
        items: Vec<T>,
    ) -> Result<mpsc::Receiver<T>> {
        if let Some(message) = &self.panic_on_dispatch {
            panic!("{}", message);
        }
        if let Some(message) = &self.dispatch_error {
            return Err(PerfError::RemoteError(message.clone()));
        }
        let (tx, rx) = mpsc::channel(16);
        let hold_open = self.hold_open;
        let pace = self.pace;
        tokio::spawn(async move {
            for item in items {
                if scope.is_cancelled() || tx.send(item).await.is_err() {
                    return;
                }
                if !pace.is_zero() {
                    tokio::time::sleep(pace).await;
                }
            }
            if hold_open {
                scope.cancelled().await;
            }
        });
        Ok(rx)
    }
}

#[async_trait]
impl AdminClient for ScriptedClient {
    async fn drive_speedtest(
        &self,
        scope: CancellationToken,
        _opts: DriveTestOptions,
    ) -> Result<mpsc::Receiver<DriveSpeedTestResult>> {
        self.replay(scope, self.drive.clone())
    }

    async fn speedtest(
        &self,
        scope: CancellationToken,
        _opts: ObjectTestOptions,
    ) -> Result<mpsc::Receiver<ObjectSpeedTestResult>> {
        self.replay(scope, self.object.clone())
    }

    async fn metrics(
        &self,
        scope: CancellationToken,
        opts: MetricsOptions,
        out: &mut (dyn FnMut(RealtimeMetrics) + Send),
    ) -> Result<()> {
        if let Some(message) = &self.dispatch_error {
            return Err(PerfError::RemoteError(message.clone()));
        }
        let limit = opts.samples.map_or(usize::MAX, |n| n as usize);
        for sample in self.metrics.iter().take(limit) {
            if scope.is_cancelled() {
                return Ok(());
            }
            out(sample.clone());
        }
        if let Some(message) = &self.metrics_error {
            return Err(PerfError::RemoteError(message.clone()));
        }
        if self.hold_open && self.metrics.len() < limit {
            scope.cancelled().await;
        }
        Ok(())
    }
}

pub fn drive_result(version: &str, endpoint: &str) -> DriveSpeedTestResult {
    DriveSpeedTestResult {
        version: version.to_string(),
        endpoint: endpoint.to_string(),
        ..Default::default()
    }
}

pub fn object_result(version: &str, concurrent: usize) -> ObjectSpeedTestResult {
    ObjectSpeedTestResult {
        version: version.to_string(),
        concurrent,
        ..Default::default()
    }
}

pub fn disk_sample(disks: &[(&str, u64)]) -> RealtimeMetrics {
    RealtimeMetrics {
        by_disk: disks
            .iter()
            .map(|(disk, ticks)| {
                (
                    disk.to_string(),
                    DiskMetric {
                        io_stats: DiskIoStats {
                            total_ticks: *ticks,
                            ..Default::default()
                        },
                    },
                )
            })
            .collect(),
    }
}

/// Records every posted outcome
#[derive(Clone, Default)]
pub struct Recorder(pub Arc<Mutex<Vec<RunOutcome>>>);

impl OutcomeSink for Recorder {
    fn post(&self, outcome: RunOutcome) {
        self.0.lock().unwrap().push(outcome);
    }
}

impl Recorder {
    pub fn outcomes(&self) -> Vec<RunOutcome> {
        self.0.lock().unwrap().clone()
    }

    pub fn finals(&self) -> Vec<RunOutcome> {
        self.outcomes().into_iter().filter(|o| o.is_final).collect()
    }
}

/// How the headless display behaves
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DisplayMode {
    /// Return once the final outcome has been seen
    UntilFinal,
    /// Return after this many outcomes, as if the user quit
    QuitAfter(usize),
    /// Fail to start
    FailOnStart,
}

/// Display without a terminal
pub struct HeadlessDisplay {
    recorder: Recorder,
    mode: DisplayMode,
}

impl HeadlessDisplay {
    pub fn new(mode: DisplayMode) -> (Self, Recorder) {
        let recorder = Recorder::default();
        (
            Self {
                recorder: recorder.clone(),
                mode,
            },
            recorder,
        )
    }
}

impl InteractiveDisplay for HeadlessDisplay {
    type Handle = Recorder;

    fn handle(&self) -> Recorder {
        self.recorder.clone()
    }

    fn run(self) -> Result<()> {
        if self.mode == DisplayMode::FailOnStart {
            return Err(PerfError::TuiError("no terminal".to_string()));
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        loop {
            let outcomes = self.recorder.outcomes();
            let done = match self.mode {
                DisplayMode::UntilFinal => outcomes.iter().any(|o| o.is_final),
                DisplayMode::QuitAfter(n) => outcomes.len() >= n,
                DisplayMode::FailOnStart => true,
            };
            if done {
                return Ok(());
            }
            if std::time::Instant::now() > deadline {
                return Err(PerfError::TuiError("display timed out".to_string()));
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}
