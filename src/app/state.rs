//! Dashboard state management
//!
//! Folds the outcomes posted by the aggregator into what the screens
//! render, and maps keyboard input to dashboard actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::config::{BenchmarkKind, BenchmarkRequest, TestSpec};
use crate::models::{DiskIoStats, DiskRates, RunOutcome, RunResults};
use crate::util::units::{format_await, format_bytes, format_per_sec, format_percent, format_rate};

/// Where the run is, as far as the dashboard has seen
#[derive(Debug, Clone, PartialEq)]
pub enum RunPhase {
    /// Nothing received yet
    Waiting,
    /// Heartbeats or partial results are arriving
    Running,
    /// The final outcome carried results
    Completed,
    /// The final outcome carried an error
    Failed(String),
}

/// Actions that can be triggered by keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    /// Leave the dashboard (q, Q, Esc, Ctrl+C)
    Quit,
    /// No action
    None,
}

/// Per-disk view for the top-disk table
#[derive(Debug, Clone, PartialEq)]
pub struct DiskRow {
    pub disk: String,
    pub rates: DiskRates,
}

/// Everything the dashboard renders
#[derive(Debug)]
pub struct DashboardState {
    kind: BenchmarkKind,
    target: String,
    phase: RunPhase,
    started: Instant,
    heartbeats: u64,
    updates: u64,
    latest: Option<RunResults>,
    final_outcome: Option<RunOutcome>,
    should_quit: bool,
    /// Sampling interval used to turn cumulative disk counters into rates
    sample_interval: Duration,
    /// Number of disks shown
    disk_count: usize,
    previous_disk_stats: BTreeMap<String, DiskIoStats>,
    disk_rates: BTreeMap<String, DiskRates>,
}

impl DashboardState {
    pub fn new(request: &BenchmarkRequest) -> Self {
        let (sample_interval, disk_count) = match &request.test {
            TestSpec::DiskMetrics(opts) => (opts.metrics.interval, opts.count),
            _ => (Duration::from_secs(1), 0),
        };
        Self {
            kind: request.kind(),
            target: request.target.clone(),
            phase: RunPhase::Waiting,
            started: Instant::now(),
            heartbeats: 0,
            updates: 0,
            latest: None,
            final_outcome: None,
            should_quit: false,
            sample_interval,
            disk_count,
            previous_disk_stats: BTreeMap::new(),
            disk_rates: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> BenchmarkKind {
        self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn heartbeats(&self) -> u64 {
        self.heartbeats
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Latest results shown, final ones once the run has closed
    pub fn latest(&self) -> Option<&RunResults> {
        self.latest.as_ref()
    }

    pub fn final_outcome(&self) -> Option<&RunOutcome> {
        self.final_outcome.as_ref()
    }

    pub fn is_final(&self) -> bool {
        self.final_outcome.is_some()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Fold one posted outcome into the view
    pub fn apply(&mut self, outcome: RunOutcome) {
        if self.is_final() {
            return;
        }

        if outcome.is_heartbeat() {
            self.heartbeats += 1;
            self.phase = RunPhase::Running;
            return;
        }

        if let Some(results) = &outcome.results {
            // The final disk outcome repeats the last sample already seen.
            if let (RunResults::Disk(samples), false) = (results, outcome.is_final) {
                for sample in samples {
                    self.record_disk_sample(&sample.disk, &sample.stats);
                }
            }
            if !results.is_empty() || outcome.is_final {
                self.latest = Some(results.clone());
            }
        }

        if outcome.is_final {
            self.phase = match &outcome.error {
                Some(error) => RunPhase::Failed(error.clone()),
                None => RunPhase::Completed,
            };
            self.final_outcome = Some(outcome);
        } else {
            self.updates += 1;
            self.phase = RunPhase::Running;
        }
    }

    fn record_disk_sample(&mut self, disk: &str, stats: &DiskIoStats) {
        if let Some(previous) = self.previous_disk_stats.get(disk) {
            let rates = stats.rates_since(previous, self.sample_interval.as_secs_f64());
            self.disk_rates.insert(disk.to_string(), rates);
        }
        self.previous_disk_stats.insert(disk.to_string(), *stats);
    }

    /// Busiest disks first, at most the configured count
    pub fn top_disks(&self) -> Vec<DiskRow> {
        let mut rows: Vec<DiskRow> = self
            .disk_rates
            .iter()
            .map(|(disk, rates)| DiskRow {
                disk: disk.clone(),
                rates: *rates,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.rates
                .utilization
                .total_cmp(&a.rates.utilization)
                .then_with(|| a.disk.cmp(&b.disk))
        });
        rows.truncate(self.disk_count);
        rows
    }

    /// Number of disks that have reported at least once
    pub fn disks_seen(&self) -> usize {
        self.previous_disk_stats.len()
    }

    /// Convert keyboard event to a dashboard action
    pub fn key_to_action(key: KeyEvent) -> DashboardAction {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => DashboardAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                DashboardAction::Quit
            }
            _ => DashboardAction::None,
        }
    }

    /// Handle a keyboard event and update state accordingly
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if Self::key_to_action(key) == DashboardAction::Quit {
            self.quit();
        }
    }

    /// Plain-text lines describing how the run ended
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let Some(outcome) = &self.final_outcome else {
            lines.push(format!(
                "{} on {}: stopped before completion",
                self.kind.description(),
                self.target
            ));
            return lines;
        };

        if let Some(error) = &outcome.error {
            lines.push(format!(
                "{} on {} failed: {}",
                self.kind.description(),
                self.target,
                error
            ));
            return lines;
        }

        lines.push(format!("{} on {}", self.kind.description(), self.target));
        match &self.latest {
            Some(RunResults::Drive(results)) => {
                for result in results {
                    if let Some(error) = &result.error {
                        lines.push(format!("  {}  error: {}", result.endpoint, error));
                        continue;
                    }
                    for drive in &result.drive_perf {
                        match &drive.error {
                            Some(error) => lines.push(format!(
                                "  {} {}  error: {}",
                                result.endpoint, drive.path, error
                            )),
                            None => lines.push(format!(
                                "  {} {}  read {}  write {}",
                                result.endpoint,
                                drive.path,
                                format_rate(drive.read_throughput as f64),
                                format_rate(drive.write_throughput as f64)
                            )),
                        }
                    }
                }
            }
            Some(RunResults::Object(Some(result))) => {
                lines.push(format!(
                    "  {} servers, {} drives, {} objects, {} concurrent",
                    result.servers,
                    result.disks,
                    format_bytes(result.size),
                    result.concurrent
                ));
                lines.push(format!(
                    "  PUT {}  {}",
                    format_rate(result.put_stats.throughput_per_sec as f64),
                    format_per_sec(result.put_stats.objects_per_sec as f64, "obj")
                ));
                lines.push(format!(
                    "  GET {}  {}",
                    format_rate(result.get_stats.throughput_per_sec as f64),
                    format_per_sec(result.get_stats.objects_per_sec as f64, "obj")
                ));
            }
            Some(RunResults::Disk(_)) => {
                for row in self.top_disks() {
                    lines.push(format!(
                        "  {}  util {}  await {}",
                        row.disk,
                        format_percent(row.rates.utilization),
                        format_await(row.rates.await_ms)
                    ));
                }
            }
            Some(RunResults::Object(None)) | None => lines.push("  no results".to_string()),
        }
        lines
    }
}
