//! Remote benchmark API
//!
//! The admin client interface the run coordinator consumes. Speedtests
//! return a result channel or fail up front; metrics are pushed through a
//! callback until the run scope is cancelled or the sample budget is spent.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{DriveTestOptions, MetricsOptions, ObjectTestOptions, Settings};
use crate::models::{DriveSpeedTestResult, ObjectSpeedTestResult, RealtimeMetrics};
use crate::Result;

pub mod simulated;

pub use simulated::SimulatedCluster;

/// Capacity of the result channels handed out by clients
pub const RESULT_CHANNEL_CAPACITY: usize = 100;

/// Admin operations used by the performance commands
///
/// Implementations must stop producing and close their channels once
/// `scope` is cancelled. An `Err` return is the up-front dispatch error;
/// its message is shown to the user verbatim.
#[async_trait]
pub trait AdminClient: Send + Sync {
    /// Start a drive throughput test on every server
    async fn drive_speedtest(
        &self,
        scope: CancellationToken,
        opts: DriveTestOptions,
    ) -> Result<mpsc::Receiver<DriveSpeedTestResult>>;

    /// Start an object PUT/GET throughput test
    async fn speedtest(
        &self,
        scope: CancellationToken,
        opts: ObjectTestOptions,
    ) -> Result<mpsc::Receiver<ObjectSpeedTestResult>>;

    /// Stream realtime metrics into `out` until cancelled or done
    async fn metrics(
        &self,
        scope: CancellationToken,
        opts: MetricsOptions,
        out: &mut (dyn FnMut(RealtimeMetrics) + Send),
    ) -> Result<()>;
}

/// Connect to `target`.
///
/// Only the built-in simulated cluster is available; its layout comes from
/// the `[cluster]` settings section.
pub fn connect(target: &str, settings: &Settings) -> Result<SimulatedCluster> {
    tracing::info!(
        cluster = %target,
        servers = settings.cluster.servers,
        "connecting to simulated cluster"
    );
    SimulatedCluster::from_settings(target, &settings.cluster)
}
