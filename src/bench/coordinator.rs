//! Run coordination
//!
//! Owns the per-run cancellation scope, dispatches the remote test, and
//! wires the aggregator to exactly one presentation sink. The scope is
//! cancelled whenever a run function returns, so no result production
//! outlives the run.

use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::app::Dashboard;
use crate::bench::aggregator::{Aggregator, Delivery};
use crate::bench::sink::{InteractiveDisplay, OutcomeSink, StructuredSink};
use crate::client::AdminClient;
use crate::config::{BenchmarkRequest, OutputMode, TestSpec};
use crate::models::{DiskIoSample, DriveSpeedTestResult, ObjectSpeedTestResult};
use crate::{PerfError, Result};

/// Summary of a finished run, returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Versioned results accepted
    pub accepted: usize,
    /// Error text of a failed run
    pub error: Option<String>,
    /// Whether the final outcome was produced
    pub finalized: bool,
}

impl<T> From<crate::models::AggregatedResult<T>> for RunReport {
    fn from(result: crate::models::AggregatedResult<T>) -> Self {
        Self {
            accepted: result.total_accepted,
            error: result.error,
            finalized: result.is_final,
        }
    }
}

/// Executes benchmark runs against one admin client
pub struct RunCoordinator<C: AdminClient + 'static> {
    client: Arc<C>,
    /// Process-wide shutdown; every run scope is a child of it
    shutdown: CancellationToken,
}

impl<C: AdminClient + 'static> RunCoordinator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            shutdown: CancellationToken::new(),
        }
    }

    /// Tie every run to `shutdown`, e.g. a Ctrl+C handler's token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run `request` in its configured output mode.
    ///
    /// Structured output goes to stdout; interactive mode starts the
    /// terminal dashboard.
    pub async fn run(&self, request: &BenchmarkRequest) -> Result<RunReport> {
        match request.output {
            OutputMode::Structured => self.run_structured(request, std::io::stdout()).await,
            OutputMode::Interactive => {
                let display = Dashboard::new(request);
                self.run_interactive(request, display).await
            }
        }
    }

    /// Run to completion and write exactly one JSON document to `out`
    pub async fn run_structured<W: Write + Send>(
        &self,
        request: &BenchmarkRequest,
        out: W,
    ) -> Result<RunReport> {
        let scope = self.shutdown.child_token();
        let _cancel_on_return = scope.clone().drop_guard();
        tracing::info!(kind = ?request.kind(), cluster = %request.target, "starting structured run");

        let sink = StructuredSink::new(out);
        let report = aggregate(self.client.as_ref(), &request.test, Delivery::Buffered, scope, &sink).await;
        sink.finish()?;
        Ok(report)
    }

    /// Run with a live display.
    ///
    /// The display is started on its own blocking thread before any
    /// outcome is forwarded; the aggregation task then feeds it through
    /// the display handle. Returns once the display loop has ended, after
    /// cancelling the run scope and joining the aggregation task. A
    /// display failure is returned immediately as [`PerfError::TuiError`].
    pub async fn run_interactive<D: InteractiveDisplay>(
        &self,
        request: &BenchmarkRequest,
        display: D,
    ) -> Result<RunReport> {
        let scope = self.shutdown.child_token();
        let _cancel_on_return = scope.clone().drop_guard();
        tracing::info!(kind = ?request.kind(), cluster = %request.target, "starting interactive run");

        let handle = display.handle();
        let display_task = tokio::task::spawn_blocking(move || display.run());

        let client = Arc::clone(&self.client);
        let test = request.test.clone();
        let aggregation_scope = scope.clone();
        let aggregation = tokio::spawn(async move {
            aggregate(client.as_ref(), &test, Delivery::Live, aggregation_scope, &handle).await
        });

        let display_result = display_task
            .await
            .map_err(|e| PerfError::TuiError(format!("display thread failed: {}", e)))
            .and_then(|r| r);

        scope.cancel();
        if let Err(e) = display_result {
            tracing::error!(error = %e, "display failed");
            aggregation.abort();
            return Err(match e {
                PerfError::TuiError(_) => e,
                other => PerfError::TuiError(other.to_string()),
            });
        }

        aggregation.await.map_err(|e| {
            tracing::error!(error = %e, "aggregation task failed");
            PerfError::TaskError(format!("aggregation task failed: {}", e))
        })
    }
}

/// Dispatch the remote operation for `test` and aggregate it into `sink`
async fn aggregate<C: AdminClient + ?Sized>(
    client: &C,
    test: &TestSpec,
    delivery: Delivery,
    scope: CancellationToken,
    sink: &dyn OutcomeSink,
) -> RunReport {
    match test {
        TestSpec::Drive(opts) => {
            let source = client.drive_speedtest(scope.clone(), opts.clone()).await;
            Aggregator::<DriveSpeedTestResult>::new(delivery)
                .drain(source, &scope, sink)
                .await
                .into()
        }
        TestSpec::Object(opts) => {
            let source = client.speedtest(scope.clone(), opts.clone()).await;
            Aggregator::<ObjectSpeedTestResult>::new(delivery)
                .drain(source, &scope, sink)
                .await
                .into()
        }
        TestSpec::DiskMetrics(opts) => {
            let mut metrics = opts.metrics.clone();
            if delivery == Delivery::Buffered && metrics.samples.is_none() {
                // A document needs a terminating stream.
                metrics.samples = Some(1);
            }
            Aggregator::<DiskIoSample>::new(delivery)
                .collect_metrics(client, metrics, scope, sink)
                .await
                .into()
        }
    }
}
