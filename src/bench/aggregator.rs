//! Result aggregation
//!
//! Consumes a remote result stream, classifies every message by its
//! version marker, accumulates accepted results and decides what is
//! forwarded to the active sink. The stream closing is the only signal
//! that produces the final outcome.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bench::sink::OutcomeSink;
use crate::client::AdminClient;
use crate::config::{BenchmarkKind, MetricsOptions};
use crate::models::{
    AggregatedResult, DiskIoSample, Measurement, ProgressMessage, RealtimeMetrics, RunOutcome,
};
use crate::Result;

/// How accepted results reach the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing is forwarded until the stream closes; pings are dropped
    Buffered,
    /// Pings become heartbeats and streaming kinds forward each result
    Live,
}

/// Per-run aggregation state
#[derive(Debug)]
pub struct Aggregator<T: Measurement> {
    delivery: Delivery,
    state: AggregatedResult<T>,
}

impl<T: Measurement> Aggregator<T> {
    pub fn new(delivery: Delivery) -> Self {
        Self {
            delivery,
            state: AggregatedResult::default(),
        }
    }

    pub fn kind(&self) -> BenchmarkKind {
        T::KIND
    }

    pub fn is_finalized(&self) -> bool {
        self.state.is_final
    }

    /// Number of versioned results accepted so far
    pub fn accepted_count(&self) -> usize {
        self.state.total_accepted
    }

    /// Classify and handle a raw stream item
    pub fn accept(&mut self, item: T, sink: &dyn OutcomeSink) {
        self.handle(ProgressMessage::classify(item), sink);
    }

    /// Handle one classified message
    pub fn handle(&mut self, message: ProgressMessage<T>, sink: &dyn OutcomeSink) {
        if self.state.is_final {
            tracing::trace!(kind = ?T::KIND, "message after final outcome dropped");
            return;
        }

        match message {
            ProgressMessage::Intermediate(_) => {
                if self.delivery == Delivery::Live {
                    tracing::trace!(kind = ?T::KIND, "heartbeat");
                    sink.post(RunOutcome::heartbeat(T::KIND));
                }
            }
            ProgressMessage::Final(item) => {
                self.state.total_accepted += 1;
                if self.delivery == Delivery::Live && T::KIND.streams_updates() {
                    // Live streams only need the latest value to close out,
                    // which keeps unbounded metric streams bounded in memory.
                    self.state.accepted.clear();
                    self.state.accepted.push(item.clone());
                    sink.post(RunOutcome::update(T::KIND, T::into_results(vec![item])));
                } else {
                    self.state.accepted.push(item);
                }
            }
            ProgressMessage::Error(cause) => {
                if self.state.total_accepted == 0 {
                    self.fail(cause, sink);
                } else {
                    tracing::warn!(
                        kind = ?T::KIND,
                        error = %cause,
                        accepted = self.state.total_accepted,
                        "result stream failed mid-run, closing with partial results"
                    );
                    self.finish(sink);
                }
            }
        }
    }

    /// Emit the final outcome with everything accepted; no-op once final
    pub fn finish(&mut self, sink: &dyn OutcomeSink) {
        if self.state.is_final {
            return;
        }
        self.state.is_final = true;
        tracing::debug!(kind = ?T::KIND, accepted = self.state.total_accepted, "result stream closed");
        sink.post(RunOutcome::finished(
            T::KIND,
            T::into_results(self.state.accepted.clone()),
        ));
    }

    /// Emit the single error outcome of a failed run; no-op once final
    pub fn fail(&mut self, cause: impl Into<String>, sink: &dyn OutcomeSink) {
        if self.state.is_final {
            return;
        }
        let cause = cause.into();
        tracing::debug!(kind = ?T::KIND, error = %cause, "run failed");
        self.state.is_final = true;
        self.state.error = Some(cause.clone());
        sink.post(RunOutcome::failed(T::KIND, cause));
    }

    pub fn into_result(self) -> AggregatedResult<T> {
        self.state
    }

    /// Drain a dispatched result stream into `sink`.
    ///
    /// An up-front dispatch error produces the single error outcome and the
    /// channel is never read. Once `scope` is cancelled the receiver is
    /// closed, whatever is already buffered is still handled, and the run
    /// is closed out.
    pub async fn drain(
        mut self,
        source: Result<mpsc::Receiver<T>>,
        scope: &CancellationToken,
        sink: &dyn OutcomeSink,
    ) -> AggregatedResult<T> {
        let mut rx = match source {
            Ok(rx) => rx,
            Err(e) => {
                self.fail(e.to_string(), sink);
                return self.into_result();
            }
        };

        loop {
            tokio::select! {
                // Prefer delivering results already in flight.
                biased;
                item = rx.recv() => match item {
                    Some(item) => self.accept(item, sink),
                    None => break,
                },
                _ = scope.cancelled() => {
                    tracing::debug!(kind = ?T::KIND, "run scope cancelled, draining buffered results");
                    rx.close();
                    while let Some(item) = rx.recv().await {
                        self.accept(item, sink);
                    }
                    break;
                }
            }
        }

        self.finish(sink);
        self.into_result()
    }
}

impl Aggregator<DiskIoSample> {
    /// Drive the push-style metrics API, forwarding one outcome per disk
    /// sample. A failure before any sample arrived is the run's error.
    pub async fn collect_metrics<C: AdminClient + ?Sized>(
        mut self,
        client: &C,
        opts: MetricsOptions,
        scope: CancellationToken,
        sink: &dyn OutcomeSink,
    ) -> AggregatedResult<DiskIoSample> {
        let outcome = {
            let mut on_metrics = |metrics: RealtimeMetrics| {
                for sample in metrics.into_samples() {
                    self.accept(sample, sink);
                }
            };
            client.metrics(scope, opts, &mut on_metrics).await
        };

        match outcome {
            Ok(()) => self.finish(sink),
            Err(e) => self.handle(ProgressMessage::Error(e.to_string()), sink),
        }
        self.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DriveSpeedTestResult, ObjectSpeedTestResult, RunResults};
    use crate::PerfError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<RunOutcome>>);

    impl OutcomeSink for Recorder {
        fn post(&self, outcome: RunOutcome) {
            self.0.lock().unwrap().push(outcome);
        }
    }

    impl Recorder {
        fn take(&self) -> Vec<RunOutcome> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn drive(version: &str, endpoint: &str) -> DriveSpeedTestResult {
        DriveSpeedTestResult {
            version: version.to_string(),
            endpoint: endpoint.to_string(),
            ..Default::default()
        }
    }

    fn object(version: &str, concurrent: usize) -> ObjectSpeedTestResult {
        ObjectSpeedTestResult {
            version: version.to_string(),
            concurrent,
            ..Default::default()
        }
    }

    #[test]
    fn test_buffered_drive_drops_pings() {
        let sink = Recorder::default();
        let mut agg = Aggregator::new(Delivery::Buffered);
        agg.accept(drive("", ""), &sink);
        agg.accept(drive("1", "a"), &sink);
        agg.accept(drive("", ""), &sink);
        assert!(sink.take().is_empty());

        agg.finish(&sink);
        let outcomes = sink.take();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_final);
        assert_eq!(outcomes[0].results, Some(RunResults::Drive(vec![drive("1", "a")])));
    }

    #[test]
    fn test_live_drive_heartbeats_then_final() {
        let sink = Recorder::default();
        let mut agg = Aggregator::new(Delivery::Live);
        agg.accept(drive("", ""), &sink);
        agg.accept(drive("1", "a"), &sink);
        agg.accept(drive("", ""), &sink);
        agg.accept(drive("1", "b"), &sink);
        agg.finish(&sink);

        let outcomes = sink.take();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_heartbeat());
        assert!(outcomes[1].is_heartbeat());
        assert_eq!(
            outcomes[2].results,
            Some(RunResults::Drive(vec![drive("1", "a"), drive("1", "b")]))
        );
        assert!(outcomes[2].is_final);
    }

    #[test]
    fn test_live_object_streams_each_result() {
        let sink = Recorder::default();
        let mut agg = Aggregator::new(Delivery::Live);
        agg.accept(object("1", 8), &sink);
        agg.accept(object("1", 12), &sink);
        agg.finish(&sink);

        let outcomes = sink.take();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].results, Some(RunResults::Object(Some(object("1", 8)))));
        assert_eq!(outcomes[1].results, Some(RunResults::Object(Some(object("1", 12)))));
        assert_eq!(outcomes[2].results, Some(RunResults::Object(Some(object("1", 12)))));
        assert!(outcomes[2].is_final);
        assert_eq!(agg.accepted_count(), 2);
    }

    #[test]
    fn test_final_emitted_once() {
        let sink = Recorder::default();
        let mut agg: Aggregator<DriveSpeedTestResult> = Aggregator::new(Delivery::Live);
        agg.finish(&sink);
        agg.finish(&sink);
        agg.fail("late", &sink);
        agg.accept(drive("1", "a"), &sink);
        assert_eq!(sink.take().len(), 1);
        assert!(agg.is_finalized());
    }

    #[test]
    fn test_error_before_results_fails_run() {
        let sink = Recorder::default();
        let mut agg: Aggregator<DriveSpeedTestResult> = Aggregator::new(Delivery::Buffered);
        agg.handle(ProgressMessage::Error("boom".to_string()), &sink);
        let outcomes = sink.take();
        assert_eq!(outcomes, vec![RunOutcome::failed(BenchmarkKind::Drive, "boom")]);
    }

    #[test]
    fn test_error_mid_stream_degrades_to_close() {
        let sink = Recorder::default();
        let mut agg = Aggregator::new(Delivery::Buffered);
        agg.accept(drive("1", "a"), &sink);
        agg.handle(ProgressMessage::Error("reset".to_string()), &sink);
        let outcomes = sink.take();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].error.is_none());
        assert_eq!(outcomes[0].results, Some(RunResults::Drive(vec![drive("1", "a")])));
    }

    #[tokio::test]
    async fn test_drain_dispatch_error() {
        let sink = Recorder::default();
        let agg: Aggregator<ObjectSpeedTestResult> = Aggregator::new(Delivery::Live);
        let result = agg
            .drain(
                Err(PerfError::RemoteError("connection refused".to_string())),
                &CancellationToken::new(),
                &sink,
            )
            .await;
        assert_eq!(result.error.as_deref(), Some("connection refused"));
        assert_eq!(
            sink.take(),
            vec![RunOutcome::failed(BenchmarkKind::Object, "connection refused")]
        );
    }

    #[tokio::test]
    async fn test_drain_until_close() {
        let sink = Recorder::default();
        let (tx, rx) = mpsc::channel(8);
        tx.send(drive("1", "a")).await.unwrap();
        tx.send(drive("", "")).await.unwrap();
        tx.send(drive("1", "b")).await.unwrap();
        drop(tx);

        let result = Aggregator::new(Delivery::Buffered)
            .drain(Ok(rx), &CancellationToken::new(), &sink)
            .await;
        assert!(result.is_final);
        assert_eq!(result.accepted, vec![drive("1", "a"), drive("1", "b")]);
        assert_eq!(sink.take().len(), 1);
    }

    #[tokio::test]
    async fn test_drain_closes_out_on_cancel() {
        let sink = Recorder::default();
        let (tx, rx) = mpsc::channel(8);
        tx.send(drive("1", "a")).await.unwrap();
        let scope = CancellationToken::new();
        scope.cancel();

        // The sender stays open; cancellation alone must end the loop.
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            Aggregator::new(Delivery::Buffered).drain(Ok(rx), &scope, &sink),
        )
        .await
        .expect("drain should not hang after cancellation");
        assert_eq!(result.accepted, vec![drive("1", "a")]);
        assert!(sink.take()[0].is_final);
        drop(tx);
    }
}
