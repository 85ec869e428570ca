//! Run outcome data models
//!
//! Classified progress messages coming off the result stream and the
//! envelope handed to whichever presentation sink is active.

use serde::Serialize;

use crate::config::BenchmarkKind;
use crate::models::result::{DiskIoSample, DriveSpeedTestResult, ObjectSpeedTestResult};

/// A result message after classification
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage<T> {
    /// Keep-alive ping carrying no measurement
    Intermediate(T),
    /// A real, versioned measurement
    Final(T),
    /// The stream failed
    Error(String),
}

impl<T: Measurement> ProgressMessage<T> {
    /// Classify a raw stream item by its version marker
    pub fn classify(item: T) -> Self {
        if item.is_versioned() {
            ProgressMessage::Final(item)
        } else {
            ProgressMessage::Intermediate(item)
        }
    }
}

/// A result type that can flow through the aggregator
pub trait Measurement: Clone + Send + Sync + 'static {
    /// Kind of benchmark producing this measurement
    const KIND: BenchmarkKind;

    /// Whether this is a real measurement rather than a progress ping
    fn is_versioned(&self) -> bool;

    /// Build the sink-facing result set from accepted measurements
    fn into_results(accepted: Vec<Self>) -> RunResults;
}

impl Measurement for DriveSpeedTestResult {
    const KIND: BenchmarkKind = BenchmarkKind::Drive;

    fn is_versioned(&self) -> bool {
        !self.version.is_empty()
    }

    fn into_results(accepted: Vec<Self>) -> RunResults {
        RunResults::Drive(accepted)
    }
}

impl Measurement for ObjectSpeedTestResult {
    const KIND: BenchmarkKind = BenchmarkKind::Object;

    fn is_versioned(&self) -> bool {
        !self.version.is_empty()
    }

    // Autotune steps supersede each other, only the latest one counts.
    fn into_results(accepted: Vec<Self>) -> RunResults {
        RunResults::Object(accepted.into_iter().last())
    }
}

impl Measurement for DiskIoSample {
    const KIND: BenchmarkKind = BenchmarkKind::DiskMetrics;

    // Samples come from the push API already unpacked per disk.
    fn is_versioned(&self) -> bool {
        !self.disk.is_empty()
    }

    fn into_results(accepted: Vec<Self>) -> RunResults {
        RunResults::Disk(accepted)
    }
}

/// Results carried by an outcome, keyed in JSON by the kind's field name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RunResults {
    #[serde(rename = "driveResult")]
    Drive(Vec<DriveSpeedTestResult>),
    #[serde(rename = "objectResult")]
    Object(Option<ObjectSpeedTestResult>),
    #[serde(rename = "diskResult")]
    Disk(Vec<DiskIoSample>),
}

impl RunResults {
    /// An empty result set of the given kind
    pub fn empty(kind: BenchmarkKind) -> Self {
        match kind {
            BenchmarkKind::Drive => RunResults::Drive(Vec::new()),
            BenchmarkKind::Object => RunResults::Object(None),
            BenchmarkKind::DiskMetrics => RunResults::Disk(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RunResults::Drive(r) => r.is_empty(),
            RunResults::Object(r) => r.is_none(),
            RunResults::Disk(r) => r.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RunResults::Drive(r) => r.len(),
            RunResults::Object(r) => usize::from(r.is_some()),
            RunResults::Disk(r) => r.len(),
        }
    }
}

/// Sink-facing envelope; exactly one per run has `is_final` set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    #[serde(rename = "type")]
    pub kind: BenchmarkKind,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub results: Option<RunResults>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "final")]
    pub is_final: bool,
}

impl RunOutcome {
    /// Empty-result keep-alive for live displays
    pub fn heartbeat(kind: BenchmarkKind) -> Self {
        Self {
            kind,
            results: Some(RunResults::empty(kind)),
            error: None,
            is_final: false,
        }
    }

    /// Non-final update carrying partial results
    pub fn update(kind: BenchmarkKind, results: RunResults) -> Self {
        Self {
            kind,
            results: Some(results),
            error: None,
            is_final: false,
        }
    }

    /// Terminal outcome of a successful run
    pub fn finished(kind: BenchmarkKind, results: RunResults) -> Self {
        Self {
            kind,
            results: Some(results),
            error: None,
            is_final: true,
        }
    }

    /// Terminal outcome of a failed run
    pub fn failed(kind: BenchmarkKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            results: None,
            error: Some(error.into()),
            is_final: true,
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        !self.is_final
            && self.error.is_none()
            && self.results.as_ref().map_or(true, RunResults::is_empty)
    }

    /// Encode as the single-line JSON document printed in structured mode
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Accepted results of one run plus its terminal flag
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResult<T> {
    /// Retained results in arrival order
    pub accepted: Vec<T>,
    /// Versioned results seen, including ones no longer retained
    pub total_accepted: usize,
    pub error: Option<String>,
    pub is_final: bool,
}

impl<T> Default for AggregatedResult<T> {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            total_accepted: 0,
            error: None,
            is_final: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(version: &str, endpoint: &str) -> DriveSpeedTestResult {
        DriveSpeedTestResult {
            version: version.to_string(),
            endpoint: endpoint.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_by_version() {
        assert!(matches!(
            ProgressMessage::classify(drive("", "a")),
            ProgressMessage::Intermediate(_)
        ));
        assert!(matches!(
            ProgressMessage::classify(drive("1", "a")),
            ProgressMessage::Final(_)
        ));
    }

    #[test]
    fn test_object_results_keep_latest() {
        let first = ObjectSpeedTestResult {
            version: "1".to_string(),
            concurrent: 8,
            ..Default::default()
        };
        let second = ObjectSpeedTestResult {
            version: "1".to_string(),
            concurrent: 16,
            ..Default::default()
        };
        match ObjectSpeedTestResult::into_results(vec![first, second]) {
            RunResults::Object(Some(latest)) => assert_eq!(latest.concurrent, 16),
            other => panic!("unexpected results: {:?}", other),
        }
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = RunOutcome::finished(
            BenchmarkKind::Drive,
            RunResults::Drive(vec![drive("1", "node1")]),
        );
        let value: serde_json::Value = serde_json::from_str(&outcome.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "drive");
        assert_eq!(value["final"], true);
        assert_eq!(value["driveResult"][0]["endpoint"], "node1");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failed_outcome_json_shape() {
        let outcome = RunOutcome::failed(BenchmarkKind::Object, "connection refused");
        let value: serde_json::Value = serde_json::from_str(&outcome.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["error"], "connection refused");
        assert_eq!(value["final"], true);
        assert!(value.get("objectResult").is_none());
    }

    #[test]
    fn test_heartbeat_detection() {
        assert!(RunOutcome::heartbeat(BenchmarkKind::Drive).is_heartbeat());
        assert!(!RunOutcome::failed(BenchmarkKind::Drive, "x").is_heartbeat());
        assert!(!RunOutcome::update(
            BenchmarkKind::Drive,
            RunResults::Drive(vec![drive("1", "a")])
        )
        .is_heartbeat());
    }
}
