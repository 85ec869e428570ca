//! Presentation sinks
//!
//! Both output variants accept a sequence of [`RunOutcome`] values. The
//! structured sink writes exactly one JSON document per run; the
//! interactive display runs its own loop and is fed through a cloneable,
//! non-blocking handle.

use std::io::Write;
use std::sync::Mutex;

use crate::models::RunOutcome;
use crate::{PerfError, Result};

/// Receives outcomes from the aggregator
///
/// `post` must never block: the aggregator calls it from inside the
/// remote stream loop and from the metrics push callback.
pub trait OutcomeSink: Send + Sync {
    fn post(&self, outcome: RunOutcome);
}

/// A live display with its own event loop
pub trait InteractiveDisplay: Send + 'static {
    type Handle: OutcomeSink + Clone + 'static;

    /// Handle used to post outcomes while the display runs
    fn handle(&self) -> Self::Handle;

    /// Run the display loop, blocking the calling thread until the user
    /// quits or the final outcome has been shown.
    fn run(self) -> Result<()>;
}

/// Writes the final outcome of a run as one JSON document
pub struct StructuredSink<W: Write + Send> {
    writer: Mutex<W>,
    written: Mutex<Option<Result<()>>>,
}

impl<W: Write + Send> StructuredSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            written: Mutex::new(None),
        }
    }

    /// Whether the document has been written
    pub fn is_done(&self) -> bool {
        self.written.lock().map(|w| w.is_some()).unwrap_or(true)
    }

    /// Outcome of writing the document; an error if nothing was written
    pub fn finish(self) -> Result<W> {
        let written = self
            .written
            .into_inner()
            .map_err(|_| PerfError::OutputError("output state poisoned".to_string()))?;
        match written {
            Some(Ok(())) => {}
            Some(Err(e)) => return Err(e),
            None => {
                return Err(PerfError::OutputError(
                    "run ended without a final outcome".to_string(),
                ))
            }
        }
        self.writer
            .into_inner()
            .map_err(|_| PerfError::OutputError("output writer poisoned".to_string()))
    }

    fn write_document(&self, outcome: &RunOutcome) -> Result<()> {
        let document = outcome.to_json()?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| PerfError::OutputError("output writer poisoned".to_string()))?;
        writeln!(writer, "{}", document)?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> OutcomeSink for StructuredSink<W> {
    fn post(&self, outcome: RunOutcome) {
        if !outcome.is_final {
            // Structured output never shows live updates.
            return;
        }
        let Ok(mut written) = self.written.lock() else {
            return;
        };
        if written.is_some() {
            tracing::warn!(kind = ?outcome.kind, "ignoring second final outcome");
            return;
        }
        *written = Some(self.write_document(&outcome));
    }
}

impl<S: OutcomeSink + ?Sized> OutcomeSink for std::sync::Arc<S> {
    fn post(&self, outcome: RunOutcome) {
        (**self).post(outcome)
    }
}
