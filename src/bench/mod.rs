//! Benchmark run engine
//!
//! Contains result aggregation, the presentation sink seam and the run
//! coordinator tying a dispatched remote test to exactly one sink.

pub mod aggregator;
pub mod coordinator;
pub mod sink;

// Re-export commonly used types
pub use aggregator::{Aggregator, Delivery};
pub use coordinator::{RunCoordinator, RunReport};
pub use sink::{InteractiveDisplay, OutcomeSink, StructuredSink};
