//! Utility functions module
//!
//! Contains helpers for formatting sizes, rates and durations.

pub mod units;

// Re-export commonly used functions
pub use units::{
    format_await, format_bytes, format_duration, format_per_sec, format_percent, format_rate,
};
