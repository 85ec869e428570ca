//! Units formatting for the dashboard and the plain-text summary
//!
//! Sizes and rates use binary units, counts use K/M suffixes.

use std::time::Duration;

const BINARY_UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

fn scale_binary(value: f64) -> (f64, &'static str) {
    let mut size = value;
    let mut unit_index = 0;
    while size >= 1024.0 && unit_index < BINARY_UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }
    (size, BINARY_UNITS[unit_index])
}

/// Format a byte count with binary units
///
/// # Examples
/// ```
/// use clusterperf::util::units::format_bytes;
///
/// assert_eq!(format_bytes(1024), "1.0 KiB");
/// assert_eq!(format_bytes(64 * 1024 * 1024), "64.0 MiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let (size, unit) = scale_binary(bytes as f64);
    format!("{:.1} {}", size, unit)
}

/// Format a bytes-per-second rate
///
/// # Examples
/// ```
/// use clusterperf::util::units::format_rate;
///
/// assert_eq!(format_rate(1_610_612_736.0), "1.5 GiB/s");
/// assert_eq!(format_rate(0.0), "0 B/s");
/// ```
pub fn format_rate(bytes_per_sec: f64) -> String {
    if !bytes_per_sec.is_finite() || bytes_per_sec <= 0.0 {
        return "0 B/s".to_string();
    }
    let (size, unit) = scale_binary(bytes_per_sec);
    if unit == "B" {
        format!("{:.0} B/s", size)
    } else {
        format!("{:.1} {}/s", size, unit)
    }
}

/// Format a per-second count such as objects or transfers
///
/// # Examples
/// ```
/// use clusterperf::util::units::format_per_sec;
///
/// assert_eq!(format_per_sec(1500.0, "obj"), "1.5K obj/s");
/// assert_eq!(format_per_sec(12.0, "ops"), "12 ops/s");
/// ```
pub fn format_per_sec(count: f64, what: &str) -> String {
    if count >= 1_000_000.0 {
        format!("{:.1}M {}/s", count / 1_000_000.0, what)
    } else if count >= 1_000.0 {
        format!("{:.1}K {}/s", count / 1_000.0, what)
    } else {
        format!("{:.0} {}/s", count, what)
    }
}

/// Format a duration compactly
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use clusterperf::util::units::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    if total_secs >= 3600 {
        format!(
            "{}h {}m {}s",
            total_secs / 3600,
            (total_secs % 3600) / 60,
            total_secs % 60
        )
    } else if total_secs >= 60 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else if total_secs > 0 {
        format!("{}s", total_secs)
    } else {
        format!("{}ms", duration.subsec_millis())
    }
}

/// Format an average wait in milliseconds
pub fn format_await(ms: f64) -> String {
    if ms >= 1.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.0}μs", ms * 1000.0)
    }
}

/// Format a 0..=100 percentage
pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(4 * 1024 * 1024), "4.0 MiB");
        assert_eq!(format_bytes(1073741824), "1.0 GiB");
        assert_eq!(format_bytes(1099511627776), "1.0 TiB");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(512.0), "512 B/s");
        assert_eq!(format_rate(1_048_576.0), "1.0 MiB/s");
        assert_eq!(format_rate(-1.0), "0 B/s");
        assert_eq!(format_rate(f64::NAN), "0 B/s");
    }

    #[test]
    fn test_format_per_sec() {
        assert_eq!(format_per_sec(500.0, "obj"), "500 obj/s");
        assert_eq!(format_per_sec(2_500_000.0, "obj"), "2.5M obj/s");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
        assert_eq!(format_duration(Duration::ZERO), "0ms");
    }

    #[test]
    fn test_format_await_and_percent() {
        assert_eq!(format_await(5.0), "5.00ms");
        assert_eq!(format_await(0.5), "500μs");
        assert_eq!(format_percent(42.345), "42.3%");
        assert_eq!(format_percent(120.0), "100.0%");
    }
}
