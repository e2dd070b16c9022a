//! Shadow unit strings for atlas attributes.
//!
//! Shadow reads link latency and host bandwidth as quoted `"<value> <unit>"`
//! strings with an integer value. Latencies are written in microseconds and
//! bandwidths in KiB (per second).

/// Unit suffix used for written latencies
pub const LATENCY_UNIT: &str = "us";

/// Unit suffix used for written bandwidths
pub const BANDWIDTH_UNIT: &str = "KiB";

/// Format a latency in milliseconds as a Shadow time string
pub fn format_latency(ms: f64) -> String {
    format!("{} {}", latency_to_us(ms), LATENCY_UNIT)
}

/// Latency in milliseconds rounded to whole microseconds
pub fn latency_to_us(ms: f64) -> u64 {
    (ms * 1000.0).round() as u64
}

/// Format a bandwidth in KiB/s as a Shadow bandwidth string
pub fn format_bandwidth(kib: u64) -> String {
    format!("{} {}", kib, BANDWIDTH_UNIT)
}

fn split_value(text: &str) -> Option<(u64, &str)> {
    let text = text.trim();
    let digits = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    let value = text[..digits].parse().ok()?;
    Some((value, text[digits..].trim()))
}

/// Parse a Shadow time string into whole microseconds
///
/// Accepts `ns`, `us`, `ms` and `s`. Nanosecond values are rounded.
pub fn parse_latency_us(text: &str) -> Option<u64> {
    let (value, unit) = split_value(text)?;
    match unit {
        "ns" => Some((value + 500) / 1000),
        "us" | "μs" => Some(value),
        "ms" => value.checked_mul(1_000),
        "s" | "sec" => value.checked_mul(1_000_000),
        _ => None,
    }
}

/// Parse a Shadow bandwidth string into KiB/s
///
/// Only byte-based units are accepted, since atlas bandwidths are derived
/// in KiB/s.
pub fn parse_bandwidth_kib(text: &str) -> Option<u64> {
    let (value, unit) = split_value(text)?;
    match unit {
        "KiB" => Some(value),
        "MiB" => value.checked_mul(1024),
        "GiB" => value.checked_mul(1024 * 1024),
        _ => None,
    }
}
