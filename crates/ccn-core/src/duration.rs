//! Human-readable elapsed time between two stored timestamps.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Placeholder shown when a duration cannot be computed.
pub const UNKNOWN: &str = "Unknown";

/// Formats the time between two timestamp strings, e.g. `"2m30s"` or `"1h15m"`.
///
/// Accepts RFC 3339 and SQLite's `YYYY-MM-DD HH:MM:SS` (read as UTC).
/// Unparseable or reversed input yields [`UNKNOWN`].
pub fn format_duration(start: &str, end: &str) -> String {
    match (parse_timestamp(start), parse_timestamp(end)) {
        (Some(start), Some(end)) => format_elapsed(start, end),
        _ => UNKNOWN.to_string(),
    }
}

/// Formats the whole seconds between `start` and `end`.
pub fn format_elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format_seconds(end.signed_duration_since(start).num_seconds())
}

/// Formats a whole-second count. Seconds are dropped once hours are shown.
pub fn format_seconds(total_seconds: i64) -> String {
    if total_seconds < 0 {
        return UNKNOWN.to_string();
    }
    if total_seconds < 60 {
        return format!("{total_seconds}s");
    }

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    match (hours, minutes, seconds) {
        (0, m, 0) => format!("{m}m"),
        (0, m, s) => format!("{m}m{s}s"),
        (h, 0, _) => format!("{h}h"),
        (h, m, _) => format!("{h}h{m}m"),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
