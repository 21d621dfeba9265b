use chrono::{Duration, NaiveDate};

/// This is the standard way of converting a date to a day key in sitetally.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a day key back. Keys that aren't ISO dates yield `None`.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Short label for charts, e.g. `Jul 4`. Falls back to the raw key.
pub fn display_day(key: &str) -> String {
    parse_day_key(key)
        .map(|date| date.format("%b %-d").to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Human readable duration. Hours and minutes once there is at least a minute, seconds
/// otherwise.
pub fn format_seconds(seconds: u64) -> String {
    let duration = Duration::seconds(seconds as i64);
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes >= 1 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}
