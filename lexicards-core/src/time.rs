//! Unit conversion and human-readable formatting for millisecond timestamps.

use crate::Timestamp;
use chrono::{DateTime, Utc};

pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

pub fn minutes_to_ms(minutes: f64) -> i64 {
    (minutes * MS_PER_MINUTE as f64).round() as i64
}

pub fn days_to_ms(days: f64) -> i64 {
    (days * MS_PER_DAY as f64).round() as i64
}

/// Current wall-clock time. Only the binaries call this; the core takes `now` as input.
pub fn now_ms() -> Timestamp {
    Utc::now().timestamp_millis()
}

pub fn to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("in {n} {unit}")
    } else {
        format!("in {n} {unit}s")
    }
}

/// `"now"`, `"in 10 mins"`, `"in 1 hour"`, `"in 3 days"`.
pub fn format_time_until(target: Timestamp, now: Timestamp) -> String {
    let diff = target - now;
    if diff <= 0 {
        return "now".to_string();
    }
    let diff = diff as f64;
    let minutes = (diff / MS_PER_MINUTE as f64).round() as i64;
    if minutes < 60 {
        return plural(minutes, "min");
    }
    let hours = (diff / MS_PER_HOUR as f64).round() as i64;
    if hours < 24 {
        return plural(hours, "hour");
    }
    let days = (diff / MS_PER_DAY as f64).round() as i64;
    plural(days, "day")
}

/// Compact interval label: `"1d"`, `"2.5d"`, `"3w"`, `"4mo"`, `"1y"`.
pub fn format_interval(days: f64) -> String {
    if days <= 0.0 {
        "now".to_string()
    } else if days < 7.0 {
        let rounded = (days * 10.0).round() / 10.0;
        if rounded.fract() == 0.0 {
            format!("{}d", rounded as i64)
        } else {
            format!("{rounded:.1}d")
        }
    } else if days < 30.0 {
        format!("{}w", (days / 7.0) as i64)
    } else if days < 365.0 {
        format!("{}mo", (days / 30.0) as i64)
    } else {
        format!("{}y", (days / 365.0) as i64)
    }
}
