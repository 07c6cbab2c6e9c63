//! Minute-resolution wall-clock arithmetic for shift time ranges.

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Parses "HH:MM" (or "HH:MM:SS", which databases often emit) into minutes
/// since midnight. Seconds are accepted but ignored.
pub fn parse_time_of_day(value: &str) -> Option<i64> {
    let mut parts = value.trim().split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    if let Some(seconds) = parts.next() {
        let seconds: i64 = seconds.parse().ok()?;
        if !(0..60).contains(&seconds) {
            return None;
        }
    }
    if parts.next().is_some() {
        return None;
    }
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Normalizes a (start, end) pair so end is strictly after start. An end at
/// or before the start means the shift runs overnight into the next day.
pub fn normalize_range(start: i64, end: i64) -> (i64, i64) {
    if end <= start {
        (start, end + MINUTES_PER_DAY)
    } else {
        (start, end)
    }
}
