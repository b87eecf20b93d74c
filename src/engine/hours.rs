use chrono::{DateTime, Utc};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;
const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Rounds to 2 decimal places. Apply only at presentation or storage
/// boundaries, never to values that are summed afterwards.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Hours between punch-in and punch-out, rounded to 2 decimals.
pub fn compute_working_hours(punch_in: DateTime<Utc>, punch_out: DateTime<Utc>) -> f64 {
    let millis = (punch_out - punch_in).num_milliseconds() as f64;
    round2(millis / MILLIS_PER_HOUR)
}

/// Whole minutes of a lunch break, rounded to the nearest minute.
pub fn lunch_duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds() as f64;
    (millis / MILLIS_PER_MINUTE).round() as i64
}

/// Working hours less lunch, floored at zero. `None` when no hours are stored.
pub fn net_working_hours(working_hours: Option<f64>, total_lunch_minutes: i64) -> Option<f64> {
    let hours = working_hours?;
    if total_lunch_minutes > 0 {
        Some((hours - total_lunch_minutes as f64 / 60.0).max(0.0))
    } else {
        Some(hours)
    }
}
