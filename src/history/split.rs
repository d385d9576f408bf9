use crate::domain::span_seconds;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};

/// History aggregation key: the local calendar date as "YYYY-MM-DD".
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The first instant of a local calendar day. A DST jump can make midnight
/// nonexistent or ambiguous; the earliest valid instant wins.
pub fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    let mut naive = date.and_time(NaiveTime::MIN);
    loop {
        if let Some(dt) = Local.from_local_datetime(&naive).earliest() {
            return dt;
        }
        naive += Duration::hours(1);
    }
}

/// Split a closed `[start, end)` interval into per-calendar-day second
/// counts, walking forward one local midnight at a time. An interval that
/// straddles midnight yields exactly one segment per day touched; zero or
/// negative spans yield nothing.
pub fn split_interval(start: DateTime<Local>, end: DateTime<Local>) -> Vec<(String, f64)> {
    let mut segments = Vec::new();
    if end <= start {
        return segments;
    }

    let mut cursor = start;
    while cursor < end {
        let boundary = local_midnight(cursor.date_naive() + Duration::days(1));
        let segment_end = boundary.min(end);
        if segment_end <= cursor {
            break;
        }
        let seconds = span_seconds(cursor, segment_end);
        if seconds > 0.0 {
            segments.push((day_key(cursor.date_naive()), seconds));
        }
        cursor = segment_end;
    }
    segments
}
