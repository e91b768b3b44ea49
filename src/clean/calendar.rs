use super::{Cleaned, decode};
use crate::models::{CanonicalCalendarRecord, DEFAULT_EVENT_TITLE, RawCalendarEvent};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Parse an event boundary to UTC.
///
/// Timed values carry an offset (`2025-01-06T09:00:00+07:00`). All-day values
/// are plain dates and become midnight UTC. Offset-less timestamps are read as UTC.
pub fn parse_boundary(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Flatten nested calendar events into UTC-normalized rows.
pub fn flatten_calendar(records: Vec<Value>) -> Cleaned<CanonicalCalendarRecord> {
    let mut cleaned = Cleaned::new();

    for (index, value) in records.into_iter().enumerate() {
        let raw: RawCalendarEvent = match decode(value) {
            Ok(raw) => raw,
            Err(reason) => {
                cleaned.drop_record("calendar", index, &reason);
                continue;
            }
        };

        let start = raw.start.as_ref().and_then(|b| b.coalesce()).and_then(parse_boundary);
        let end = raw.end.as_ref().and_then(|b| b.coalesce()).and_then(parse_boundary);
        let (Some(start_time), Some(end_time)) = (start, end) else {
            cleaned.drop_record("calendar", index, "start or end is missing or unparseable");
            continue;
        };

        let event_title = match raw.summary.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => DEFAULT_EVENT_TITLE.to_string(),
        };

        cleaned.rows.push(CanonicalCalendarRecord {
            event_title,
            start_time,
            end_time,
        });
    }

    cleaned
}
