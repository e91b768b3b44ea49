use super::{Cleaned, decode};
use crate::models::{
    CanonicalTaskRecord, DEFAULT_CATEGORY, LoadType, RawTaskRecord, title_case,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Day-first date layouts accepted for deadlines, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse an estimation in hours. Anything non-numeric is 0, so "12%" is 0.
pub fn parse_estimation(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|h| h.is_finite())
        .unwrap_or(0.0)
}

/// Parse progress as a fraction in [0, 1].
///
/// A trailing `%` is stripped and values above 1 are read as percentages.
/// Unparseable input is 0.
pub fn parse_progress(raw: Option<&str>) -> f64 {
    let Some(value) = raw
        .map(|s| s.replace('%', ""))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite())
    else {
        return 0.0;
    };

    let fraction = if value > 1.0 { value / 100.0 } else { value };
    fraction.clamp(0.0, 1.0)
}

/// Parse a day-first deadline. Returns `None` when no layout matches.
pub fn parse_deadline(raw: Option<&str>) -> Option<NaiveDate> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn clean_category(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(c) if !c.is_empty() => title_case(c),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

/// Clean task rows. Rows without a parseable deadline or with non-positive
/// hours are dropped.
pub fn clean_tasks(records: Vec<Value>) -> Cleaned<CanonicalTaskRecord> {
    let mut cleaned = Cleaned::new();

    for (index, value) in records.into_iter().enumerate() {
        let raw: RawTaskRecord = match decode(value) {
            Ok(raw) => raw,
            Err(reason) => {
                cleaned.drop_record("tasks", index, &reason);
                continue;
            }
        };

        let estimation_hours = parse_estimation(raw.estimation.as_deref());
        if estimation_hours <= 0.0 {
            cleaned.drop_record("tasks", index, "estimation is not a positive number of hours");
            continue;
        }

        let Some(deadline) = parse_deadline(raw.deadline.as_deref()) else {
            cleaned.drop_record("tasks", index, "deadline is missing or unparseable");
            continue;
        };

        cleaned.rows.push(CanonicalTaskRecord {
            task_name: raw.task_name.unwrap_or_default().trim().to_string(),
            estimation_hours,
            progress: parse_progress(raw.progress.as_deref()),
            deadline,
            category: clean_category(raw.category.as_deref()),
            load_type: LoadType::parse(raw.load_type.as_deref().unwrap_or_default()),
        });
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_estimation() {
        assert_eq!(parse_estimation(Some("12")), 12.0);
        assert_eq!(parse_estimation(Some(" 2.5 ")), 2.5);
        assert_eq!(parse_estimation(Some("12%")), 0.0);
        assert_eq!(parse_estimation(Some("abc")), 0.0);
        assert_eq!(parse_estimation(None), 0.0);
    }

    #[test]
    fn test_parse_progress() {
        assert_eq!(parse_progress(Some("40%")), 0.4);
        assert_eq!(parse_progress(Some("0.25")), 0.25);
        assert_eq!(parse_progress(Some("75")), 0.75);
        assert_eq!(parse_progress(Some("1")), 1.0);
        assert_eq!(parse_progress(Some("done")), 0.0);
        assert_eq!(parse_progress(None), 0.0);
    }

    #[test]
    fn test_parse_deadline_is_day_first() {
        let christmas = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(parse_deadline(Some("25/12/2024")), Some(christmas));
        assert_eq!(parse_deadline(Some("25-12-2024")), Some(christmas));
        assert_eq!(parse_deadline(Some("25/12/24")), Some(christmas));
        assert_eq!(parse_deadline(Some("2024-12-25")), Some(christmas));
        assert_eq!(parse_deadline(Some("25 December 2024")), Some(christmas));
        assert_eq!(parse_deadline(Some("25/12/2024 17:00")), Some(christmas));

        // 03/04 is the 3rd of April, not March 4th
        assert_eq!(
            parse_deadline(Some("03/04/2025")),
            NaiveDate::from_ymd_opt(2025, 4, 3)
        );
    }

    #[test]
    fn test_parse_deadline_rejects_garbage() {
        assert_eq!(parse_deadline(Some("next friday")), None);
        assert_eq!(parse_deadline(Some("31/02/2025")), None);
        assert_eq!(parse_deadline(Some("")), None);
        assert_eq!(parse_deadline(None), None);
    }

    #[test]
    fn test_clean_tasks_normalizes_fields() {
        let cleaned = clean_tasks(vec![json!({
            "Nama Tugas": "Thesis draft",
            "Estimasi (jam)": "90",
            "Progress ": "40%",
            "Deadline": "20/01/2025",
            "Kategori": " academic ",
            "Tipe Beban": "Dicicil"
        })]);

        assert_eq!(cleaned.dropped, 0);
        let task = &cleaned.rows[0];
        assert_eq!(task.task_name, "Thesis draft");
        assert_eq!(task.estimation_hours, 90.0);
        assert_eq!(task.progress, 0.4);
        assert_eq!(task.deadline, NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
        assert_eq!(task.category, "Academic");
        assert_eq!(task.load_type, LoadType::Spread);
    }

    #[test]
    fn test_clean_tasks_drops_invalid_rows() {
        let cleaned = clean_tasks(vec![
            json!({"task_name": "no hours", "estimation": "0", "deadline": "01/02/2025"}),
            json!({"task_name": "negative", "estimation": -3, "deadline": "01/02/2025"}),
            json!({"task_name": "percent", "estimation": "12%", "deadline": "01/02/2025"}),
            json!({"task_name": "bad date", "estimation": "4", "deadline": "soon"}),
            json!({"task_name": "no date", "estimation": "4"}),
            json!({"task_name": "ok", "estimation": 4, "deadline": "01/02/2025"}),
        ]);

        assert_eq!(cleaned.dropped, 5);
        assert_eq!(cleaned.rows.len(), 1);
        assert_eq!(cleaned.rows[0].task_name, "ok");
        assert_eq!(cleaned.rows[0].category, "General");
        assert_eq!(cleaned.rows[0].load_type, LoadType::Session);
    }
}
