use super::Cleaned;
use crate::models::{CanonicalMovieRecord, RawMovieRecord};
use chrono::NaiveDate;
use serde_json::Value;

fn as_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Genre ids are stored in their serialized form, e.g. `[28,12]`.
fn genre_ids_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn project(record: &RawMovieRecord) -> CanonicalMovieRecord {
    CanonicalMovieRecord {
        id: as_i64(record.get("id")),
        title: as_string(record.get("title")),
        genre_ids: genre_ids_string(record.get("genre_ids")),
        vote_average: as_f64(record.get("vote_average")),
        popularity: as_f64(record.get("popularity")),
        release_date: as_string(record.get("release_date"))
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()),
        overview: as_string(record.get("overview")),
    }
}

/// Project movie-catalog objects onto the fixed movie columns.
///
/// Missing columns become null. Only non-object records are dropped.
pub fn project_movies(records: Vec<Value>) -> Cleaned<CanonicalMovieRecord> {
    let mut cleaned = Cleaned::new();

    for (index, value) in records.into_iter().enumerate() {
        match value {
            Value::Object(record) => cleaned.rows.push(project(&record)),
            _ => cleaned.drop_record("movies", index, "record is not an object"),
        }
    }

    cleaned
}
