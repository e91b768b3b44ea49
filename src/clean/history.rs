use super::{Cleaned, decode};
use crate::models::{CanonicalWatchRecord, RawWatchRecord, canonicalize_genres};
use serde_json::Value;
use std::collections::HashSet;

/// Clean watch history: drop untitled records, dedupe by title (first wins),
/// canonicalize genres.
pub fn clean_watch_history(records: Vec<Value>) -> Cleaned<CanonicalWatchRecord> {
    let mut cleaned = Cleaned::new();
    let mut seen = HashSet::new();

    for (index, value) in records.into_iter().enumerate() {
        let raw: RawWatchRecord = match decode(value) {
            Ok(raw) => raw,
            Err(reason) => {
                cleaned.drop_record("history", index, &reason);
                continue;
            }
        };

        let title = match raw.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                cleaned.drop_record("history", index, "missing title");
                continue;
            }
        };

        if !seen.insert(title.clone()) {
            tracing::debug!(title = %title, "duplicate title skipped");
            continue;
        }

        cleaned.rows.push(CanonicalWatchRecord {
            title,
            genres: canonicalize_genres(raw.genre.as_deref()),
        });
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dedupes_by_title_keeping_first() {
        let cleaned = clean_watch_history(vec![
            json!({"Nama Film": "Parasite", "Genre": "Drama, thriller"}),
            json!({"Nama Film": "Parasite", "Genre": "Komedi"}),
            json!({"title": "Coco", "genre": "animasi, keluarga"}),
        ]);

        assert_eq!(cleaned.dropped, 0);
        assert_eq!(cleaned.rows.len(), 2);
        assert_eq!(cleaned.rows[0].genres, "Drama, Thriller");
        assert_eq!(cleaned.rows[1].genres, "Animation, Family");
    }

    #[test]
    fn test_untitled_and_malformed_records_are_dropped() {
        let cleaned = clean_watch_history(vec![
            json!({"genre": "Drama"}),
            json!({"title": "   "}),
            json!("not an object"),
            json!({"title": "Her"}),
        ]);

        assert_eq!(cleaned.dropped, 3);
        assert_eq!(cleaned.rows.len(), 1);
        assert_eq!(cleaned.rows[0].genres, "Unknown");
    }
}
