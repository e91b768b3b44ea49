//! Cleaning stage: bronze records to canonical silver rows.
//!
//! Cleaning is permissive. A record that fails type coercion is dropped and
//! counted, never raised, so one bad row cannot abort a source.

mod calendar;
mod history;
mod movies;
mod tasks;

pub use calendar::{flatten_calendar, parse_boundary};
pub use history::clean_watch_history;
pub use movies::project_movies;
pub use tasks::{clean_tasks, parse_deadline, parse_estimation, parse_progress};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Rows that survived cleaning plus the number of records dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned<T> {
    pub rows: Vec<T>,
    pub dropped: usize,
}

impl<T> Cleaned<T> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            dropped: 0,
        }
    }

    /// Count a dropped record and log why.
    fn drop_record(&mut self, source: &str, index: usize, reason: &str) {
        self.dropped += 1;
        tracing::warn!(source, index, reason, "record dropped");
    }
}

/// Decode one raw record into its bronze contract type.
fn decode<T: DeserializeOwned>(value: Value) -> std::result::Result<T, String> {
    serde_json::from_value(value).map_err(|e| format!("malformed record: {}", e))
}
