//! Data models for Lifelens entities.
//!
//! This module defines the records that flow through the pipeline layers:
//! - Bronze: `RawWatchRecord`, `RawTaskRecord`, `RawCalendarEvent`, `RawMovieRecord`
//! - Silver: `CanonicalWatchRecord`, `CanonicalTaskRecord`, `CanonicalCalendarRecord`,
//!   `CanonicalMovieRecord`
//! - Gold: `FactDailyProductivity`, `FactGenreStats`
//!
//! `ActivityEvent` is the aggregation-stage intermediate and is never persisted.

pub mod genre;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use genre::{canonicalize_genres, title_case};

/// Category assigned to every calendar-derived activity.
pub const CALENDAR_CATEGORY: &str = "Calendar Activity";

/// The only category whose workload may be spread across study sessions.
pub const ACADEMIC_CATEGORY: &str = "Academic";

/// Title used for calendar events that carry no summary.
pub const DEFAULT_EVENT_TITLE: &str = "No Title";

/// Category used for task rows that carry no category at all.
pub const DEFAULT_CATEGORY: &str = "General";

/// Deserializers for loosely typed spreadsheet and API exports.
pub mod loose {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept strings, numbers and booleans as an optional string.
    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(other) => Some(other.to_string()),
        })
    }
}

// === Bronze ===

/// A watch-history row as exported from the document database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWatchRecord {
    #[serde(default, alias = "Nama Film", deserialize_with = "loose::string")]
    pub title: Option<String>,

    /// Free-text genre list, possibly mixed-language and mixed-case
    #[serde(default, alias = "Genre", deserialize_with = "loose::string")]
    pub genre: Option<String>,
}

/// A task row as exported from the task spreadsheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTaskRecord {
    #[serde(default, alias = "Nama Tugas", deserialize_with = "loose::string")]
    pub task_name: Option<String>,

    /// Estimated effort in hours, e.g. "12"
    #[serde(
        default,
        alias = "Estimasi (jam)",
        alias = "estimation_string",
        deserialize_with = "loose::string"
    )]
    pub estimation: Option<String>,

    /// Progress as a fraction or percentage, e.g. "0.4" or "40%"
    #[serde(
        default,
        alias = "Progress ",
        alias = "Progress",
        alias = "progress_string",
        deserialize_with = "loose::string"
    )]
    pub progress: Option<String>,

    /// Deadline in day-first notation, e.g. "25/12/2024"
    #[serde(
        default,
        alias = "Deadline",
        alias = "deadline_string",
        deserialize_with = "loose::string"
    )]
    pub deadline: Option<String>,

    #[serde(
        default,
        alias = "Kategori",
        alias = "category_string",
        deserialize_with = "loose::string"
    )]
    pub category: Option<String>,

    #[serde(
        default,
        alias = "Tipe Beban",
        alias = "load_type_string",
        deserialize_with = "loose::string"
    )]
    pub load_type: Option<String>,
}

/// One boundary of a calendar event: a timed `dateTime` or an all-day `date`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBoundary {
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventBoundary {
    /// The timed value if present, otherwise the all-day date.
    pub fn coalesce(&self) -> Option<&str> {
        self.date_time
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.date.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

/// A calendar event as returned by the calendar API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCalendarEvent {
    #[serde(default, deserialize_with = "loose::string")]
    pub summary: Option<String>,

    #[serde(default)]
    pub start: Option<EventBoundary>,

    #[serde(default)]
    pub end: Option<EventBoundary>,
}

/// A movie-catalog entry of arbitrary shape.
pub type RawMovieRecord = serde_json::Map<String, serde_json::Value>;

// === Silver ===

/// A deduplicated watch-history title with its canonical genre string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalWatchRecord {
    pub title: String,

    /// Canonical genres, sorted and joined with ", "
    pub genres: String,
}

impl CanonicalWatchRecord {
    /// Split the canonical genre string back into individual genres.
    pub fn genre_list(&self) -> Vec<&str> {
        self.genres
            .split(", ")
            .filter(|g| !g.is_empty())
            .collect()
    }
}

/// How a task's effort is booked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadType {
    /// Booked entirely on the deadline
    #[default]
    Session,
    /// Divisible into daily sessions leading up to the deadline
    Spread,
}

impl LoadType {
    /// Parse a raw load-type label. Anything not recognized as spread is a session.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "spread" | "dicicil" | "cicil" => LoadType::Spread,
            _ => LoadType::Session,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadType::Session => "Session",
            LoadType::Spread => "Spread",
        }
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cleaned task row. Only rows with a deadline and positive hours exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTaskRecord {
    pub task_name: String,
    pub estimation_hours: f64,
    /// Fraction complete in [0, 1]
    pub progress: f64,
    pub deadline: NaiveDate,
    pub category: String,
    pub load_type: LoadType,
}

/// A flattened calendar event with UTC boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCalendarRecord {
    pub event_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl CanonicalCalendarRecord {
    /// Signed duration in hours. Negative when the event is malformed.
    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_seconds() as f64 / 3600.0
    }
}

/// A projected movie-catalog row. Every column is nullable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMovieRecord {
    pub id: Option<i64>,
    pub title: Option<String>,
    /// Genre id list serialized as a string, e.g. "[28,12]"
    pub genre_ids: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub overview: Option<String>,
}

#[cfg(test)]
impl CanonicalMovieRecord {
    /// Decode the serialized genre id list. Unreadable values yield an empty list.
    pub fn genre_id_list(&self) -> Vec<i64> {
        self.genre_ids
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<i64>>(s).ok())
            .unwrap_or_default()
    }
}

// === Gold ===

/// Where an activity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    Calendar,
    TaskList,
}

/// One dated unit of effort, produced from a calendar event or a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub date: NaiveDate,
    pub title: String,
    pub duration_hours: f64,
    pub category: String,
    pub source: ActivitySource,
}

/// Hours and activity count per (date, category).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactDailyProductivity {
    pub date: NaiveDate,
    pub category: String,
    pub total_hours: f64,
    pub total_activities: u64,
}

/// Number of watched titles carrying a genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactGenreStats {
    pub genre_name: String,
    pub total_watched: u64,
}
