//! Aggregation stage: silver tables to gold fact tables.
//!
//! Calendar events and tasks are first turned into [`ActivityEvent`]s, then
//! grouped by (date, category) into [`FactDailyProductivity`]. Watch history
//! is exploded by genre into [`FactGenreStats`].

mod spread;

pub use spread::{SPREAD_SUFFIX, is_spreadable, task_activities, window_days};

use crate::models::{
    ActivityEvent, ActivitySource, CALENDAR_CATEGORY, CanonicalCalendarRecord,
    CanonicalTaskRecord, CanonicalWatchRecord, FactDailyProductivity, FactGenreStats,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

/// One activity per calendar event, dated by its UTC start.
///
/// An event that ends before it starts contributes zero hours.
pub fn calendar_activities(events: &[CanonicalCalendarRecord]) -> Vec<ActivityEvent> {
    events
        .iter()
        .map(|event| {
            let mut duration_hours = event.duration_hours();
            if duration_hours < 0.0 {
                tracing::warn!(
                    title = %event.event_title,
                    start = %event.start_time,
                    end = %event.end_time,
                    "calendar event ends before it starts, counting zero hours"
                );
                duration_hours = 0.0;
            }
            ActivityEvent {
                date: event.start_time.date_naive(),
                title: event.event_title.clone(),
                duration_hours,
                category: CALENDAR_CATEGORY.to_string(),
                source: ActivitySource::Calendar,
            }
        })
        .collect()
}

/// Activities for every task, spreading eligible ones.
pub fn all_task_activities(tasks: &[CanonicalTaskRecord]) -> Vec<ActivityEvent> {
    tasks.iter().flat_map(task_activities).collect()
}

/// Group activities by (date, category), ordered by date then category.
pub fn summarize_activities(
    activities: impl IntoIterator<Item = ActivityEvent>,
) -> Vec<FactDailyProductivity> {
    let mut groups: BTreeMap<(NaiveDate, String), (f64, u64)> = BTreeMap::new();
    for activity in activities {
        let entry = groups
            .entry((activity.date, activity.category))
            .or_insert((0.0, 0));
        entry.0 += activity.duration_hours;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(
            |((date, category), (total_hours, total_activities))| FactDailyProductivity {
                date,
                category,
                total_hours,
                total_activities,
            },
        )
        .collect()
}

/// Build the daily productivity fact from whichever inputs are available.
pub fn build_daily_productivity(
    calendar: Option<&[CanonicalCalendarRecord]>,
    tasks: Option<&[CanonicalTaskRecord]>,
) -> Vec<FactDailyProductivity> {
    let mut activities = Vec::new();
    if let Some(events) = calendar {
        activities.extend(calendar_activities(events));
    }
    if let Some(tasks) = tasks {
        activities.extend(all_task_activities(tasks));
    }
    tracing::debug!(activities = activities.len(), "activities collected");
    summarize_activities(activities)
}

/// Count distinct titles per genre, most watched first, ties by name.
pub fn build_genre_stats(history: &[CanonicalWatchRecord]) -> Vec<FactGenreStats> {
    let mut titles_by_genre: HashMap<&str, HashSet<&str>> = HashMap::new();
    for record in history {
        for genre in record.genre_list() {
            titles_by_genre
                .entry(genre)
                .or_default()
                .insert(record.title.as_str());
        }
    }

    let mut stats: Vec<FactGenreStats> = titles_by_genre
        .into_iter()
        .map(|(genre, titles)| FactGenreStats {
            genre_name: genre.to_string(),
            total_watched: titles.len() as u64,
        })
        .collect();
    stats.sort_by(|a, b| {
        b.total_watched
            .cmp(&a.total_watched)
            .then_with(|| a.genre_name.cmp(&b.genre_name))
    });
    stats
}
