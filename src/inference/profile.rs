//! Descriptive profile labels: work rhythm, focus balance and viewer personality.

use crate::models::{FactDailyProductivity, FactGenreStats};
use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A top category above this share of total hours is an imbalance.
pub const IMBALANCE_THRESHOLD_PERCENT: f64 = 50.0;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Productivity type derived from the best weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmType {
    WeekendWarrior,
    MondayStarter,
    MidWeekGrinder,
}

impl RhythmType {
    pub fn from_weekday(day: Weekday) -> Self {
        match day {
            Weekday::Sat | Weekday::Sun => RhythmType::WeekendWarrior,
            Weekday::Mon => RhythmType::MondayStarter,
            Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri => {
                RhythmType::MidWeekGrinder
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RhythmType::WeekendWarrior => "Weekend Warrior",
            RhythmType::MondayStarter => "Monday Starter",
            RhythmType::MidWeekGrinder => "Mid-Week Grinder",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RhythmType::WeekendWarrior => "Unique! You are most productive when others are resting.",
            RhythmType::MondayStarter => "Great, you start the week with maximum energy!",
            RhythmType::MidWeekGrinder => "Your energy peaks in the middle of the week.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayAverage {
    pub day: String,
    pub average_hours: f64,
}

/// Weekly energy rhythm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhythmProfile {
    pub rhythm: RhythmType,
    pub label: String,
    pub best_day: String,
    pub best_day_average: f64,
    pub message: String,
    /// Mean hours per fact row for every weekday, Monday first. Days never seen are 0.
    pub weekdays: Vec<WeekdayAverage>,
}

/// Best weekday by mean `total_hours` over the (date, category) rows falling
/// on it. Ties go to the earlier weekday.
pub fn rhythm_profile(fact: &[FactDailyProductivity]) -> Option<RhythmProfile> {
    if fact.is_empty() {
        return None;
    }

    let mut sums: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
    for row in fact {
        let entry = sums
            .entry(row.date.weekday().num_days_from_monday())
            .or_insert((0.0, 0));
        entry.0 += row.total_hours;
        entry.1 += 1;
    }

    let averages: Vec<(Weekday, f64)> = WEEK
        .iter()
        .map(|&wd| {
            let avg = sums
                .get(&wd.num_days_from_monday())
                .map(|(sum, count)| sum / *count as f64)
                .unwrap_or(0.0);
            (wd, avg)
        })
        .collect();

    let (best_day, best_day_average) = averages
        .iter()
        .copied()
        .fold(None, |best: Option<(Weekday, f64)>, (wd, avg)| match best {
            Some((_, best_avg)) if best_avg >= avg => best,
            _ => Some((wd, avg)),
        })?;

    let rhythm = RhythmType::from_weekday(best_day);
    Some(RhythmProfile {
        rhythm,
        label: rhythm.label().to_string(),
        best_day: day_name(best_day).to_string(),
        best_day_average,
        message: rhythm.message().to_string(),
        weekdays: averages
            .into_iter()
            .map(|(wd, average_hours)| WeekdayAverage {
                day: day_name(wd).to_string(),
                average_hours,
            })
            .collect(),
    })
}

/// Share of time spent on the dominant category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusProfile {
    pub top_category: String,
    pub top_category_hours: f64,
    pub share_percent: f64,
    pub balanced: bool,
    pub message: String,
}

pub fn focus_profile(fact: &[FactDailyProductivity]) -> Option<FocusProfile> {
    let mut hours_by_category: BTreeMap<&str, f64> = BTreeMap::new();
    for row in fact {
        *hours_by_category.entry(row.category.as_str()).or_insert(0.0) += row.total_hours;
    }

    // BTreeMap iterates alphabetically, so the first maximum wins ties
    let (top_category, top_category_hours) = hours_by_category.iter().fold(
        None,
        |best: Option<(&str, f64)>, (&category, &hours)| match best {
            Some((_, best_hours)) if best_hours >= hours => best,
            _ => Some((category, hours)),
        },
    )?;

    let total: f64 = hours_by_category.values().sum();
    let share_percent = if total > 0.0 {
        top_category_hours / total * 100.0
    } else {
        0.0
    };
    let balanced = share_percent <= IMBALANCE_THRESHOLD_PERCENT;

    let message = if balanced {
        format!(
            "Balanced: Your top category ({}) consumes {:.0}% of your time.",
            top_category, share_percent
        )
    } else {
        format!(
            "Imbalance Warning: {:.0}% of your time is spent solely on {}. Consider diversifying your activities.",
            share_percent, top_category
        )
    };

    Some(FocusProfile {
        top_category: top_category.to_string(),
        top_category_hours,
        share_percent,
        balanced,
        message,
    })
}

/// Viewer personality derived from the most watched genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerProfile {
    pub favorite_genre: String,
    pub total_watched: u64,
    pub personality: String,
    pub taste: String,
}

pub fn personality(genre: &str) -> String {
    match genre {
        "Action" => "Adrenaline Junkie".to_string(),
        "Comedy" => "Laugh Seeker".to_string(),
        "Drama" => "The Melancholic".to_string(),
        "Horror" => "The Brave".to_string(),
        "Sci-Fi" => "Future Visionary".to_string(),
        "Romance" => "True Romantic".to_string(),
        other => format!("{} Enthusiast", other),
    }
}

fn taste(genre: &str) -> String {
    let kind = match genre {
        "Action" => "fast-paced, intense, and stimulating".to_string(),
        "Comedy" => "lighthearted and stress-relieving".to_string(),
        "Drama" => "deep and emotionally engaging".to_string(),
        other => format!("specifically aligned with {} themes", other),
    };
    format!(
        "The {} genre dominates your watch history. You seek entertainment that is {}.",
        genre, kind
    )
}

pub fn viewer_profile(stats: &[FactGenreStats]) -> Option<ViewerProfile> {
    let top = stats.iter().reduce(|best, row| {
        if row.total_watched > best.total_watched
            || (row.total_watched == best.total_watched && row.genre_name < best.genre_name)
        {
            row
        } else {
            best
        }
    })?;

    Some(ViewerProfile {
        favorite_genre: top.genre_name.clone(),
        total_watched: top.total_watched,
        personality: personality(&top.genre_name),
        taste: taste(&top.genre_name),
    })
}
