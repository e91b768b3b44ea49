//! Trend classification over recent daily totals.

use super::DailyTotal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of most recent days the trend looks at.
pub const TREND_WINDOW: usize = 3;

/// Boost applied to the recent average when the trend is rising.
pub const RISING_BOOST: f64 = 1.1;

/// The last day counts as a sharp drop below this share of the recent average.
pub const SHARP_DROP_RATIO: f64 = 0.5;

/// Direction of recent productivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendState {
    Rising,
    SharpDrop,
    Stable,
}

impl TrendState {
    pub const ALL: [TrendState; 3] = [TrendState::Rising, TrendState::SharpDrop, TrendState::Stable];

    pub fn label(&self) -> &'static str {
        match self {
            TrendState::Rising => "RISING TREND",
            TrendState::SharpDrop => "SHARP DROP",
            TrendState::Stable => "STABLE",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            TrendState::Rising => {
                "You are in a positive momentum! Tomorrow's productivity is likely to remain high."
            }
            TrendState::SharpDrop => {
                "Significant energy drop detected. Tomorrow is predicted to be a recovery phase (rebound)."
            }
            TrendState::Stable => {
                "Your rhythm is stable. Tomorrow is predicted to proceed normally like your daily average."
            }
        }
    }
}

impl fmt::Display for TrendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Tomorrow's predicted output and the trend it is based on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub state: TrendState,
    /// Most recent day in the history, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    pub last_hours: f64,
    pub recent_average: f64,
    pub predicted_hours: f64,
    /// How many days fed the recent average (at most three)
    pub days_considered: usize,
}

/// Classify a history of daily totals given most recent first.
///
/// Returns `None` for an empty history. Fewer than three days use what exists.
pub fn classify(recent_first: &[f64]) -> Option<Forecast> {
    let window = &recent_first[..recent_first.len().min(TREND_WINDOW)];
    let last_hours = *window.first()?;
    let recent_average = window.iter().sum::<f64>() / window.len() as f64;

    let state = if last_hours > recent_average {
        TrendState::Rising
    } else if last_hours < recent_average * SHARP_DROP_RATIO {
        TrendState::SharpDrop
    } else {
        TrendState::Stable
    };

    let predicted_hours = match state {
        TrendState::Rising => recent_average * RISING_BOOST,
        TrendState::SharpDrop | TrendState::Stable => recent_average,
    };

    Some(Forecast {
        state,
        as_of: None,
        last_hours,
        recent_average,
        predicted_hours,
        days_considered: window.len(),
    })
}

/// Forecast from per-day totals in ascending date order.
pub fn forecast(daily: &[DailyTotal]) -> Option<Forecast> {
    let recent_first: Vec<f64> = daily.iter().rev().map(|d| d.total_hours).collect();
    let mut forecast = classify(&recent_first)?;
    forecast.as_of = daily.last().map(|d| d.date);
    Some(forecast)
}
