//! Rule-based inference over the gold tables.
//!
//! Nothing here is persisted. Every view is recomputed from the fact tables
//! on each render, and the only mutable state is the
//! [`RecommendationSession`] owned by the caller.

pub mod decision;
pub mod profile;
pub mod session;
pub mod trend;
pub mod views;

pub use decision::{MovieFilter, PermissionRule, Verdict, WorkStrategy, permission_rule, work_strategy};
pub use profile::{FocusProfile, RhythmProfile, RhythmType, ViewerProfile};
pub use session::{MovieCard, Recommendation, RecommendationSession};
pub use trend::{Forecast, TrendState};
pub use views::{ActionPlan, Dashboard, Diagnosis, ForecastSummary, Report, ViewData};

use crate::models::FactDailyProductivity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hours and activities for one date, summed over all categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_hours: f64,
    pub total_activities: u64,
}

/// Collapse the fact table to one total per date, ascending.
pub fn daily_totals(fact: &[FactDailyProductivity]) -> Vec<DailyTotal> {
    let mut by_date: BTreeMap<NaiveDate, (f64, u64)> = BTreeMap::new();
    for row in fact {
        let entry = by_date.entry(row.date).or_insert((0.0, 0));
        entry.0 += row.total_hours;
        entry.1 += row.total_activities;
    }

    by_date
        .into_iter()
        .map(|(date, (total_hours, total_activities))| DailyTotal {
            date,
            total_hours,
            total_activities,
        })
        .collect()
}
