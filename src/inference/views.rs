//! The four dashboard views: report, diagnosis, forecast and action.

use super::decision::{PermissionRule, WorkStrategy, permission_rule, work_strategy};
use super::profile::{
    FocusProfile, RhythmProfile, ViewerProfile, focus_profile, rhythm_profile, viewer_profile,
};
use super::session::{Recommendation, RecommendationSession};
use super::trend::{self, Forecast, TrendState};
use super::{DailyTotal, daily_totals};
use crate::models::{CanonicalMovieRecord, FactDailyProductivity, FactGenreStats};
use crate::storage::{Artifact, Lakehouse};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

const NO_PRODUCTIVITY: &str =
    "Insufficient data: no productivity facts yet. Run `lens run` after ingesting tasks or calendar events.";
const NO_GENRES: &str = "Insufficient data: no genre facts yet for profiling.";
const NO_MOVIES: &str = "Insufficient data: no movie catalog yet. Ingest movies and run `lens run`.";

/// A view's content, or the reason it cannot be shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewData<T> {
    Ready(T),
    InsufficientData { reason: String },
}

impl<T> ViewData<T> {
    fn from_option(value: Option<T>, reason: &str) -> Self {
        match value {
            Some(v) => ViewData::Ready(v),
            None => ViewData::InsufficientData {
                reason: reason.to_string(),
            },
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewData::Ready(v) => Some(v),
            ViewData::InsufficientData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_hours: f64,
    pub total_activities: u64,
}

/// Historical totals and the daily timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total_hours: f64,
    pub total_activities: u64,
    pub days: usize,
    pub categories: Vec<CategoryTotal>,
    pub timeline: Vec<DailyTotal>,
}

/// Habit patterns. Each part degrades on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub rhythm: ViewData<RhythmProfile>,
    pub focus: ViewData<FocusProfile>,
    pub viewer: ViewData<ViewerProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    #[serde(flatten)]
    pub forecast: Forecast,
    pub label: &'static str,
    pub message: &'static str,
}

/// Work strategy, entertainment permission and the current recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPlan {
    pub state: TrendState,
    pub strategy: WorkStrategy,
    pub permission: PermissionRule,
    pub override_active: bool,
    pub recommendation: ViewData<Recommendation>,
}

/// The gold tables a dashboard renders from. Absent tables are `None`.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub productivity: Option<Vec<FactDailyProductivity>>,
    pub genres: Option<Vec<FactGenreStats>>,
    pub movies: Option<Vec<CanonicalMovieRecord>>,
}

fn optional<T>(result: Result<Vec<T>>) -> Result<Option<Vec<T>>> {
    match result {
        Ok(rows) if rows.is_empty() => Ok(None),
        Ok(rows) => Ok(Some(rows)),
        Err(Error::MissingArtifact(name)) => {
            tracing::info!(artifact = %name, "artifact not built yet");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl Dashboard {
    /// Load the fact tables and the movie catalog. Missing tables are tolerated.
    pub fn load(lake: &Lakehouse) -> Result<Self> {
        Ok(Self {
            productivity: optional(lake.read_table(Artifact::FactDailyProductivity))?,
            genres: optional(lake.read_table(Artifact::FactGenreStats))?,
            movies: optional(lake.read_table(Artifact::DimMovies))?,
        })
    }

    fn daily(&self) -> Option<Vec<DailyTotal>> {
        self.productivity.as_deref().map(daily_totals)
    }

    /// Current trend, if there is any productivity history.
    pub fn trend(&self) -> Option<Forecast> {
        trend::forecast(&self.daily()?)
    }

    pub fn report(&self) -> ViewData<Report> {
        let report = self.productivity.as_deref().map(|fact| {
            let mut by_category: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
            for row in fact {
                let entry = by_category.entry(row.category.as_str()).or_insert((0.0, 0));
                entry.0 += row.total_hours;
                entry.1 += row.total_activities;
            }
            let timeline = daily_totals(fact);

            Report {
                total_hours: fact.iter().map(|r| r.total_hours).sum(),
                total_activities: fact.iter().map(|r| r.total_activities).sum(),
                days: timeline.len(),
                categories: by_category
                    .into_iter()
                    .map(|(category, (total_hours, total_activities))| CategoryTotal {
                        category: category.to_string(),
                        total_hours,
                        total_activities,
                    })
                    .collect(),
                timeline,
            }
        });
        ViewData::from_option(report, NO_PRODUCTIVITY)
    }

    pub fn diagnosis(&self) -> Diagnosis {
        Diagnosis {
            rhythm: ViewData::from_option(
                self.productivity.as_deref().and_then(rhythm_profile),
                NO_PRODUCTIVITY,
            ),
            focus: ViewData::from_option(
                self.productivity.as_deref().and_then(focus_profile),
                NO_PRODUCTIVITY,
            ),
            viewer: ViewData::from_option(
                self.genres.as_deref().and_then(viewer_profile),
                NO_GENRES,
            ),
        }
    }

    pub fn forecast(&self) -> ViewData<ForecastSummary> {
        let summary = self.trend().map(|forecast| ForecastSummary {
            label: forecast.state.label(),
            message: forecast.state.message(),
            forecast,
        });
        ViewData::from_option(summary, NO_PRODUCTIVITY)
    }

    pub fn action(&self, session: &RecommendationSession) -> ViewData<ActionPlan> {
        let plan = self.trend().map(|forecast| {
            let state = forecast.state;
            let recommendation = match (&self.movies, session.active_filter(state)) {
                (None, Some(_)) => ViewData::InsufficientData {
                    reason: NO_MOVIES.to_string(),
                },
                (movies, _) => ViewData::Ready(
                    session.recommend(state, movies.as_deref().unwrap_or_default()),
                ),
            };

            ActionPlan {
                state,
                strategy: work_strategy(state),
                permission: permission_rule(state),
                override_active: session.override_acknowledged,
                recommendation,
            }
        });
        ViewData::from_option(plan, NO_PRODUCTIVITY)
    }

    /// Title of the movie currently recommended, if any.
    pub fn current_pick(&self, session: &RecommendationSession) -> Option<String> {
        let state = self.trend()?.state;
        match session.recommend(state, self.movies.as_deref()?) {
            Recommendation::Pick { movie, .. } => Some(movie.title),
            Recommendation::Denied { .. } | Recommendation::Exhausted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;
    use chrono::NaiveDate;

    fn day(d: u32, hours: f64) -> FactDailyProductivity {
        FactDailyProductivity {
            date: NaiveDate::from_ymd_opt(2025, 1, d).unwrap(),
            category: "Work".to_string(),
            total_hours: hours,
            total_activities: 1,
        }
    }

    fn movie(title: &str, popularity: f64, vote_average: f64) -> CanonicalMovieRecord {
        CanonicalMovieRecord {
            title: Some(title.to_string()),
            popularity: Some(popularity),
            vote_average: Some(vote_average),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_dashboard_degrades_every_view() {
        let dashboard = Dashboard::default();
        let session = RecommendationSession::new();

        assert!(matches!(dashboard.report(), ViewData::InsufficientData { .. }));
        assert!(matches!(dashboard.forecast(), ViewData::InsufficientData { .. }));
        assert!(matches!(dashboard.action(&session), ViewData::InsufficientData { .. }));

        let diagnosis = dashboard.diagnosis();
        assert!(diagnosis.rhythm.ready().is_none());
        assert!(diagnosis.viewer.ready().is_none());
    }

    #[test]
    fn test_load_tolerates_missing_tables() {
        let env = TestEnv::new();
        let mut lake = env.init_lakehouse();
        lake.write_table(Artifact::FactDailyProductivity, &[day(6, 4.0)], None)
            .unwrap();

        let dashboard = Dashboard::load(&lake).unwrap();
        assert!(dashboard.productivity.is_some());
        assert!(dashboard.genres.is_none());
        assert!(dashboard.movies.is_none());
        assert!(dashboard.report().ready().is_some());
    }

    #[test]
    fn test_report_totals() {
        let dashboard = Dashboard {
            productivity: Some(vec![day(6, 4.0), day(7, 2.5)]),
            ..Default::default()
        };
        let report = dashboard.report();
        let report = report.ready().unwrap();
        assert_eq!(report.total_hours, 6.5);
        assert_eq!(report.total_activities, 2);
        assert_eq!(report.days, 2);
        assert_eq!(report.categories.len(), 1);
    }

    #[test]
    fn test_action_without_movies_degrades_recommendation_only() {
        let dashboard = Dashboard {
            productivity: Some(vec![day(5, 6.0), day(6, 8.0), day(7, 10.0)]),
            ..Default::default()
        };
        let action = dashboard.action(&RecommendationSession::new());
        let plan = action.ready().unwrap();
        assert_eq!(plan.state, TrendState::Rising);
        assert_eq!(plan.strategy.mode, "High-Performance Mode");
        assert!(plan.recommendation.ready().is_none());
    }

    #[test]
    fn test_denied_action_needs_no_movies() {
        let dashboard = Dashboard {
            productivity: Some(vec![day(5, 9.0), day(6, 8.0), day(7, 2.0)]),
            ..Default::default()
        };
        let action = dashboard.action(&RecommendationSession::new());
        let plan = action.ready().unwrap();
        assert_eq!(plan.state, TrendState::SharpDrop);
        assert!(matches!(
            plan.recommendation.ready(),
            Some(Recommendation::Denied { .. })
        ));
    }

    #[test]
    fn test_current_pick_follows_session() {
        let dashboard = Dashboard {
            productivity: Some(vec![day(5, 6.0), day(6, 8.0), day(7, 10.0)]),
            movies: Some(vec![movie("A", 90.0, 6.0), movie("B", 70.0, 6.0)]),
            ..Default::default()
        };
        let mut session = RecommendationSession::new();
        assert_eq!(dashboard.current_pick(&session).as_deref(), Some("A"));
        session.reject("A");
        assert_eq!(dashboard.current_pick(&session).as_deref(), Some("B"));
    }

    #[test]
    fn test_view_data_serializes_with_status() {
        let view: ViewData<Report> = ViewData::InsufficientData {
            reason: "none".to_string(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["reason"], "none");
    }
}
