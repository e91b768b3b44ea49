//! Report, diagnose, forecast and action commands.

use super::{Output, hours};
use crate::inference::{
    ActionPlan, Dashboard, Diagnosis, ForecastSummary, Recommendation, RecommendationSession,
    Report, Verdict, ViewData,
};
use crate::storage::Lakehouse;
use crate::Result;
use std::path::Path;

impl<T: Output> Output for ViewData<T> {
    fn to_human(&self) -> String {
        match self {
            ViewData::Ready(view) => view.to_human(),
            ViewData::InsufficientData { reason } => reason.clone(),
        }
    }
}

fn section<T>(view: &ViewData<T>, render: impl Fn(&T) -> String) -> String {
    match view {
        ViewData::Ready(v) => render(v),
        ViewData::InsufficientData { reason } => format!("  {}", reason),
    }
}

impl Output for Report {
    fn to_human(&self) -> String {
        let mut lines = vec![
            "=== Historical Report ===".to_string(),
            format!(
                "Total: {} across {} activities over {} days",
                hours(self.total_hours),
                self.total_activities,
                self.days
            ),
            String::new(),
            "By category:".to_string(),
        ];
        for c in &self.categories {
            lines.push(format!(
                "  {:<24} {:>8}  ({} activities)",
                c.category,
                hours(c.total_hours),
                c.total_activities
            ));
        }
        lines.push(String::new());
        lines.push("Daily timeline:".to_string());
        for day in &self.timeline {
            lines.push(format!(
                "  {}  {:>8}  ({} activities)",
                day.date,
                hours(day.total_hours),
                day.total_activities
            ));
        }
        lines.join("\n")
    }
}

impl Output for Diagnosis {
    fn to_human(&self) -> String {
        let rhythm = section(&self.rhythm, |r| {
            format!(
                "  {} (best day: {}, {} on average)\n  {}",
                r.label,
                r.best_day,
                hours(r.best_day_average),
                r.message
            )
        });
        let focus = section(&self.focus, |f| {
            format!(
                "  Top category: {} ({}, {:.1}% of all hours)\n  {}",
                f.top_category,
                hours(f.top_category_hours),
                f.share_percent,
                f.message
            )
        });
        let viewer = section(&self.viewer, |v| {
            format!(
                "  {} (favorite genre: {}, {} films watched)\n  {}",
                v.personality, v.favorite_genre, v.total_watched, v.taste
            )
        });

        [
            "=== Habit Diagnosis ===".to_string(),
            "Work rhythm:".to_string(),
            rhythm,
            "Focus balance:".to_string(),
            focus,
            "Viewer profile:".to_string(),
            viewer,
        ]
        .join("\n")
    }
}

impl Output for ForecastSummary {
    fn to_human(&self) -> String {
        let f = &self.forecast;
        let last = match f.as_of {
            Some(date) => format!("Last day ({}): {}", date, hours(f.last_hours)),
            None => format!("Last day: {}", hours(f.last_hours)),
        };
        [
            "=== Forecast ===".to_string(),
            format!("Trend: {}", self.label),
            format!("  {}", self.message),
            last,
            format!(
                "Recent average: {} over {} days",
                hours(f.recent_average),
                f.days_considered
            ),
            format!("Predicted tomorrow: {}", hours(f.predicted_hours)),
        ]
        .join("\n")
    }
}

fn recommendation_text(rec: &Recommendation, override_active: bool) -> String {
    match rec {
        Recommendation::Denied {
            override_available, ..
        } => {
            if *override_available && !override_active {
                "  No recommendation. Use `override` to allow one top-rated pick anyway.".to_string()
            } else {
                "  No recommendation.".to_string()
            }
        }
        Recommendation::Pick {
            heading,
            movie,
            accepted,
            ..
        } => {
            let mut lines = vec![format!("  {}:", heading), format!("  > {}", movie.title)];
            let mut facts = Vec::new();
            if let Some(v) = movie.vote_average {
                facts.push(format!("rating {:.1}", v));
            }
            if let Some(p) = movie.popularity {
                facts.push(format!("popularity {:.1}", p));
            }
            if let Some(d) = movie.release_date {
                facts.push(format!("released {}", d));
            }
            if !facts.is_empty() {
                lines.push(format!("    {}", facts.join(", ")));
            }
            lines.push(format!("    {}", movie.overview));
            if *accepted {
                lines.push("    Enjoy the movie!".to_string());
            }
            lines.join("\n")
        }
        Recommendation::Exhausted {
            heading, message, ..
        } => format!("  {}:\n  {}", heading, message),
    }
}

impl Output for ActionPlan {
    fn to_human(&self) -> String {
        let mut lines = vec![
            "=== Action Plan ===".to_string(),
            format!("Strategy: {}", self.strategy.mode),
        ];
        for (i, step) in self.strategy.steps.iter().enumerate() {
            lines.push(format!("  {}. {}: {}", i + 1, step.name, step.detail));
        }

        lines.push(String::new());
        lines.push(self.permission.headline.to_string());
        lines.push(format!("  {}", self.permission.message));
        if let Some(advice) = self.permission.advice {
            lines.push(format!("  Advice: {}", advice));
        }
        if self.permission.verdict == Verdict::Denied && self.override_active {
            lines.push("  Override active: one recommendation allowed.".to_string());
        }

        lines.push(String::new());
        lines.push("Recommendation:".to_string());
        lines.push(match &self.recommendation {
            ViewData::Ready(rec) => recommendation_text(rec, self.override_active),
            ViewData::InsufficientData { reason } => format!("  {}", reason),
        });
        lines.join("\n")
    }
}

/// Open the data directory and load the gold tables.
pub fn load_dashboard(data_dir: &Path) -> Result<Dashboard> {
    let lake = Lakehouse::open(data_dir)?;
    Dashboard::load(&lake)
}

pub fn report(data_dir: &Path) -> Result<ViewData<Report>> {
    Ok(load_dashboard(data_dir)?.report())
}

pub fn diagnose(data_dir: &Path) -> Result<Diagnosis> {
    Ok(load_dashboard(data_dir)?.diagnosis())
}

pub fn forecast(data_dir: &Path) -> Result<ViewData<ForecastSummary>> {
    Ok(load_dashboard(data_dir)?.forecast())
}

/// One-shot action view. `reject` and `override_denial` stand in for the
/// session actions of an interactive dashboard.
pub fn action(
    data_dir: &Path,
    reject: &[String],
    override_denial: bool,
) -> Result<ViewData<ActionPlan>> {
    let dashboard = load_dashboard(data_dir)?;
    let mut session = RecommendationSession::new();
    for title in reject {
        session.reject(title);
    }
    if override_denial {
        if let Some(trend) = dashboard.trend() {
            session.acknowledge_override(trend.state)?;
        }
    }
    Ok(dashboard.action(&session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalMovieRecord, FactDailyProductivity};
    use crate::storage::Artifact;
    use crate::test_utils::TestEnv;
    use crate::Error;
    use chrono::NaiveDate;

    fn fact(d: u32, hours: f64) -> FactDailyProductivity {
        FactDailyProductivity {
            date: NaiveDate::from_ymd_opt(2025, 3, d).unwrap(),
            category: "Academic".to_string(),
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

    fn seed(env: &TestEnv, days: &[f64], movies: &[CanonicalMovieRecord]) {
        let mut lake = env.init_lakehouse();
        let rows: Vec<FactDailyProductivity> = days
            .iter()
            .enumerate()
            .map(|(i, h)| fact(i as u32 + 1, *h))
            .collect();
        lake.write_table(Artifact::FactDailyProductivity, &rows, None)
            .unwrap();
        lake.write_table(Artifact::DimMovies, movies, None).unwrap();
    }

    #[test]
    fn test_views_degrade_without_gold_tables() {
        let env = TestEnv::new();
        env.init_lakehouse();

        let report = report(env.data_path()).unwrap();
        assert!(report.ready().is_none());
        assert!(report.to_human().starts_with("Insufficient data"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["status"], "insufficient_data");

        let diagnosis = diagnose(env.data_path()).unwrap();
        assert!(diagnosis.to_human().contains("no genre facts"));
    }

    #[test]
    fn test_report_human_lists_timeline() {
        let env = TestEnv::new();
        seed(&env, &[2.0, 3.0], &[]);

        let text = report(env.data_path()).unwrap().to_human();
        assert!(text.contains("Total: 5.0h across 2 activities over 2 days"));
        assert!(text.contains("2025-03-02"));
    }

    #[test]
    fn test_action_rejects_and_overrides() {
        let env = TestEnv::new();
        // 8, 8, 2: last day far below the recent average
        seed(
            &env,
            &[8.0, 8.0, 2.0],
            &[movie("A", 90.0, 8.0), movie("B", 70.0, 8.5)],
        );

        let denied = action(env.data_path(), &[], false).unwrap();
        let plan = denied.ready().unwrap();
        assert!(matches!(plan.recommendation.ready(), Some(Recommendation::Denied { .. })));
        assert!(plan.to_human().contains("MOVIE FASTING"));

        let allowed = action(env.data_path(), &["A".to_string()], true).unwrap();
        match allowed.ready().unwrap().recommendation.ready() {
            Some(Recommendation::Pick { movie, .. }) => assert_eq!(movie.title, "B"),
            other => panic!("expected a pick, got {:?}", other),
        }
    }

    #[test]
    fn test_override_outside_sharp_drop_is_rejected() {
        let env = TestEnv::new();
        seed(&env, &[4.0, 4.0, 4.0], &[movie("A", 90.0, 8.0)]);

        let result = action(env.data_path(), &[], true);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
