//! Decision tables keyed by trend state.
//!
//! Every [`TrendState`] maps to exactly one permission rule and one work
//! strategy.

use super::trend::TrendState;
use crate::models::CanonicalMovieRecord;
use serde::Serialize;

/// Minimum popularity for the trending filter (exclusive).
pub const POPULARITY_THRESHOLD: f64 = 50.0;

/// Minimum vote average for the top-rated filter (exclusive).
pub const VOTE_AVERAGE_THRESHOLD: f64 = 7.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allowed,
    Denied,
}

/// Which movies are eligible for recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieFilter {
    /// popularity > 50
    Popular,
    /// vote_average > 7.5
    TopRated,
}

impl MovieFilter {
    pub fn accepts(&self, movie: &CanonicalMovieRecord) -> bool {
        match self {
            MovieFilter::Popular => movie.popularity.is_some_and(|p| p > POPULARITY_THRESHOLD),
            MovieFilter::TopRated => movie
                .vote_average
                .is_some_and(|v| v > VOTE_AVERAGE_THRESHOLD),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MovieFilter::Popular => "Trending Movies (Popular)",
            MovieFilter::TopRated => "Top Rated Movies (Quality Time)",
        }
    }
}

/// Entertainment permission for one trend state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionRule {
    pub verdict: Verdict,
    pub headline: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<&'static str>,
    /// Candidate filter once watching is allowed (including after an override)
    pub filter: MovieFilter,
    pub override_allowed: bool,
}

pub fn permission_rule(state: TrendState) -> PermissionRule {
    match state {
        TrendState::SharpDrop => PermissionRule {
            verdict: Verdict::Denied,
            headline: "DECISION: MOVIE FASTING",
            message: "Performance drop detected. Watching movies now risks worsening procrastination.",
            advice: Some("Sleep early, read a physical book, or meditate."),
            filter: MovieFilter::TopRated,
            override_allowed: true,
        },
        TrendState::Rising => PermissionRule {
            verdict: Verdict::Allowed,
            headline: "DECISION: REWARD GRANTED",
            message: "You have been very productive! Enjoy a quality movie as a reward.",
            advice: None,
            filter: MovieFilter::Popular,
            override_allowed: false,
        },
        TrendState::Stable => PermissionRule {
            verdict: Verdict::Allowed,
            headline: "DECISION: ALLOWED (MODERATE)",
            message: "Watching is allowed to maintain mood, but limit duration to protect sleep quality.",
            advice: None,
            filter: MovieFilter::TopRated,
            override_allowed: false,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyStep {
    pub name: &'static str,
    pub detail: &'static str,
}

/// Work advice for one trend state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkStrategy {
    pub mode: &'static str,
    pub steps: [StrategyStep; 3],
}

fn step(name: &'static str, detail: &'static str) -> StrategyStep {
    StrategyStep { name, detail }
}

pub fn work_strategy(state: TrendState) -> WorkStrategy {
    match state {
        TrendState::SharpDrop => WorkStrategy {
            mode: "Recovery Mode",
            steps: [
                step("Micro-Tasks", "Do not take on large tasks. Break them down."),
                step("25-5 Technique", "Focus for 25 minutes, then rest for 5 minutes."),
                step("Digital Detox", "Avoid digital distractions for the first 2 hours."),
            ],
        },
        TrendState::Rising => WorkStrategy {
            mode: "High-Performance Mode",
            steps: [
                step("Eat the Frog", "Do the hardest task first."),
                step("Deep Work", "Block 2 hours without interruption."),
                step("Leverage Momentum", "Do not stop until the target is met."),
            ],
        },
        TrendState::Stable => WorkStrategy {
            mode: "Maintenance Mode",
            steps: [
                step("Review Schedule", "Check the calendar for tomorrow."),
                step("Organize", "Tidy up files or emails."),
                step("Consistency", "Maintain regular working hours."),
            ],
        },
    }
}
