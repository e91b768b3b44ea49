//! Recommendation session state.
//!
//! The session is an explicit value owned by one interactive dashboard. It
//! is passed into every recommendation and mutated only by user actions.

use super::decision::{MovieFilter, Verdict, permission_rule};
use super::trend::TrendState;
use crate::models::CanonicalMovieRecord;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const MISSING_OVERVIEW: &str = "Summary not available.";

const EXHAUSTED_MESSAGE: &str =
    "Out of ideas! Reset the rejection list if you want to start over.";

/// Mutable state of one recommendation session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSession {
    /// Titles the user dismissed, in dismissal order
    pub rejected: Vec<String>,
    /// Last accepted title
    pub accepted: Option<String>,
    /// Set by the override action during a sharp drop, cleared on accept
    pub override_acknowledged: bool,
}

/// The movie shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    pub title: String,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub overview: String,
}

impl MovieCard {
    fn from_record(title: &str, movie: &CanonicalMovieRecord) -> Self {
        Self {
            title: title.to_string(),
            vote_average: movie.vote_average,
            popularity: movie.popularity,
            release_date: movie.release_date,
            overview: movie
                .overview
                .clone()
                .filter(|o| !o.trim().is_empty())
                .unwrap_or_else(|| MISSING_OVERVIEW.to_string()),
        }
    }
}

/// Outcome of asking for a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// Watching is not allowed in the current state.
    Denied {
        headline: &'static str,
        message: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        advice: Option<&'static str>,
        override_available: bool,
    },
    /// The top-ranked candidate not yet rejected.
    Pick {
        filter: MovieFilter,
        heading: &'static str,
        movie: MovieCard,
        accepted: bool,
    },
    /// Every candidate has been rejected.
    Exhausted {
        filter: MovieFilter,
        heading: &'static str,
        message: &'static str,
    },
}

impl RecommendationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The candidate filter in force, or `None` while watching is denied.
    pub fn active_filter(&self, state: TrendState) -> Option<MovieFilter> {
        let rule = permission_rule(state);
        match rule.verdict {
            Verdict::Allowed => Some(rule.filter),
            Verdict::Denied if rule.override_allowed && self.override_acknowledged => {
                Some(rule.filter)
            }
            Verdict::Denied => None,
        }
    }

    pub fn is_rejected(&self, title: &str) -> bool {
        self.rejected.iter().any(|t| t == title)
    }

    /// Titled movies passing the filter and not rejected, most popular first.
    pub fn candidates<'a>(
        &self,
        filter: MovieFilter,
        movies: &'a [CanonicalMovieRecord],
    ) -> Vec<(&'a str, &'a CanonicalMovieRecord)> {
        let mut pool: Vec<(&str, &CanonicalMovieRecord)> = movies
            .iter()
            .filter_map(|m| m.title.as_deref().map(|t| (t, m)))
            .filter(|(title, movie)| filter.accepts(movie) && !self.is_rejected(title))
            .collect();

        pool.sort_by(|(_, a), (_, b)| {
            let a = a.popularity.unwrap_or(f64::NEG_INFINITY);
            let b = b.popularity.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });
        pool
    }

    pub fn recommend(&self, state: TrendState, movies: &[CanonicalMovieRecord]) -> Recommendation {
        let Some(filter) = self.active_filter(state) else {
            let rule = permission_rule(state);
            return Recommendation::Denied {
                headline: rule.headline,
                message: rule.message,
                advice: rule.advice,
                override_available: rule.override_allowed,
            };
        };

        match self.candidates(filter, movies).first() {
            Some((title, movie)) => Recommendation::Pick {
                filter,
                heading: filter.title(),
                movie: MovieCard::from_record(title, movie),
                accepted: self.accepted.as_deref() == Some(*title),
            },
            None => Recommendation::Exhausted {
                filter,
                heading: filter.title(),
                message: EXHAUSTED_MESSAGE,
            },
        }
    }

    /// Dismiss a title so the next recommendation moves on.
    pub fn reject(&mut self, title: &str) {
        if !self.is_rejected(title) {
            self.rejected.push(title.to_string());
        }
        tracing::debug!(title, rejected = self.rejected.len(), "recommendation rejected");
    }

    /// The active filter, or an error naming how to lift the denial.
    pub fn permit(&self, state: TrendState) -> Result<MovieFilter> {
        self.active_filter(state).ok_or_else(|| {
            let hint = if permission_rule(state).override_allowed {
                " (run `override` to allow one pick)"
            } else {
                ""
            };
            Error::InvalidInput(format!(
                "watching is denied while the trend is {}{}",
                state, hint
            ))
        })
    }

    /// Accept a title. Refused while watching is denied; ends an override cycle.
    pub fn accept(&mut self, state: TrendState, title: &str) -> Result<()> {
        self.permit(state)?;
        self.accepted = Some(title.to_string());
        if self.override_acknowledged {
            tracing::debug!("override cycle consumed");
        }
        self.override_acknowledged = false;
        Ok(())
    }

    /// Clear the rejection list.
    pub fn reset(&mut self) {
        self.rejected.clear();
    }

    /// Allow one recommendation cycle despite a denial.
    pub fn acknowledge_override(&mut self, state: TrendState) -> Result<()> {
        if !permission_rule(state).override_allowed {
            return Err(Error::InvalidInput(format!(
                "override is only available when watching is denied (trend is {})",
                state
            )));
        }
        self.override_acknowledged = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str, popularity: f64, vote_average: f64) -> CanonicalMovieRecord {
        CanonicalMovieRecord {
            title: Some(title.to_string()),
            popularity: Some(popularity),
            vote_average: Some(vote_average),
            ..Default::default()
        }
    }

    fn picked(rec: &Recommendation) -> Option<&str> {
        match rec {
            Recommendation::Pick { movie, .. } => Some(movie.title.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_reject_reset_flow() {
        let movies = vec![movie("B", 70.0, 6.0), movie("A", 90.0, 6.0)];
        let mut session = RecommendationSession::new();

        let rec = session.recommend(TrendState::Rising, &movies);
        assert_eq!(picked(&rec), Some("A"));

        session.reject("A");
        assert_eq!(picked(&session.recommend(TrendState::Rising, &movies)), Some("B"));

        session.reject("B");
        assert!(matches!(
            session.recommend(TrendState::Rising, &movies),
            Recommendation::Exhausted { .. }
        ));

        session.reset();
        assert_eq!(picked(&session.recommend(TrendState::Rising, &movies)), Some("A"));
    }

    #[test]
    fn test_stable_uses_top_rated_ranked_by_popularity() {
        let movies = vec![
            movie("Blockbuster", 95.0, 6.1),
            movie("Gem", 20.0, 8.2),
            movie("Classic", 40.0, 8.7),
        ];
        let session = RecommendationSession::new();

        match session.recommend(TrendState::Stable, &movies) {
            Recommendation::Pick { movie, filter, .. } => {
                assert_eq!(movie.title, "Classic");
                assert_eq!(filter, MovieFilter::TopRated);
                assert_eq!(movie.overview, "Summary not available.");
            }
            other => panic!("expected a pick, got {:?}", other),
        }
    }

    #[test]
    fn test_sharp_drop_denies_until_override() {
        let movies = vec![movie("Gem", 20.0, 8.2)];
        let mut session = RecommendationSession::new();

        assert!(matches!(
            session.recommend(TrendState::SharpDrop, &movies),
            Recommendation::Denied {
                override_available: true,
                ..
            }
        ));

        session.acknowledge_override(TrendState::SharpDrop).unwrap();
        assert_eq!(
            picked(&session.recommend(TrendState::SharpDrop, &movies)),
            Some("Gem")
        );

        // Accepting ends the single allowed cycle
        session.accept(TrendState::SharpDrop, "Gem").unwrap();
        assert_eq!(session.accepted.as_deref(), Some("Gem"));
        assert!(matches!(
            session.recommend(TrendState::SharpDrop, &movies),
            Recommendation::Denied { .. }
        ));
    }

    #[test]
    fn test_accept_refused_during_denial() {
        let mut session = RecommendationSession::new();

        let err = session.accept(TrendState::SharpDrop, "Gem").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("run `override`"));
        assert_eq!(session.accepted, None);

        session.acknowledge_override(TrendState::SharpDrop).unwrap();
        session.accept(TrendState::SharpDrop, "Gem").unwrap();
        assert_eq!(session.accepted.as_deref(), Some("Gem"));
        assert!(session.accept(TrendState::SharpDrop, "Other").is_err());
    }

    #[test]
    fn test_override_rejected_when_not_denied() {
        let mut session = RecommendationSession::new();
        assert!(session.acknowledge_override(TrendState::Rising).is_err());
        assert!(!session.override_acknowledged);
    }

    #[test]
    fn test_accepted_marker_survives_reset() {
        let movies = vec![movie("A", 90.0, 8.0)];
        let mut session = RecommendationSession::new();
        session.accept(TrendState::Rising, "A").unwrap();
        session.reset();

        match session.recommend(TrendState::Rising, &movies) {
            Recommendation::Pick { accepted, .. } => assert!(accepted),
            other => panic!("expected a pick, got {:?}", other),
        }
    }

    #[test]
    fn test_untitled_movies_are_never_recommended() {
        let movies = vec![CanonicalMovieRecord {
            popularity: Some(99.0),
            ..Default::default()
        }];
        let session = RecommendationSession::new();
        assert!(matches!(
            session.recommend(TrendState::Rising, &movies),
            Recommendation::Exhausted { .. }
        ));
    }
}
