//! Movie-catalog source backed by the TMDB "popular movies" listing.

use super::{Source, SourceKind};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Pages fetched per run. TMDB returns 20 movies per page.
pub const DEFAULT_TMDB_PAGES: u32 = 50;

const USER_AGENT: &str = concat!("lifelens/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct PopularPage {
    #[serde(default)]
    results: Vec<Value>,
}

/// Pulls the popular-movies listing page by page.
pub struct TmdbSource {
    api_key: Option<String>,
    base_url: String,
    pages: u32,
    agent: ureq::Agent,
}

impl TmdbSource {
    pub fn new(api_key: Option<String>, base_url: &str, pages: u32) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            pages,
            agent,
        }
    }

    fn fetch_page(&self, api_key: &str, page: u32) -> Result<Vec<Value>> {
        let url = format!("{}/movie/popular", self.base_url);
        let response = self
            .agent
            .get(&url)
            .query("api_key", api_key)
            .query("language", "en-US")
            .query("page", &page.to_string())
            .call();

        match response {
            Ok(resp) => {
                let body: PopularPage = resp
                    .into_json()
                    .map_err(|e| Error::Http(format!("page {}: {}", page, e)))?;
                Ok(body.results)
            }
            Err(ureq::Error::Status(code, _)) => {
                Err(Error::Http(format!("page {}: HTTP {}", page, code)))
            }
            Err(e) => Err(Error::Http(format!("page {}: {}", page, e))),
        }
    }
}

impl Source for TmdbSource {
    fn name(&self) -> String {
        format!("movies ({})", self.base_url)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Movies
    }

    fn fetch(&self) -> Result<Vec<Value>> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::SourceUnavailable(
                    "no TMDB API key configured (set tmdb-api-key or TMDB_API_KEY)".to_string(),
                )
            })?;

        let mut movies = Vec::new();
        let mut failed = 0;
        for page in 1..=self.pages {
            match self.fetch_page(api_key, page) {
                Ok(results) => {
                    tracing::debug!(page, movies = results.len(), "page fetched");
                    movies.extend(results);
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "page skipped");
                    failed += 1;
                }
            }
        }

        if self.pages > 0 && failed == self.pages {
            return Err(Error::SourceUnavailable(format!(
                "all {} pages failed from {}",
                self.pages, self.base_url
            )));
        }
        Ok(movies)
    }
}
