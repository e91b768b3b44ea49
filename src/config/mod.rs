//! Configuration for Lifelens.
//!
//! Preferences live in `config.kdl`, either in the data directory or
//! system-wide at `~/.config/lifelens/config.kdl`:
//!
//! - `output-format` - "json" or "human"
//! - `tmdb-api-key` - API key for the movie-catalog source
//! - `tmdb-pages` - popular-movie pages pulled per ingestion (1-500)
//! - `tmdb-base-url` - movie API root, for mirrors and tests
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, OUTPUT_FORMAT_ENV, Resolved, ResolvedConfig, TMDB_API_KEY_ENV,
    TMDB_BASE_URL_ENV, TMDB_PAGES_ENV, ValueSource, resolve_config, resolve_layers,
};
pub use schema::{CONFIG_KEYS, LensConfig, MAX_TMDB_PAGES, OutputFormat, mask_secret};
