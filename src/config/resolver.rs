//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`LENS_OUTPUT_FORMAT`, `TMDB_API_KEY`,
//!    `LENS_TMDB_PAGES`, `LENS_TMDB_BASE_URL`)
//! 3. Data-dir config.kdl (`<data-dir>/config.kdl`)
//! 4. System config.kdl (`~/.config/lifelens/config.kdl`)
//! 5. Built-in defaults

use crate::Result;
use crate::config::schema::{LensConfig, MAX_TMDB_PAGES, OutputFormat, mask_secret};
use crate::ingest::{DEFAULT_TMDB_BASE_URL, DEFAULT_TMDB_PAGES};
use crate::storage::Lakehouse;
use serde::Serialize;

pub const OUTPUT_FORMAT_ENV: &str = "LENS_OUTPUT_FORMAT";
pub const TMDB_API_KEY_ENV: &str = "TMDB_API_KEY";
pub const TMDB_PAGES_ENV: &str = "LENS_TMDB_PAGES";
pub const TMDB_BASE_URL_ENV: &str = "LENS_TMDB_BASE_URL";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from the data directory's config.kdl
    DataDir,
    /// Value from the system config.kdl
    System,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::DataDir => write!(f, "data-dir"),
            ValueSource::System => write!(f, "system"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub output_format: Resolved<OutputFormat>,
    /// No default; the movie source is unavailable without a key
    pub tmdb_api_key: Option<Resolved<String>>,
    pub tmdb_pages: Resolved<u32>,
    pub tmdb_base_url: Resolved<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
            tmdb_api_key: None,
            tmdb_pages: Resolved::new(DEFAULT_TMDB_PAGES, ValueSource::Default),
            tmdb_base_url: Resolved::new(DEFAULT_TMDB_BASE_URL.to_string(), ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn tmdb_api_key(&self) -> Option<&str> {
        self.tmdb_api_key.as_ref().map(|r| r.value.as_str())
    }

    /// The API key for display, with the middle masked.
    pub fn masked_api_key(&self) -> Option<Resolved<String>> {
        self.tmdb_api_key
            .as_ref()
            .map(|r| Resolved::new(mask_secret(&r.value), r.source.clone()))
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_format: Option<OutputFormat>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_pages: Option<u32>,
    pub tmdb_base_url: Option<String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_tmdb_pages(mut self, pages: u32) -> Self {
        self.tmdb_pages = Some(pages);
        self
    }
}

/// Pick the first layer that has a value.
fn pick<T>(
    cli: Option<T>,
    env: Option<(T, &str)>,
    data_dir: Option<T>,
    system: Option<T>,
) -> Option<Resolved<T>> {
    if let Some(v) = cli {
        return Some(Resolved::new(v, ValueSource::CliFlag));
    }
    if let Some((v, name)) = env {
        return Some(Resolved::new(v, ValueSource::EnvVar(name.to_string())));
    }
    if let Some(v) = data_dir {
        return Some(Resolved::new(v, ValueSource::DataDir));
    }
    system.map(|v| Resolved::new(v, ValueSource::System))
}

/// Read one env var through `lookup` and parse it. Unparseable values are
/// ignored with a warning.
fn env_value<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<(T, &'static str)> {
    let raw = lookup(name).filter(|v| !v.is_empty())?;
    match parse(&raw) {
        Some(v) => Some((v, name)),
        None => {
            tracing::warn!(var = name, value = %raw, "ignoring invalid environment value");
            None
        }
    }
}

/// Resolve configuration from explicit layers.
///
/// `lookup` reads environment variables, so callers (and tests) decide
/// where the environment comes from.
pub fn resolve_layers(
    overrides: &ConfigOverrides,
    lookup: impl Fn(&str) -> Option<String>,
    data_dir: &LensConfig,
    system: &LensConfig,
) -> ResolvedConfig {
    let mut result = ResolvedConfig::default();

    if let Some(format) = pick(
        overrides.output_format,
        env_value(&lookup, OUTPUT_FORMAT_ENV, OutputFormat::parse),
        data_dir.output_format,
        system.output_format,
    ) {
        result.output_format = format;
    }

    result.tmdb_api_key = pick(
        overrides.tmdb_api_key.clone(),
        env_value(&lookup, TMDB_API_KEY_ENV, |s| Some(s.to_string())),
        data_dir.tmdb_api_key.clone(),
        system.tmdb_api_key.clone(),
    );

    if let Some(pages) = pick(
        overrides.tmdb_pages,
        env_value(&lookup, TMDB_PAGES_ENV, |s| {
            s.trim()
                .parse::<u32>()
                .ok()
                .filter(|p| (1..=MAX_TMDB_PAGES).contains(p))
        }),
        data_dir.tmdb_pages,
        system.tmdb_pages,
    ) {
        result.tmdb_pages = pages;
    }

    if let Some(url) = pick(
        overrides.tmdb_base_url.clone(),
        env_value(&lookup, TMDB_BASE_URL_ENV, |s| Some(s.to_string())),
        data_dir.tmdb_base_url.clone(),
        system.tmdb_base_url.clone(),
    ) {
        result.tmdb_base_url = url;
    }

    result
}

/// Resolve configuration with the full precedence chain.
///
/// Without a lakehouse (not yet initialized) the data-dir layer is skipped.
pub fn resolve_config(
    lake: Option<&Lakehouse>,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let system = Lakehouse::read_system_config()?;
    let data_dir = match lake {
        Some(lake) => lake.read_config()?,
        None => LensConfig::default(),
    };
    Ok(resolve_layers(
        overrides,
        |name| std::env::var(name).ok(),
        &data_dir,
        &system,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_value_source_display() {
        assert_eq!(
            format!("{}", ValueSource::EnvVar("FOO".to_string())),
            "env:FOO"
        );
        assert_eq!(format!("{}", ValueSource::DataDir), "data-dir");
        assert_eq!(format!("{}", ValueSource::System), "system");
        assert_eq!(format!("{}", ValueSource::CliFlag), "cli");
        assert_eq!(format!("{}", ValueSource::Default), "default");
    }

    #[test]
    fn test_resolve_defaults() {
        let config = resolve_layers(
            &ConfigOverrides::new(),
            env(&[]),
            &LensConfig::default(),
            &LensConfig::default(),
        );

        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.output_format.source, ValueSource::Default);
        assert!(config.tmdb_api_key.is_none());
        assert_eq!(config.tmdb_pages.value, DEFAULT_TMDB_PAGES);
        assert_eq!(config.tmdb_base_url.value, DEFAULT_TMDB_BASE_URL);
    }

    #[test]
    fn test_data_dir_beats_system() {
        let system = LensConfig {
            output_format: Some(OutputFormat::Human),
            tmdb_pages: Some(10),
            ..Default::default()
        };
        let data_dir = LensConfig {
            tmdb_pages: Some(3),
            ..Default::default()
        };

        let config = resolve_layers(&ConfigOverrides::new(), env(&[]), &data_dir, &system);

        assert_eq!(config.output_format(), OutputFormat::Human);
        assert_eq!(config.output_format.source, ValueSource::System);
        assert_eq!(config.tmdb_pages.value, 3);
        assert_eq!(config.tmdb_pages.source, ValueSource::DataDir);
    }

    #[test]
    fn test_env_beats_files_and_cli_beats_env() {
        let data_dir = LensConfig {
            tmdb_api_key: Some("from-file".to_string()),
            tmdb_pages: Some(3),
            ..Default::default()
        };
        let lookup = env(&[(TMDB_API_KEY_ENV, "from-env"), (TMDB_PAGES_ENV, "7")]);
        let overrides = ConfigOverrides::new().with_tmdb_pages(2);

        let config = resolve_layers(&overrides, lookup, &data_dir, &LensConfig::default());

        assert_eq!(config.tmdb_api_key(), Some("from-env"));
        assert_eq!(
            config.tmdb_api_key.as_ref().map(|r| r.source.clone()),
            Some(ValueSource::EnvVar(TMDB_API_KEY_ENV.to_string()))
        );
        assert_eq!(config.tmdb_pages.value, 2);
        assert_eq!(config.tmdb_pages.source, ValueSource::CliFlag);
    }

    #[test]
    fn test_invalid_env_value_falls_through() {
        let data_dir = LensConfig {
            output_format: Some(OutputFormat::Human),
            ..Default::default()
        };
        let lookup = env(&[(OUTPUT_FORMAT_ENV, "yaml"), (TMDB_PAGES_ENV, "0")]);

        let config = resolve_layers(&ConfigOverrides::new(), lookup, &data_dir, &LensConfig::default());

        assert_eq!(config.output_format(), OutputFormat::Human);
        assert_eq!(config.output_format.source, ValueSource::DataDir);
        assert_eq!(config.tmdb_pages.source, ValueSource::Default);
    }

    #[test]
    fn test_masked_api_key_keeps_source() {
        let overrides = ConfigOverrides {
            tmdb_api_key: Some("0123456789abcdef".to_string()),
            ..Default::default()
        };
        let config = resolve_layers(&overrides, env(&[]), &LensConfig::default(), &LensConfig::default());

        let masked = config.masked_api_key().unwrap();
        assert_eq!(masked.value, "0123...cdef");
        assert_eq!(masked.source, ValueSource::CliFlag);
    }
}
