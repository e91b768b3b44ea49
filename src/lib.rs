//! Lifelens - a personal analytics pipeline.
//!
//! This library provides the core functionality for the `lens` CLI tool:
//! raw life-tracking records flow through bronze (raw), silver (canonical)
//! and gold (aggregated) layers, and a rule-based inference layer turns the
//! gold tables into report, diagnosis, forecast and action views.

pub mod aggregate;
pub mod clean;
pub mod cli;
pub mod commands;
pub mod config;
pub mod inference;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod storage;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::Path;
    use tempfile::TempDir;

    use crate::storage::Lakehouse;

    /// Test environment with an isolated data directory.
    pub struct TestEnv {
        pub data_dir: TempDir,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                data_dir: TempDir::new().unwrap(),
            }
        }

        /// Get the path to the isolated data directory.
        pub fn data_path(&self) -> &Path {
            self.data_dir.path()
        }

        /// Initialize a lakehouse in this environment.
        pub fn init_lakehouse(&self) -> Lakehouse {
            Lakehouse::init(self.data_path()).unwrap()
        }

        /// Write a raw bronze file from a JSON literal.
        pub fn write_bronze(&self, file_name: &str, value: serde_json::Value) {
            let dir = self.data_path().join("bronze");
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(file_name), serde_json::to_string(&value).unwrap()).unwrap();
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for Lifelens operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not initialized: run `lens init` first")]
    NotInitialized,

    /// An expected input table or file does not exist.
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// A record failed type coercion.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A source or table yielded zero records.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// An external collaborator could not be reached at all.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Lifelens operations.
pub type Result<T> = std::result::Result<T, Error>;
