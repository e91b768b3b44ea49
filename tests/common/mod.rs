//! Common test utilities for lifelens integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/lifelens/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Environment variables that would leak the caller's settings into a test.
const INHERITED_VARS: &[&str] = &[
    "LENS_LOG",
    "LENS_OUTPUT_FORMAT",
    "LENS_TMDB_PAGES",
    "LENS_TMDB_BASE_URL",
    "TMDB_API_KEY",
];

/// A test environment with isolated data storage.
///
/// - `data_dir`: the lakehouse (via `LENS_DATA_DIR`)
/// - `config_home`: stands in for `~/.config` (via `XDG_CONFIG_HOME`)
/// - `input_dir`: export files fed to `lens ingest`
pub struct TestEnv {
    pub data_dir: TempDir,
    pub config_home: TempDir,
    pub input_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
            config_home: TempDir::new().unwrap(),
            input_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and run `lens init`.
    pub fn init() -> Self {
        let env = Self::new();
        env.lens().arg("init").assert().success();
        env
    }

    /// Get a Command for the lens binary with isolated directories.
    ///
    /// Sets `LENS_DATA_DIR` per-command for parallel safety.
    pub fn lens(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_lens"));
        for var in INHERITED_VARS {
            cmd.env_remove(var);
        }
        cmd.env("LENS_DATA_DIR", self.data_dir.path());
        cmd.env("XDG_CONFIG_HOME", self.config_home.path());
        cmd
    }

    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    /// Write an export file and return its path.
    pub fn write_input(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.input_dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Write the sample exports and return their paths as
    /// (history, tasks, calendar, movies).
    pub fn sample_exports(&self) -> (PathBuf, PathBuf, PathBuf, PathBuf) {
        (
            self.write_input("history.json", SAMPLE_HISTORY),
            self.write_input("tasks.json", SAMPLE_TASKS),
            self.write_input("calendar.json", SAMPLE_CALENDAR),
            self.write_input("movies.json", SAMPLE_MOVIES),
        )
    }

    /// Ingest the sample exports and build every layer.
    pub fn seed(&self) {
        let (history, tasks, calendar, movies) = self.sample_exports();
        self.lens()
            .arg("ingest")
            .arg("--history")
            .arg(&history)
            .arg("--tasks")
            .arg(&tasks)
            .arg("--calendar")
            .arg(&calendar)
            .arg("--movies")
            .arg(&movies)
            .assert()
            .success();
        self.lens().arg("run").assert().success();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as one JSON value.
pub fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

/// Three rows, one duplicate title.
pub const SAMPLE_HISTORY: &str = r#"[
  {"Nama Film": "Heat", "Genre": "Aksi, Crime"},
  {"Nama Film": "Her", "Genre": "Drama"},
  {"Nama Film": "Heat", "Genre": "Action"}
]"#;

/// A 14-hour academic task spread over the week ending 10 March, a 2-hour
/// errand on 8 March, and a row with an unusable estimate.
pub const SAMPLE_TASKS: &str = r#"[
  {"Nama Tugas": "Thesis", "Estimasi (jam)": "14", "Progress ": "10%", "Deadline": "10/03/2025", "Kategori": "academic", "Tipe Beban": "Spread"},
  {"Nama Tugas": "Groceries", "Estimasi (jam)": 2, "Progress ": "0", "Deadline": "08/03/2025", "Kategori": "personal", "Tipe Beban": "Once"},
  {"Nama Tugas": "Broken", "Estimasi (jam)": "abc", "Deadline": "09/03/2025"}
]"#;

/// One 90-minute meeting on 7 March and one event without an end.
pub const SAMPLE_CALENDAR: &str = r#"{"kind": "calendar#events", "items": [
  {"summary": "Standup", "start": {"dateTime": "2025-03-07T09:00:00Z"}, "end": {"dateTime": "2025-03-07T10:30:00Z"}},
  {"summary": "Open ended", "start": {"date": "2025-03-07"}}
]}"#;

pub const SAMPLE_MOVIES: &str = r#"{"page": 1, "results": [
  {"id": 1, "title": "Alpha", "popularity": 90.5, "vote_average": 8.1, "genre_ids": [18], "release_date": "2024-05-01", "overview": "First."},
  {"id": 2, "title": "Beta", "popularity": 60, "vote_average": 7.9, "genre_ids": [28, 12], "release_date": "2023-01-15", "overview": ""}
]}"#;
