//! Storage layer for Lifelens data.
//!
//! A lakehouse is a directory holding one folder per pipeline layer plus a
//! SQLite catalog:
//!
//! ```text
//! <data-dir>/
//!   bronze/   raw_*.json        raw record arrays handed over by ingestion
//!   silver/   dim_*.jsonl       canonical per-source tables
//!   gold/     fact_*.jsonl      aggregated fact tables
//!   catalog.db                  artifact registry and run history
//!   config.kdl                  data-dir preferences
//! ```
//!
//! Tables are JSONL (one row per line) and every write replaces the whole
//! file atomically. A table whose file does not exist is a
//! [`Error::MissingArtifact`], which consumers treat as "no data yet".

use crate::config::LensConfig;
use crate::pipeline::StepOutcome;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use kdl::KdlDocument;
use rusqlite::{Connection, params};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LENS_DATA_DIR";

const CATALOG_FILE: &str = "catalog.db";
const CONFIG_FILE: &str = "config.kdl";

/// Pipeline layer an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Bronze,
    Silver,
    Gold,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Bronze => "bronze",
            Layer::Silver => "silver",
            Layer::Gold => "gold",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every table the pipeline reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    RawHistory,
    RawTasks,
    RawCalendar,
    RawMovies,
    DimHistory,
    DimTasks,
    DimCalendar,
    DimMovies,
    FactDailyProductivity,
    FactGenreStats,
}

impl Artifact {
    /// All artifacts in pipeline order.
    pub const ALL: [Artifact; 10] = [
        Artifact::RawHistory,
        Artifact::RawTasks,
        Artifact::RawCalendar,
        Artifact::RawMovies,
        Artifact::DimHistory,
        Artifact::DimTasks,
        Artifact::DimCalendar,
        Artifact::DimMovies,
        Artifact::FactDailyProductivity,
        Artifact::FactGenreStats,
    ];

    /// Table name, also the file stem.
    pub fn name(&self) -> &'static str {
        match self {
            Artifact::RawHistory => "raw_history_film",
            Artifact::RawTasks => "raw_tasks",
            Artifact::RawCalendar => "raw_calendar_events",
            Artifact::RawMovies => "raw_tmdb_movies",
            Artifact::DimHistory => "dim_history_film",
            Artifact::DimTasks => "dim_tasks",
            Artifact::DimCalendar => "dim_calendar",
            Artifact::DimMovies => "dim_tmdb_movies",
            Artifact::FactDailyProductivity => "fact_daily_productivity",
            Artifact::FactGenreStats => "fact_genre_stats",
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            Artifact::RawHistory
            | Artifact::RawTasks
            | Artifact::RawCalendar
            | Artifact::RawMovies => Layer::Bronze,
            Artifact::DimHistory
            | Artifact::DimTasks
            | Artifact::DimCalendar
            | Artifact::DimMovies => Layer::Silver,
            Artifact::FactDailyProductivity | Artifact::FactGenreStats => Layer::Gold,
        }
    }

    /// File name inside the layer directory.
    pub fn file_name(&self) -> String {
        match self.layer() {
            Layer::Bronze => format!("{}.json", self.name()),
            Layer::Silver | Layer::Gold => format!("{}.jsonl", self.name()),
        }
    }

    /// Look up an artifact by table name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A catalog entry for a persisted table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub name: String,
    pub layer: Layer,
    pub path: String,
    pub row_count: u64,
    pub written_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

/// One recorded step of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub status: String,
    pub rows: u64,
    pub dropped: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A recorded pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub stage: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
}

/// Storage manager for one data directory.
pub struct Lakehouse {
    /// Root data directory
    pub root: PathBuf,
    /// SQLite connection for the catalog
    conn: Connection,
}

impl Lakehouse {
    /// Open an existing lakehouse.
    pub fn open(root: &Path) -> Result<Self> {
        if !Self::exists(root) {
            return Err(Error::NotInitialized);
        }

        let conn = Connection::open(root.join(CATALOG_FILE))?;
        Self::init_schema(&conn)?;

        Ok(Self {
            root: root.to_path_buf(),
            conn,
        })
    }

    /// Initialize a lakehouse, creating the layer directories and catalog.
    ///
    /// Initializing an existing lakehouse is a no-op that keeps its data.
    pub fn init(root: &Path) -> Result<Self> {
        for layer in [Layer::Bronze, Layer::Silver, Layer::Gold] {
            fs::create_dir_all(root.join(layer.as_str()))?;
        }

        let conn = Connection::open(root.join(CATALOG_FILE))?;
        Self::init_schema(&conn)?;
        tracing::info!(root = %root.display(), "lakehouse initialized");

        Ok(Self {
            root: root.to_path_buf(),
            conn,
        })
    }

    /// Check if a lakehouse exists at the given root.
    pub fn exists(root: &Path) -> bool {
        root.join(CATALOG_FILE).exists()
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS artifacts (
                name TEXT PRIMARY KEY,
                layer TEXT NOT NULL,
                path TEXT NOT NULL,
                row_count INTEGER NOT NULL,
                written_at TEXT NOT NULL,
                run_id TEXT
            );

            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                stage TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT
            );

            CREATE TABLE IF NOT EXISTS run_steps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                step TEXT NOT NULL,
                status TEXT NOT NULL,
                rows INTEGER NOT NULL DEFAULT 0,
                dropped INTEGER NOT NULL DEFAULT 0,
                detail TEXT,
                FOREIGN KEY (run_id) REFERENCES runs(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_run_steps_run ON run_steps(run_id);
            CREATE INDEX IF NOT EXISTS idx_runs_started ON runs(started_at);
            "#,
        )?;
        Ok(())
    }

    /// Path of an artifact's file.
    pub fn artifact_path(&self, artifact: Artifact) -> PathBuf {
        self.root
            .join(artifact.layer().as_str())
            .join(artifact.file_name())
    }

    /// Whether an artifact's file exists.
    pub fn has_artifact(&self, artifact: Artifact) -> bool {
        self.artifact_path(artifact).exists()
    }

    // === Bronze ===

    /// Replace a bronze file with a JSON array of raw records.
    pub fn write_raw(
        &mut self,
        artifact: Artifact,
        records: &[serde_json::Value],
        run_id: Option<&str>,
    ) -> Result<()> {
        debug_assert_eq!(artifact.layer(), Layer::Bronze);
        let json = serde_json::to_string_pretty(records)?;
        let path = self.artifact_path(artifact);
        replace_file(&path, json.as_bytes())?;
        self.register_artifact(artifact, records.len(), run_id)?;
        tracing::info!(artifact = %artifact, rows = records.len(), "bronze artifact written");
        Ok(())
    }

    /// Read a bronze file as a list of raw JSON records.
    pub fn read_raw(&self, artifact: Artifact) -> Result<Vec<serde_json::Value>> {
        let path = self.artifact_path(artifact);
        if !path.exists() {
            return Err(Error::MissingArtifact(artifact.name().to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        match serde_json::from_str::<serde_json::Value>(&contents)? {
            serde_json::Value::Array(records) => Ok(records),
            _ => Err(Error::MalformedRecord(format!(
                "{} is not a JSON array",
                path.display()
            ))),
        }
    }

    // === Silver / Gold ===

    /// Replace a table with the given rows. Returns the number of rows written.
    pub fn write_table<T: Serialize>(
        &mut self,
        artifact: Artifact,
        rows: &[T],
        run_id: Option<&str>,
    ) -> Result<usize> {
        let mut buf = String::new();
        for row in rows {
            buf.push_str(&serde_json::to_string(row)?);
            buf.push('\n');
        }

        let path = self.artifact_path(artifact);
        replace_file(&path, buf.as_bytes())?;
        self.register_artifact(artifact, rows.len(), run_id)?;
        tracing::info!(artifact = %artifact, rows = rows.len(), "table written");

        Ok(rows.len())
    }

    /// Read every row of a table.
    pub fn read_table<T: DeserializeOwned>(&self, artifact: Artifact) -> Result<Vec<T>> {
        let path = self.artifact_path(artifact);
        if !path.exists() {
            return Err(Error::MissingArtifact(artifact.name().to_string()));
        }

        let contents = fs::read_to_string(&path)?;
        let mut rows = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            rows.push(serde_json::from_str(line)?);
        }
        Ok(rows)
    }

    // === Catalog ===

    fn register_artifact(
        &self,
        artifact: Artifact,
        row_count: usize,
        run_id: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO artifacts (name, layer, path, row_count, written_at, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                artifact.name(),
                artifact.layer().as_str(),
                self.artifact_path(artifact).to_string_lossy(),
                row_count as i64,
                Utc::now().to_rfc3339(),
                run_id,
            ],
        )?;
        Ok(())
    }

    /// List catalog entries in pipeline order. Only artifacts ever written appear.
    pub fn list_artifacts(&self) -> Result<Vec<ArtifactRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, layer, path, row_count, written_at, run_id FROM artifacts",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut by_name = HashMap::new();
        for row in rows {
            let (name, _layer, path, row_count, written_at, run_id) = row?;
            let Some(artifact) = Artifact::from_name(&name) else {
                continue;
            };
            by_name.insert(
                artifact,
                ArtifactRecord {
                    name,
                    layer: artifact.layer(),
                    path,
                    row_count: row_count.max(0) as u64,
                    written_at: parse_timestamp(&written_at)?,
                    run_id,
                },
            );
        }

        Ok(Artifact::ALL
            .iter()
            .filter_map(|a| by_name.remove(a))
            .collect())
    }

    /// Record the start of a pipeline run and return its ID.
    pub fn begin_run(&mut self, stage: &str) -> Result<String> {
        let id = generate_id("run", stage);
        self.conn.execute(
            "INSERT INTO runs (id, stage, started_at) VALUES (?1, ?2, ?3)",
            params![id, stage, Utc::now().to_rfc3339()],
        )?;
        Ok(id)
    }

    /// Record one step outcome of a run.
    pub fn record_step(&mut self, run_id: &str, outcome: &StepOutcome) -> Result<()> {
        self.conn.execute(
            "INSERT INTO run_steps (run_id, step, status, rows, dropped, detail)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                outcome.step,
                outcome.status.as_str(),
                outcome.rows as i64,
                outcome.dropped as i64,
                outcome.detail,
            ],
        )?;
        Ok(())
    }

    /// Mark a run as finished.
    pub fn finish_run(&mut self, run_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE runs SET finished_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), run_id],
        )?;
        Ok(())
    }

    /// Most recent runs first, with their steps.
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, stage, started_at, finished_at FROM runs
             ORDER BY started_at DESC, rowid DESC LIMIT ?1",
        )?;
        let heads: Vec<(String, String, String, Option<String>)> = stmt
            .query_map([limit as i64], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<std::result::Result<_, _>>()?;

        let mut step_stmt = self.conn.prepare(
            "SELECT step, status, rows, dropped, detail FROM run_steps
             WHERE run_id = ?1 ORDER BY id ASC",
        )?;

        let mut runs = Vec::new();
        for (id, stage, started_at, finished_at) in heads {
            let steps = step_stmt
                .query_map([&id], |row| {
                    Ok(StepRecord {
                        step: row.get(0)?,
                        status: row.get(1)?,
                        rows: row.get::<_, i64>(2)?.max(0) as u64,
                        dropped: row.get::<_, i64>(3)?.max(0) as u64,
                        detail: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            runs.push(RunRecord {
                id,
                stage,
                started_at: parse_timestamp(&started_at)?,
                finished_at: finished_at.as_deref().map(parse_timestamp).transpose()?,
                steps,
            });
        }

        Ok(runs)
    }

    // === Config ===

    /// Path of the data-dir config file.
    pub fn config_kdl_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Path of the system-wide config file (`~/.config/lifelens/config.kdl`).
    pub fn system_config_kdl_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lifelens").join(CONFIG_FILE))
    }

    /// Read the data-dir config. A missing file yields an empty config.
    pub fn read_config(&self) -> Result<LensConfig> {
        read_config_file(&self.config_kdl_path())
    }

    /// Read the system config. A missing file yields an empty config.
    pub fn read_system_config() -> Result<LensConfig> {
        match Self::system_config_kdl_path() {
            Some(path) => read_config_file(&path),
            None => Ok(LensConfig::default()),
        }
    }

    /// Write the data-dir config, replacing the file.
    pub fn write_config(&self, config: &LensConfig) -> Result<()> {
        config.validate().map_err(Error::Config)?;
        let doc = config.to_kdl();
        replace_file(&self.config_kdl_path(), doc.to_string().as_bytes())
    }
}

fn read_config_file(path: &Path) -> Result<LensConfig> {
    if !path.exists() {
        return Ok(LensConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let doc: KdlDocument = contents
        .parse()
        .map_err(|e: kdl::KdlError| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(LensConfig::from_kdl(&doc))
}

/// Atomically replace a file's contents.
fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Other(format!("No parent directory for {}", path.display())))?;
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Other(format!("Invalid catalog timestamp '{}': {}", value, e)))
}

/// Resolve the data directory.
///
/// Priority: explicit path > `LENS_DATA_DIR` > platform data dir (`~/.local/share/lifelens`).
pub fn get_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("lifelens"))
}

/// Generate a unique ID for a run.
///
/// Format: `<prefix>-<8 hex chars>`
pub fn generate_id(prefix: &str, seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(
        Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or(0)
            .to_le_bytes(),
    );
    let hash = hasher.finalize();
    let hash_hex = format!("{:x}", hash);
    format!("{}-{}", prefix, &hash_hex[..8])
}
