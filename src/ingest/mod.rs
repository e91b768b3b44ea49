//! Ingestion: pulling raw records into the bronze layer.
//!
//! A [`Source`] produces the raw records for one bronze artifact. Export
//! files are read through [`FileSource`] and the movie catalog can be pulled
//! live through [`TmdbSource`]. [`run_ingestion`] tries every source once and
//! isolates failures per source.

mod audit;
mod tmdb;

pub use audit::{BronzeAudit, audit_bronze};
pub use tmdb::{DEFAULT_TMDB_BASE_URL, DEFAULT_TMDB_PAGES, TmdbSource};

use crate::models::{RawMovieRecord, RawTaskRecord, RawWatchRecord};
use crate::pipeline::{PipelineReport, StepOutcome};
use crate::storage::{Artifact, Lakehouse, Layer};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The four kinds of life-tracking data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    History,
    Tasks,
    Calendar,
    Movies,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::History => "history",
            SourceKind::Tasks => "tasks",
            SourceKind::Calendar => "calendar",
            SourceKind::Movies => "movies",
        }
    }

    /// Bronze artifact this kind of source lands in.
    pub fn artifact(&self) -> Artifact {
        match self {
            SourceKind::History => Artifact::RawHistory,
            SourceKind::Tasks => Artifact::RawTasks,
            SourceKind::Calendar => Artifact::RawCalendar,
            SourceKind::Movies => Artifact::RawMovies,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A producer of raw records for one bronze artifact.
pub trait Source {
    /// Name used in logs and reports.
    fn name(&self) -> String;

    fn kind(&self) -> SourceKind;

    /// Fetch every raw record. Called exactly once per ingestion run.
    fn fetch(&self) -> Result<Vec<Value>>;
}

/// Reads an export file: a JSON array, an API response wrapping one
/// (`{"items": [...]}` or `{"results": [...]}`), JSON lines, or a
/// spreadsheet `.csv` export with a header row.
pub struct FileSource {
    kind: SourceKind,
    path: PathBuf,
}

impl FileSource {
    pub fn new(kind: SourceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse export text into raw records.
pub fn parse_records(contents: &str) -> Result<Vec<Value>> {
    let trimmed = contents.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(records)) => return Ok(records),
            Ok(Value::Object(mut obj)) => {
                for key in ["items", "results"] {
                    if let Some(Value::Array(records)) = obj.remove(key) {
                        return Ok(records);
                    }
                }
                return Ok(vec![Value::Object(obj)]);
            }
            Ok(_) => {
                return Err(Error::MalformedRecord(
                    "export is neither an array nor an object".to_string(),
                ));
            }
            // Several objects, one per line
            Err(_) if trimmed.starts_with('{') => {}
            Err(e) => return Err(e.into()),
        }
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::MalformedRecord(format!("line {}: {}", n + 1, e)))
        })
        .collect()
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn csv_rows<T: DeserializeOwned + Serialize>(contents: &str) -> Result<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(contents.as_bytes());
    reader
        .deserialize::<T>()
        .enumerate()
        .map(|(n, row)| -> Result<Value> {
            let row = row.map_err(|e| Error::MalformedRecord(format!("row {}: {}", n + 1, e)))?;
            Ok(serde_json::to_value(row)?)
        })
        .collect()
}

/// Parse a spreadsheet export into raw records.
///
/// Rows go through the raw record type of `kind`, so the export's own
/// headers ("Nama Film", "Estimasi (jam)", "Progress ", ...) are accepted.
/// Calendar events are nested and only come as JSON.
pub fn parse_csv_records(kind: SourceKind, contents: &str) -> Result<Vec<Value>> {
    let contents = contents.trim_start_matches('\u{feff}');
    match kind {
        SourceKind::History => csv_rows::<RawWatchRecord>(contents),
        SourceKind::Tasks => csv_rows::<RawTaskRecord>(contents),
        SourceKind::Movies => csv_rows::<RawMovieRecord>(contents),
        SourceKind::Calendar => Err(Error::InvalidInput(
            "calendar exports must be JSON".to_string(),
        )),
    }
}

impl Source for FileSource {
    fn name(&self) -> String {
        format!("{} ({})", self.kind, self.path.display())
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn fetch(&self) -> Result<Vec<Value>> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            Error::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        if is_csv(&self.path) {
            parse_csv_records(self.kind, &contents)
        } else {
            parse_records(&contents)
        }
    }
}

/// Fetch every source once and land its records in bronze.
///
/// A source that fails or yields nothing leaves its bronze file untouched.
pub fn run_ingestion(lake: &mut Lakehouse, sources: &[Box<dyn Source>]) -> Result<PipelineReport> {
    let run_id = lake.begin_run(Layer::Bronze.as_str())?;
    tracing::info!(run_id = %run_id, sources = sources.len(), "ingestion started");

    let mut outcomes = Vec::with_capacity(sources.len());
    for source in sources {
        let step = source.kind().as_str();
        let landed = source.fetch().and_then(|records| {
            if records.is_empty() {
                return Err(Error::EmptyDataset(source.name()));
            }
            lake.write_raw(source.kind().artifact(), &records, Some(&run_id))?;
            Ok(records.len())
        });

        let outcome = match landed {
            Ok(count) => {
                tracing::info!(source = %source.name(), records = count, "source ingested");
                StepOutcome::ok(step, count, 0)
            }
            Err(e) => {
                tracing::warn!(source = %source.name(), error = %e, "source not ingested");
                StepOutcome::from_error(step, &e)
            }
        };
        lake.record_step(&run_id, &outcome)?;
        outcomes.push(outcome);
    }

    lake.finish_run(&run_id)?;
    Ok(PipelineReport {
        run_id,
        layer: Layer::Bronze,
        steps: outcomes,
    })
}
