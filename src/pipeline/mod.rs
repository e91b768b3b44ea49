//! Stage runners for the silver and gold layers.
//!
//! Each stage runs its steps one after another. A failing step is logged
//! and reported but never stops its siblings, and every step reads only the
//! previous layer's persisted tables.

use crate::aggregate::{build_daily_productivity, build_genre_stats};
use crate::clean::{Cleaned, clean_tasks, clean_watch_history, flatten_calendar, project_movies};
use crate::models::{CanonicalCalendarRecord, CanonicalTaskRecord, CanonicalWatchRecord};
use crate::storage::{Artifact, Lakehouse, Layer};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    /// The input held zero records; nothing was written
    Empty,
    /// An input table does not exist yet
    Skipped,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Ok => "ok",
            StepStatus::Empty => "empty",
            StepStatus::Skipped => "skipped",
            StepStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
    pub rows: usize,
    pub dropped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepOutcome {
    pub fn ok(step: &str, rows: usize, dropped: usize) -> Self {
        Self {
            step: step.to_string(),
            status: StepStatus::Ok,
            rows,
            dropped,
            detail: None,
        }
    }

    /// Classify an error into a step outcome.
    pub fn from_error(step: &str, err: &Error) -> Self {
        let status = match err {
            Error::EmptyDataset(_) => StepStatus::Empty,
            Error::MissingArtifact(_) => StepStatus::Skipped,
            _ => StepStatus::Failed,
        };
        Self {
            step: step.to_string(),
            status,
            rows: 0,
            dropped: 0,
            detail: Some(err.to_string()),
        }
    }
}

/// Everything one stage run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: String,
    pub layer: Layer,
    pub steps: Vec<StepOutcome>,
}

impl PipelineReport {
    pub fn failed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .count()
    }
}

/// Rows written and records dropped by a successful step.
struct StepCounts {
    rows: usize,
    dropped: usize,
}

type StepFn = fn(&mut Lakehouse, &str) -> Result<StepCounts>;

/// Run the steps of one stage, recording each outcome in the catalog.
fn run_stage(lake: &mut Lakehouse, layer: Layer, steps: &[(&str, StepFn)]) -> Result<PipelineReport> {
    let run_id = lake.begin_run(layer.as_str())?;
    tracing::info!(run_id = %run_id, layer = %layer, "stage started");

    let mut outcomes = Vec::with_capacity(steps.len());
    for &(name, step) in steps {
        let outcome = match step(lake, &run_id) {
            Ok(counts) => StepOutcome::ok(name, counts.rows, counts.dropped),
            Err(e) => {
                tracing::warn!(step = name, error = %e, "step did not complete");
                StepOutcome::from_error(name, &e)
            }
        };
        lake.record_step(&run_id, &outcome)?;
        outcomes.push(outcome);
    }

    lake.finish_run(&run_id)?;
    tracing::info!(run_id = %run_id, layer = %layer, "stage finished");
    Ok(PipelineReport {
        run_id,
        layer,
        steps: outcomes,
    })
}

fn read_nonempty_raw(lake: &Lakehouse, artifact: Artifact) -> Result<Vec<serde_json::Value>> {
    let records = lake.read_raw(artifact)?;
    if records.is_empty() {
        return Err(Error::EmptyDataset(artifact.name().to_string()));
    }
    Ok(records)
}

fn clean_step<T: Serialize>(
    lake: &mut Lakehouse,
    run_id: &str,
    input: Artifact,
    output: Artifact,
    clean: fn(Vec<serde_json::Value>) -> Cleaned<T>,
) -> Result<StepCounts> {
    let records = read_nonempty_raw(lake, input)?;
    let cleaned = clean(records);
    if cleaned.dropped > 0 {
        tracing::warn!(artifact = %output, dropped = cleaned.dropped, "records dropped during cleaning");
    }
    let rows = lake.write_table(output, &cleaned.rows, Some(run_id))?;
    Ok(StepCounts {
        rows,
        dropped: cleaned.dropped,
    })
}

fn history_step(lake: &mut Lakehouse, run_id: &str) -> Result<StepCounts> {
    clean_step(lake, run_id, Artifact::RawHistory, Artifact::DimHistory, clean_watch_history)
}

fn tasks_step(lake: &mut Lakehouse, run_id: &str) -> Result<StepCounts> {
    clean_step(lake, run_id, Artifact::RawTasks, Artifact::DimTasks, clean_tasks)
}

fn calendar_step(lake: &mut Lakehouse, run_id: &str) -> Result<StepCounts> {
    clean_step(lake, run_id, Artifact::RawCalendar, Artifact::DimCalendar, flatten_calendar)
}

fn movies_step(lake: &mut Lakehouse, run_id: &str) -> Result<StepCounts> {
    clean_step(lake, run_id, Artifact::RawMovies, Artifact::DimMovies, project_movies)
}

/// Build the silver tables from bronze.
pub fn run_transform(lake: &mut Lakehouse) -> Result<PipelineReport> {
    let steps: [(&str, StepFn); 4] = [
        ("history", history_step),
        ("tasks", tasks_step),
        ("calendar", calendar_step),
        ("movies", movies_step),
    ];
    run_stage(lake, Layer::Silver, &steps)
}

/// Read a table that may legitimately not exist yet.
fn read_optional<T: serde::de::DeserializeOwned>(
    lake: &Lakehouse,
    artifact: Artifact,
) -> Result<Option<Vec<T>>> {
    match lake.read_table(artifact) {
        Ok(rows) => Ok(Some(rows)),
        Err(Error::MissingArtifact(_)) => {
            tracing::info!(artifact = %artifact, "input table not built, continuing without it");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn productivity_step(lake: &mut Lakehouse, run_id: &str) -> Result<StepCounts> {
    let calendar: Option<Vec<CanonicalCalendarRecord>> = read_optional(lake, Artifact::DimCalendar)?;
    let tasks: Option<Vec<CanonicalTaskRecord>> = read_optional(lake, Artifact::DimTasks)?;
    if calendar.is_none() && tasks.is_none() {
        return Err(Error::MissingArtifact(format!(
            "{} and {}",
            Artifact::DimCalendar,
            Artifact::DimTasks
        )));
    }

    let fact = build_daily_productivity(calendar.as_deref(), tasks.as_deref());
    let rows = lake.write_table(Artifact::FactDailyProductivity, &fact, Some(run_id))?;
    Ok(StepCounts { rows, dropped: 0 })
}

fn genre_step(lake: &mut Lakehouse, run_id: &str) -> Result<StepCounts> {
    let history: Vec<CanonicalWatchRecord> = lake.read_table(Artifact::DimHistory)?;
    let stats = build_genre_stats(&history);
    let rows = lake.write_table(Artifact::FactGenreStats, &stats, Some(run_id))?;
    Ok(StepCounts { rows, dropped: 0 })
}

/// Build the gold tables from silver.
pub fn run_aggregate(lake: &mut Lakehouse) -> Result<PipelineReport> {
    let steps: [(&str, StepFn); 2] = [
        ("daily_productivity", productivity_step),
        ("genre_stats", genre_step),
    ];
    run_stage(lake, Layer::Gold, &steps)
}

/// Run silver then gold.
pub fn run_all(lake: &mut Lakehouse) -> Result<Vec<PipelineReport>> {
    let silver = run_transform(lake)?;
    let gold = run_aggregate(lake)?;
    Ok(vec![silver, gold])
}
