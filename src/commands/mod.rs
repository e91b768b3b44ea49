//! Command implementations for the Lifelens CLI.
//!
//! Each command returns a result type implementing [`Output`], rendered as
//! JSON by default or as text with `-H`:
//! - `init`, `ingest`, `audit` - set up the data directory and land raw data
//! - `transform`, `aggregate`, `run`, `status` - build and inspect the layers
//! - `report`, `diagnose`, `forecast`, `action`, `dashboard` - the views
//! - `config_show`, `config_set` - preferences

mod dashboard;
mod views;

pub use dashboard::{DashboardCommand, run_dashboard};
pub use views::{action, diagnose, forecast, load_dashboard, report};

use crate::config::{
    ConfigOverrides, OutputFormat, Resolved, ResolvedConfig, mask_secret,
    resolve_config,
};
use crate::ingest::{
    BronzeAudit, FileSource, Source, SourceKind, TmdbSource, audit_bronze, run_ingestion,
};
use crate::pipeline::{PipelineReport, StepStatus, run_aggregate, run_all, run_transform};
use crate::storage::{Artifact, ArtifactRecord, Lakehouse, RunRecord};
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output: Serialize {
    /// Serialize to a single-line JSON string.
    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Render a result in the requested format.
pub fn render<T: Output>(result: &T, human: bool) -> String {
    if human {
        result.to_human()
    } else {
        result.to_json()
    }
}

fn hours(h: f64) -> String {
    format!("{:.1}h", h)
}

// === init ===

#[derive(Serialize)]
pub struct InitResult {
    pub data_dir: PathBuf,
    /// False when the data directory was already initialized
    pub created: bool,
    pub config_path: PathBuf,
}

impl Output for InitResult {
    fn to_human(&self) -> String {
        if self.created {
            format!(
                "Initialized lifelens data directory at {}\nConfig: {}",
                self.data_dir.display(),
                self.config_path.display()
            )
        } else {
            format!(
                "Lifelens data directory already initialized at {}",
                self.data_dir.display()
            )
        }
    }
}

pub fn init(data_dir: &Path) -> Result<InitResult> {
    let created = !Lakehouse::exists(data_dir);
    let lake = Lakehouse::init(data_dir)?;
    Ok(InitResult {
        data_dir: lake.root.clone(),
        created,
        config_path: lake.config_kdl_path(),
    })
}

// === ingest / transform / aggregate / run ===

impl Output for PipelineReport {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} run {}", self.layer, self.run_id)];
        for step in &self.steps {
            let line = match step.status {
                StepStatus::Ok if step.dropped > 0 => format!(
                    "  {:<20} ok       {} rows, {} dropped",
                    step.step, step.rows, step.dropped
                ),
                StepStatus::Ok => format!("  {:<20} ok       {} rows", step.step, step.rows),
                status => format!(
                    "  {:<20} {:<8} {}",
                    step.step,
                    status.as_str(),
                    step.detail.as_deref().unwrap_or("")
                ),
            };
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// Which sources `lens ingest` should pull.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub history: Option<PathBuf>,
    pub tasks: Option<PathBuf>,
    pub calendar: Option<PathBuf>,
    pub movies: Option<PathBuf>,
    pub tmdb: bool,
}

impl IngestRequest {
    fn sources(&self, config: &ResolvedConfig) -> Vec<Box<dyn Source>> {
        let files = [
            (SourceKind::History, &self.history),
            (SourceKind::Tasks, &self.tasks),
            (SourceKind::Calendar, &self.calendar),
            (SourceKind::Movies, &self.movies),
        ];
        let mut sources: Vec<Box<dyn Source>> = files
            .into_iter()
            .filter_map(|(kind, path)| {
                path.as_ref()
                    .map(|p| Box::new(FileSource::new(kind, p)) as Box<dyn Source>)
            })
            .collect();

        if self.tmdb {
            sources.push(Box::new(TmdbSource::new(
                config.tmdb_api_key().map(str::to_string),
                &config.tmdb_base_url.value,
                config.tmdb_pages.value,
            )));
        }
        sources
    }
}

pub fn ingest(data_dir: &Path, request: &IngestRequest, config: &ResolvedConfig) -> Result<PipelineReport> {
    let sources = request.sources(config);
    if sources.is_empty() {
        return Err(Error::InvalidInput(
            "no sources given (use --history, --tasks, --calendar, --movies or --tmdb)".to_string(),
        ));
    }
    let mut lake = Lakehouse::open(data_dir)?;
    run_ingestion(&mut lake, &sources)
}

pub fn transform(data_dir: &Path) -> Result<PipelineReport> {
    let mut lake = Lakehouse::open(data_dir)?;
    run_transform(&mut lake)
}

pub fn aggregate(data_dir: &Path) -> Result<PipelineReport> {
    let mut lake = Lakehouse::open(data_dir)?;
    run_aggregate(&mut lake)
}

#[derive(Serialize)]
pub struct RunResult {
    pub stages: Vec<PipelineReport>,
}

impl Output for RunResult {
    fn to_human(&self) -> String {
        self.stages
            .iter()
            .map(PipelineReport::to_human)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub fn run(data_dir: &Path) -> Result<RunResult> {
    let mut lake = Lakehouse::open(data_dir)?;
    Ok(RunResult {
        stages: run_all(&mut lake)?,
    })
}

// === audit ===

#[derive(Serialize)]
pub struct AuditResult {
    pub artifacts: Vec<BronzeAudit>,
}

impl Output for AuditResult {
    fn to_human(&self) -> String {
        let mut lines = vec!["Bronze audit:".to_string()];
        for audit in &self.artifacts {
            if !audit.exists {
                lines.push(format!("  {:<22} missing", audit.artifact));
                continue;
            }
            match (&audit.error, audit.records) {
                (Some(err), _) => lines.push(format!("  {:<22} invalid: {}", audit.artifact, err)),
                (None, Some(0)) => lines.push(format!("  {:<22} empty", audit.artifact)),
                (None, records) => {
                    lines.push(format!(
                        "  {:<22} {} records",
                        audit.artifact,
                        records.unwrap_or(0)
                    ));
                    if !audit.keys.is_empty() {
                        lines.push(format!("      keys: {}", audit.keys.join(", ")));
                    }
                    if let Some(ref sample) = audit.sample {
                        lines.push(format!("      sample: {}", sample));
                    }
                }
            }
        }
        lines.join("\n")
    }
}

pub fn audit(data_dir: &Path) -> Result<AuditResult> {
    let lake = Lakehouse::open(data_dir)?;
    Ok(AuditResult {
        artifacts: audit_bronze(&lake),
    })
}

// === status ===

#[derive(Serialize)]
pub struct StatusResult {
    pub data_dir: PathBuf,
    pub artifacts: Vec<ArtifactRecord>,
    /// Artifacts not built yet
    pub missing: Vec<&'static str>,
    pub recent_runs: Vec<RunRecord>,
}

impl Output for StatusResult {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Data directory: {}", self.data_dir.display()),
            String::new(),
            format!(
                "Artifacts ({} of {} built):",
                self.artifacts.len(),
                Artifact::ALL.len()
            ),
        ];
        for a in &self.artifacts {
            lines.push(format!(
                "  {:<6} {:<26} {:>6} rows  {}",
                a.layer.as_str(),
                a.name,
                a.row_count,
                a.written_at.format("%Y-%m-%d %H:%M")
            ));
        }
        if !self.missing.is_empty() {
            lines.push(format!("Not built: {}", self.missing.join(", ")));
        }

        if self.recent_runs.is_empty() {
            lines.push("\nNo runs yet.".to_string());
        } else {
            lines.push("\nRecent runs:".to_string());
            for run in &self.recent_runs {
                let steps: Vec<String> = run
                    .steps
                    .iter()
                    .map(|s| format!("{} {}", s.step, s.status))
                    .collect();
                lines.push(format!(
                    "  {} {:<6} {}  {}",
                    run.id,
                    run.stage,
                    run.started_at.format("%Y-%m-%d %H:%M"),
                    steps.join(", ")
                ));
            }
        }
        lines.join("\n")
    }
}

pub fn status(data_dir: &Path, runs: usize) -> Result<StatusResult> {
    let lake = Lakehouse::open(data_dir)?;
    let artifacts = lake.list_artifacts()?;
    let missing = Artifact::ALL
        .iter()
        .filter(|a| !artifacts.iter().any(|r| r.name == a.name()))
        .map(|a| a.name())
        .collect();
    Ok(StatusResult {
        data_dir: lake.root.clone(),
        artifacts,
        missing,
        recent_runs: lake.recent_runs(runs)?,
    })
}

// === config ===

#[derive(Serialize)]
pub struct ConfigShowResult {
    pub data_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    pub output_format: Resolved<OutputFormat>,
    /// Masked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_api_key: Option<Resolved<String>>,
    pub tmdb_pages: Resolved<u32>,
    pub tmdb_base_url: Resolved<String>,
}

impl Output for ConfigShowResult {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Data directory: {}", self.data_dir.display())];
        match self.config_path {
            Some(ref path) => lines.push(format!("Config file: {}", path.display())),
            None => lines.push("Config file: (not initialized)".to_string()),
        }
        lines.push(String::new());
        lines.push(format!(
            "  output-format  {} ({})",
            self.output_format.value, self.output_format.source
        ));
        match self.tmdb_api_key {
            Some(ref key) => lines.push(format!("  tmdb-api-key   {} ({})", key.value, key.source)),
            None => lines.push("  tmdb-api-key   (not set)".to_string()),
        }
        lines.push(format!(
            "  tmdb-pages     {} ({})",
            self.tmdb_pages.value, self.tmdb_pages.source
        ));
        lines.push(format!(
            "  tmdb-base-url  {} ({})",
            self.tmdb_base_url.value, self.tmdb_base_url.source
        ));
        lines.join("\n")
    }
}

/// Show the resolved configuration. Works before `lens init`.
pub fn config_show(data_dir: &Path, overrides: &ConfigOverrides) -> Result<ConfigShowResult> {
    let lake = if Lakehouse::exists(data_dir) {
        Some(Lakehouse::open(data_dir)?)
    } else {
        None
    };
    let resolved = resolve_config(lake.as_ref(), overrides)?;
    Ok(ConfigShowResult {
        data_dir: data_dir.to_path_buf(),
        config_path: lake.as_ref().map(Lakehouse::config_kdl_path),
        tmdb_api_key: resolved.masked_api_key(),
        output_format: resolved.output_format,
        tmdb_pages: resolved.tmdb_pages,
        tmdb_base_url: resolved.tmdb_base_url,
    })
}

#[derive(Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    pub path: PathBuf,
}

impl Output for ConfigSetResult {
    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path.display())
    }
}

pub fn config_set(data_dir: &Path, key: &str, value: &str) -> Result<ConfigSetResult> {
    let lake = Lakehouse::open(data_dir)?;
    let mut config = lake.read_config()?;
    config.set(key, value).map_err(Error::Config)?;
    lake.write_config(&config)?;
    tracing::info!(key, "config updated");

    let shown = if key == "tmdb-api-key" {
        mask_secret(value)
    } else {
        value.to_string()
    };
    Ok(ConfigSetResult {
        key: key.to_string(),
        value: shown,
        path: lake.config_kdl_path(),
    })
}
