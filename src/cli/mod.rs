//! CLI argument definitions for Lifelens.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("LENS_GIT_COMMIT"),
    ", built ",
    env!("LENS_BUILD_TIMESTAMP"),
    ")"
);

/// Lifelens - personal analytics over watch history, tasks, calendar and movies.
///
/// Start with `lens init`, land raw exports with `lens ingest`, build the
/// tables with `lens run`, then read `lens report` or open `lens dashboard`.
#[derive(Parser, Debug)]
#[command(name = "lens")]
#[command(author, version, long_version = LONG_VERSION, about = "A personal analytics pipeline and rule-based dashboard", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Data directory holding the bronze/silver/gold layers.
    /// Defaults to the platform data directory (e.g. ~/.local/share/lifelens).
    #[arg(long = "data-dir", global = true, env = "LENS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). LENS_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, layer folders and catalog
    Init,

    /// Land raw records in the bronze layer
    ///
    /// Each flag names one source. Sources are tried independently: one
    /// failing or empty source leaves its bronze file untouched.
    Ingest {
        /// Watch-history export (JSON, JSON lines or .csv)
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// Task export (JSON, JSON lines or .csv)
        #[arg(long, value_name = "FILE")]
        tasks: Option<PathBuf>,

        /// Calendar events export (JSON)
        #[arg(long, value_name = "FILE")]
        calendar: Option<PathBuf>,

        /// Movie catalog export
        #[arg(long, value_name = "FILE", conflicts_with = "tmdb")]
        movies: Option<PathBuf>,

        /// Pull the movie catalog from the TMDB popular listing
        #[arg(long)]
        tmdb: bool,

        /// Pages to pull with --tmdb (overrides config)
        #[arg(long, value_name = "N", requires = "tmdb", value_parser = clap::value_parser!(u32).range(1..=500))]
        tmdb_pages: Option<u32>,
    },

    /// Check the bronze files before transforming them
    Audit,

    /// Build the silver (canonical) tables from bronze
    Transform,

    /// Build the gold (fact) tables from silver
    Aggregate,

    /// Build silver then gold
    Run,

    /// Show built artifacts and recent runs
    Status {
        /// Number of recent runs to show
        #[arg(long, default_value = "5")]
        runs: usize,
    },

    /// Historical totals and the daily timeline
    Report,

    /// Work rhythm, focus balance and viewer profile
    Diagnose,

    /// Trend state and tomorrow's predicted hours
    Forecast,

    /// Work strategy, movie permission and a recommendation
    Action {
        /// Skip these titles, as if rejected in a dashboard session
        #[arg(long = "reject", value_name = "TITLE")]
        reject: Vec<String>,

        /// Acknowledge the risk and allow one recommendation during a sharp drop
        #[arg(long = "override")]
        override_denial: bool,
    },

    /// Interactive session reading commands from stdin
    ///
    /// Commands: report, diagnose, forecast, action, accept, reject, reset,
    /// override, help, quit.
    Dashboard,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show every setting with the layer it was resolved from
    Show,

    /// Set a value in the data directory's config.kdl
    Set {
        /// One of: output-format, tmdb-api-key, tmdb-pages, tmdb-base-url
        key: String,
        /// New value
        value: String,
    },
}

impl Commands {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Init => "init",
            Commands::Ingest { .. } => "ingest",
            Commands::Audit => "audit",
            Commands::Transform => "transform",
            Commands::Aggregate => "aggregate",
            Commands::Run => "run",
            Commands::Status { .. } => "status",
            Commands::Report => "report",
            Commands::Diagnose => "diagnose",
            Commands::Forecast => "forecast",
            Commands::Action { .. } => "action",
            Commands::Dashboard => "dashboard",
            Commands::Config { .. } => "config",
        }
    }
}
