//! Lifelens CLI - a personal analytics pipeline and rule-based dashboard.

use clap::Parser;
use lifelens::cli::{Cli, Commands, ConfigCommands};
use lifelens::commands::{self, IngestRequest, Output};
use lifelens::config::{ConfigOverrides, OutputFormat, resolve_config};
use lifelens::storage::{Lakehouse, get_data_dir};
use std::io;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `LENS_LOG=lifelens=debug`.
const LOG_ENV: &str = "LENS_LOG";

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // -H wins; otherwise the configured output format applies
    let human = cli.human_readable;
    let data_dir = match get_data_dir(cli.data_dir.as_deref()) {
        Ok(dir) => dir,
        Err(e) => exit_with_error(&e, human),
    };

    let mut overrides = ConfigOverrides::new();
    if human {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    let human = human || configured_human(&data_dir, &overrides);

    tracing::debug!(command = cli.command.name(), data_dir = %data_dir.display(), "running command");
    if let Err(e) = run_command(cli.command, &data_dir, overrides, human) {
        exit_with_error(&e, human);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Whether the resolved output format is human. Config problems fall back to JSON.
fn configured_human(data_dir: &Path, overrides: &ConfigOverrides) -> bool {
    let lake = Lakehouse::open(data_dir).ok();
    match resolve_config(lake.as_ref(), overrides) {
        Ok(config) => config.output_format() == OutputFormat::Human,
        Err(e) => {
            tracing::warn!(error = %e, "could not read config, using defaults");
            false
        }
    }
}

fn exit_with_error(e: &lifelens::Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", e);
        if matches!(e, lifelens::Error::NotInitialized) {
            eprintln!("\nTo initialize a data directory:\n    lens init");
        }
    } else {
        let err = match e {
            lifelens::Error::NotInitialized => serde_json::json!({
                "error": e.to_string(),
                "hint": "Run 'lens init' to create the data directory.",
            }),
            _ => serde_json::json!({ "error": e.to_string() }),
        };
        eprintln!("{}", err);
    }
    process::exit(1);
}

fn run_command(
    command: Commands,
    data_dir: &Path,
    overrides: ConfigOverrides,
    human: bool,
) -> Result<(), lifelens::Error> {
    match command {
        Commands::Init => output(&commands::init(data_dir)?, human),
        Commands::Ingest {
            history,
            tasks,
            calendar,
            movies,
            tmdb,
            tmdb_pages,
        } => {
            let overrides = match tmdb_pages {
                Some(pages) => overrides.with_tmdb_pages(pages),
                None => overrides,
            };
            let lake = Lakehouse::open(data_dir)?;
            let config = resolve_config(Some(&lake), &overrides)?;
            drop(lake);

            let request = IngestRequest {
                history,
                tasks,
                calendar,
                movies,
                tmdb,
            };
            output(&commands::ingest(data_dir, &request, &config)?, human);
        }
        Commands::Audit => output(&commands::audit(data_dir)?, human),
        Commands::Transform => output(&commands::transform(data_dir)?, human),
        Commands::Aggregate => output(&commands::aggregate(data_dir)?, human),
        Commands::Run => output(&commands::run(data_dir)?, human),
        Commands::Status { runs } => output(&commands::status(data_dir, runs)?, human),
        Commands::Report => output(&commands::report(data_dir)?, human),
        Commands::Diagnose => output(&commands::diagnose(data_dir)?, human),
        Commands::Forecast => output(&commands::forecast(data_dir)?, human),
        Commands::Action {
            reject,
            override_denial,
        } => output(&commands::action(data_dir, &reject, override_denial)?, human),
        Commands::Dashboard => {
            let dashboard = commands::load_dashboard(data_dir)?;
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            let session = commands::run_dashboard(&dashboard, stdin.lock(), &mut stdout, human)?;
            tracing::info!(
                rejected = session.rejected.len(),
                accepted = ?session.accepted,
                "dashboard session ended"
            );
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => output(&commands::config_show(data_dir, &overrides)?, human),
            ConfigCommands::Set { key, value } => {
                output(&commands::config_set(data_dir, &key, &value)?, human)
            }
        },
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
