//! Reportwright CLI - Compile report drafts to report specifications
//!
//! Usage:
//!   reportwright compile <draft.json>
//!   reportwright validate <draft.json>
//!   reportwright apply <record.json> <events.json> --catalog <catalog.json>
//!   reportwright load <record.json> --catalog <catalog.json>
//!
//! Examples:
//!   reportwright compile drafts/vm_inventory.json
//!   reportwright apply saved/vm_inventory.json edits.json --catalog catalog.json

use clap::{Parser, Subcommand};
use reportwright::catalog::StaticCatalog;
use reportwright::config::Settings;
use reportwright::model::{DraftReportState, ReportRecord};
use reportwright::session::{EditEvent, EditSession};
use reportwright::store::MemoryStore;
use reportwright::validation::validate_for_save;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reportwright")]
#[command(about = "Reportwright - Compile report drafts to report specifications")]
#[command(version)]
struct Cli {
    /// Path to a settings file (overrides discovery)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a draft to a report specification
    Compile {
        /// Path to the draft JSON file
        file: PathBuf,
    },

    /// Validate a draft without compiling it
    Validate {
        /// Path to the draft JSON file
        file: PathBuf,
    },

    /// Apply a list of edit events to a saved report and save it again
    Apply {
        /// Path to the report record JSON file
        record: PathBuf,

        /// Path to a JSON array of edit events
        events: PathBuf,

        /// Field catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Rebuild the editable draft of a saved report
    Load {
        /// Path to the report record JSON file
        record: PathBuf,

        /// Field catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings);

    match cli.command {
        Commands::Compile { file } => cmd_compile(file),
        Commands::Validate { file } => cmd_validate(file),
        Commands::Apply {
            record,
            events,
            catalog,
        } => cmd_apply(record, events, catalog, settings),
        Commands::Load { record, catalog } => cmd_load(record, catalog, settings),
    }
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&source).map_err(|e| format!("Error parsing '{}': {}", path.display(), e))
}

fn read_catalog(path: Option<PathBuf>) -> Result<StaticCatalog, String> {
    match path {
        Some(path) => read_json(&path),
        None => Ok(StaticCatalog::new()),
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_compile(file: PathBuf) -> ExitCode {
    let draft: DraftReportState = match read_json(&file) {
        Ok(draft) => draft,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match reportwright::compile(&draft) {
        Ok(spec) => print_json(&spec),
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_validate(file: PathBuf) -> ExitCode {
    let draft: DraftReportState = match read_json(&file) {
        Ok(draft) => draft,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = validate_for_save(&draft);
    if report.is_ok() {
        println!("OK: {} is valid", file.display());
        return ExitCode::SUCCESS;
    }

    eprintln!("Validation errors:");
    for error in report.errors() {
        eprintln!("  [{}] {}", error.tab, error.message);
    }
    ExitCode::FAILURE
}

fn cmd_apply(
    record: PathBuf,
    events: PathBuf,
    catalog: Option<PathBuf>,
    settings: Settings,
) -> ExitCode {
    let loaded = read_json::<ReportRecord>(&record).and_then(|record| {
        let events: Vec<EditEvent> = read_json(&events)?;
        let catalog = read_catalog(catalog)?;
        Ok((record, events, catalog))
    });
    let (record, events, catalog) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = match EditSession::edit(&record, settings, Box::new(catalog)) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Load error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for (index, event) in events.into_iter().enumerate() {
        match session.apply(event) {
            Ok(outcome) => {
                for warning in &outcome.warnings {
                    eprintln!("Warning (event {}): {}", index + 1, warning);
                }
            }
            Err(e) => {
                eprintln!("Edit {} rejected: {}", index + 1, e);
                return ExitCode::FAILURE;
            }
        }
    }

    let mut store = MemoryStore::new();
    let saved = session
        .save(&mut store)
        .map(|id| store.get(&id).cloned());
    match saved {
        Ok(Some(record)) => print_json(&record),
        Ok(None) => {
            eprintln!("Save error: record was not stored");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Save error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_load(record: PathBuf, catalog: Option<PathBuf>, settings: Settings) -> ExitCode {
    let loaded = read_json::<ReportRecord>(&record)
        .and_then(|record| Ok((record, read_catalog(catalog)?)));
    let (record, catalog) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match reportwright::load::load(&record, &catalog, &settings.models) {
        Ok(draft) => print_json(&draft),
        Err(e) => {
            eprintln!("Load error: {}", e);
            ExitCode::FAILURE
        }
    }
}
