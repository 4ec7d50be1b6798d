mod config;
mod console;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use helpdesk_core::{FlowContext, FlowOutcome, FlowRunner};
use helpdesk_db::Database;
use helpdesk_logging::{LogFormat, Logger, TranscriptWriter};

use crate::config::ProjectConfig;
use crate::console::ConsoleHost;

#[derive(Parser, Debug)]
#[command(
    name = "helpdesk",
    about = "Conversational help desk intake for facility records",
    version,
    author
)]
struct Cli {
    /// Database file (default: the platform data directory)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Directory to look for helpdesk.toml in (default: current directory)
    #[arg(short = 'c', long)]
    config_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormatChoice>,

    /// Output the final outcome as JSON
    #[arg(long)]
    json_output: bool,

    /// Skip writing a session transcript
    #[arg(long)]
    no_transcript: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = cli.config_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let config = ProjectConfig::load(&config_dir)?.unwrap_or_default();

    let log_format = resolve_log_format(&cli, &config)?;
    helpdesk_logging::init_tracing("info", log_format);
    let logger = Arc::new(Logger::new(log_format));

    let database = open_database(&cli, &config)?;

    // Handle Ctrl+C gracefully: the next prompt turns into abandonment.
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupt_flag = interrupted.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted.");
        interrupt_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let host = ConsoleHost::new(interrupted);
    let context = FlowContext::new();

    let mut runner = FlowRunner::new(&host, &database, logger);
    if !cli.no_transcript {
        match TranscriptWriter::new(&context.session_id.to_string()) {
            Ok(transcript) => runner = runner.with_transcript(transcript),
            Err(e) => eprintln!("Warning: could not open session transcript: {}", e),
        }
    }

    let outcome = runner.run(context).await?;

    if cli.json_output {
        let json = serde_json::to_string_pretty(&outcome)?;
        println!("{}", json);
    } else {
        print_outcome(&outcome);
    }

    process::exit(outcome.exit_code());
}

/// Priority: CLI flag > config file > pretty
fn resolve_log_format(cli: &Cli, config: &ProjectConfig) -> Result<LogFormat> {
    if let Some(choice) = cli.log_format {
        return Ok(choice.into());
    }
    if let Some(ref name) = config.log_format {
        return name
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Invalid log_format in helpdesk.toml: {}", e));
    }
    Ok(LogFormat::Pretty)
}

/// Priority: CLI flag > config file > platform default
fn open_database(cli: &Cli, config: &ProjectConfig) -> Result<Database> {
    match cli.db.clone().or_else(|| config.db_path.clone()) {
        Some(path) => Database::open_at(&path)
            .with_context(|| format!("Failed to open database at {}", path.display())),
        None => Database::open().context("Failed to open the default database"),
    }
}

fn print_outcome(outcome: &FlowOutcome) {
    match outcome {
        FlowOutcome::Saved {
            id,
            record,
            duration_secs,
        } => {
            eprintln!();
            eprintln!("=== SAVED ===");
            eprintln!("Record: #{}", id);
            eprintln!(
                "Where: {} / {} at {}",
                record.department, record.section, record.location
            );
            eprintln!("Duration: {:.1}s", duration_secs);
        }
        FlowOutcome::Discarded { duration_secs } => {
            eprintln!();
            eprintln!("=== DISCARDED ===");
            eprintln!("Nothing was saved.");
            eprintln!("Duration: {:.1}s", duration_secs);
        }
        FlowOutcome::Found {
            department,
            section,
            matches,
            duration_secs,
        } => {
            eprintln!();
            eprintln!("=== FOUND ===");
            eprintln!(
                "Matches: {} for {} / {}",
                matches.len(),
                department,
                section
            );
            eprintln!("Duration: {:.1}s", duration_secs);
        }
        FlowOutcome::Abandoned {
            step,
            duration_secs,
        } => {
            eprintln!();
            eprintln!("=== ABANDONED ===");
            eprintln!("Stopped at: {}", step);
            eprintln!("Duration: {:.1}s", duration_secs);
        }
    }
}
