//! Jot CLI
//!
//! Command-line front end for a jot log file

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use jot::{JotConfig, JotFile, Record};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "jot")]
#[command(about = "Append-only log of short text entries", version)]
struct Args {
    /// Path to the log file [default: jot.bin]
    #[arg(short = 'f', long, env = "JOT_FILE")]
    file: Option<PathBuf>,

    /// TOML config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Do not take the exclusive file lock
    #[arg(long)]
    no_lock: bool,

    /// fsync after every write
    #[arg(long)]
    sync: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a new entry
    Add {
        /// Entry text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Mark an entry deleted
    Rm { id: u64 },
    /// Show entries
    List {
        /// Include deleted entries
        #[arg(short, long)]
        all: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show a single entry
    Search {
        id: u64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Scan the log and report damage
    Check,
    /// Truncate a torn record at the end of the log
    Repair,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<JotConfig> {
    let mut config = match &args.config {
        Some(path) => JotConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => JotConfig::default(),
    };

    if let Some(file) = &args.file {
        config.path = file.clone();
    }
    if args.no_lock {
        config.lock = false;
    }
    if args.sync {
        config.sync_writes = true;
    }

    Ok(config)
}

fn format_record(record: &Record) -> String {
    let when = DateTime::from_timestamp(record.timestamp() as i64, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.timestamp().to_string());

    format!("[{}] [{}] {}", when, record.id(), record.text_lossy())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    debug!(?config, "Resolved configuration");

    let mut jot = JotFile::open_with(&config)
        .with_context(|| format!("failed to open {}", config.path.display()))?;

    match args.command {
        Command::Add { text } => {
            let record = jot.add(text.join(" ").as_bytes())?;
            debug!(id = record.id(), "Added entry");
        }
        Command::Rm { id } => {
            jot.remove(id)?;
        }
        Command::List { all, json } => {
            let records: Vec<Record> = jot
                .list()?
                .into_iter()
                .filter(|r| all || !r.is_deleted())
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    println!("{}", format_record(record));
                }
            }
        }
        Command::Search { id, json } => {
            let (record, _) = jot.search(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", format_record(&record));
            }
        }
        Command::Check => {
            let report = jot.check()?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_clean() {
                bail!("log {} failed integrity check", config.path.display());
            }
        }
        Command::Repair => {
            let removed = jot.repair()?;
            if removed == 0 {
                println!("nothing to repair");
            } else {
                println!("removed {} trailing bytes", removed);
            }
        }
    }

    Ok(())
}
