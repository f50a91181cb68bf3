//! Command-line probe over the canvassing core.
//!
//! # Responsibility
//! - Verify `canvass_core` linkage (`version`).
//! - Print the entries list from a store file, filtered and sorted the same
//!   way the list view renders it (`list`).
//!
//! # Invariants
//! - Read-only: no command writes to the store.

use canvass_core::db::open_db;
use canvass_core::{
    core_version, init_from_config, load_config, query_entries, SortKey, SqliteRecordStore,
    Tracker, TrackerConfig,
};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "canvass", version, about = "Door-to-door canvassing tracker")]
struct Cli {
    /// JSON config file; defaults plus environment overrides when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the core crate version.
    Version,
    /// Print saved entries.
    List {
        /// Store file; overrides the configured path.
        #[arg(long)]
        db: Option<PathBuf>,
        /// Case-insensitive address or homeowner substring.
        #[arg(long, default_value = "")]
        filter: String,
        /// address | status | homeownerName
        #[arg(long, default_value = "address", value_parser = parse_sort_key)]
        sort: SortKey,
    },
}

fn parse_sort_key(value: &str) -> Result<SortKey, String> {
    SortKey::parse(value)
        .ok_or_else(|| format!("unknown sort key `{value}`; expected address|status|homeownerName"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => TrackerConfig::from_env(),
    };
    init_from_config(&config)?;

    match cli.command {
        Commands::Version => {
            println!("canvass_core version={}", core_version());
            Ok(())
        }
        Commands::List { db, filter, sort } => {
            let db_path = db.unwrap_or_else(|| config.db_path.clone());
            list(db_path, &filter, sort, config.serialize_commits).await
        }
    }
}

async fn list(
    db_path: PathBuf,
    filter: &str,
    sort: SortKey,
    serialize_commits: bool,
) -> Result<(), Box<dyn Error>> {
    let conn = open_db(&db_path)?;
    let store = Arc::new(SqliteRecordStore::try_new(conn)?);
    let tracker = Tracker::with_commit_serialization(store, serialize_commits);
    let total = tracker.load().await?;
    log::info!("event=cli_list module=cli status=ok total={total}");

    let entries = tracker.entries();
    let rows = query_entries(&entries, filter, sort);
    for entry in &rows {
        let id = entry.id.as_ref().map(|id| id.as_str()).unwrap_or("-");
        let status = match entry.status.label() {
            "" => "-",
            label => label,
        };
        println!(
            "{id}\t{status}\t{}\t{}\tnotes={}",
            entry.address,
            entry.homeowner_name,
            entry.notes.len()
        );
    }
    println!("{} of {total} entries", rows.len());
    Ok(())
}
