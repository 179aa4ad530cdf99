//! Command-line front end for Zenith Notes.
//!
//! # Responsibility
//! - Open the SQLite store and drive the same API handlers a router would.
//! - Print the JSON envelope of every call, exiting non-zero on failure.

use clap::{Parser, Subcommand};
use log::debug;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use zenith_core::api::{self, ApiReply};
use zenith_core::db::open_db;
use zenith_core::{
    core_version, default_log_level, init_logging, LogSink, NotePatch, NoteService, SqliteKvStore,
};

#[derive(Debug, Parser)]
#[command(name = "zenith", version, about = "Manage Zenith notes stored in SQLite")]
struct Cli {
    /// SQLite database file; created and migrated on first use.
    #[arg(long, env = "ZENITH_DB", default_value = "zenith.sqlite3")]
    db: PathBuf,

    /// One of trace|debug|info|warn|error.
    #[arg(long, env = "ZENITH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; logs go to stderr otherwise.
    #[arg(long, env = "ZENITH_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all notes, newest first (seeds on first use).
    List,
    /// Create a blank note.
    Create,
    /// Show one note.
    Get { id: String },
    /// Change a note's title and/or content.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note.
    Delete { id: String },
    /// Drop index entries whose note record is missing.
    Prune,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = setup_logging(&cli) {
        eprintln!("zenith: {err}");
        return ExitCode::FAILURE;
    }
    debug!("event=cli_start module=cli status=ok core_version={}", core_version());

    let conn = match open_db(&cli.db) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("zenith: cannot open `{}`: {err}", cli.db.display());
            return ExitCode::FAILURE;
        }
    };
    let store = match SqliteKvStore::try_new(&conn) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("zenith: {err}");
            return ExitCode::FAILURE;
        }
    };
    let service = NoteService::new(&store);

    match cli.command {
        Command::List => emit(&api::list_notes(&service)),
        Command::Create => emit(&api::create_note(&service)),
        Command::Get { id } => emit(&api::get_note(&service, &id)),
        Command::Update { id, title, content } => {
            let patch = NotePatch { title, content };
            match serde_json::to_string(&patch) {
                Ok(body) => emit(&api::update_note(&service, &id, &body)),
                Err(err) => {
                    eprintln!("zenith: cannot encode update: {err}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::Delete { id } => emit(&api::delete_note(&service, &id)),
        Command::Prune => {
            let reply = match service.prune_index() {
                Ok(pruned) => ApiReply::ok(pruned),
                Err(err) => api::error_reply("prune_index", &err),
            };
            emit(&reply)
        }
    }
}

fn setup_logging(cli: &Cli) -> Result<(), String> {
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let sink = match cli.log_dir.as_deref() {
        Some(dir) => LogSink::directory(dir)?,
        None => LogSink::Stderr,
    };
    init_logging(level, sink)
}

fn emit<T: Serialize>(reply: &ApiReply<T>) -> ExitCode {
    match reply.to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("zenith: cannot encode response: {err}");
            return ExitCode::FAILURE;
        }
    }

    if reply.body.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
