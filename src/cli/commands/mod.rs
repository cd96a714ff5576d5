//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `guess`: Show what filename patterns extract from paths
//! - `library`: Import, list, edit and write tracks in the library database
//! - `settings`: Show or initialize the configuration file

mod guess;
mod library;
mod settings;

use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::db;
use crate::hooks::PathGuessPlugin;

pub use guess::cmd_guess;
pub use library::{cmd_edit, cmd_import, cmd_list, cmd_write};
pub use settings::cmd_config;

/// Path Tagger CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "PATH_TAGGER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the fields guessed from file paths
    Guess {
        /// Paths to guess from (need not exist)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Import a directory of music into the library
    Import {
        /// Path to the directory to import
        path: PathBuf,
        /// Database path (defaults to the configured one)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// List all tracks in the library
    List {
        /// Database path (defaults to the configured one)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Edit a stored track and rewrite its tags
    Edit {
        /// Path of the track's file
        path: PathBuf,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New track number
        #[arg(long, allow_negative_numbers = true)]
        track_num: Option<i64>,
        /// New disc number
        #[arg(long)]
        disc: Option<i64>,
        /// Database path (defaults to the configured one)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Rewrite file tags from the library
    Write {
        /// Only write tracks under this path
        path: Option<PathBuf>,
        /// Database path (defaults to the configured one)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Show the configuration in effect
    Config {
        /// Write the default configuration if no file exists yet
        #[arg(long)]
        init: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref());

    match &cli.command {
        Commands::Guess { paths, json } => cmd_guess(&config, paths, *json),
        Commands::Config { init } => cmd_config(&config, cli.config.as_deref(), *init),
        Commands::Import { path, db } => {
            let rt = Runtime::new()?;
            cmd_import(&rt, &config, path, db.as_deref())
        }
        Commands::List { db } => {
            let rt = Runtime::new()?;
            cmd_list(&rt, &config, db.as_deref())
        }
        Commands::Edit {
            path,
            title,
            track_num,
            disc,
            db,
        } => {
            let rt = Runtime::new()?;
            let edit = crate::library::TrackEdit {
                title: title.clone(),
                track_num: *track_num,
                disc: *disc,
            };
            cmd_edit(&rt, &config, path, edit, db.as_deref())
        }
        Commands::Write { path, db } => {
            let rt = Runtime::new()?;
            cmd_write(&rt, &config, path.as_deref(), db.as_deref())
        }
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Load the config from `path`, or from the default location.
pub(crate) fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => config::load_from(path),
        None => config::load(),
    }
}

/// Build the path-guessing plugin, failing on invalid patterns or placeholders.
pub(crate) fn build_plugin(config: &Config) -> anyhow::Result<PathGuessPlugin> {
    PathGuessPlugin::from_config(config)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))
}

/// Open the library database, preferring an explicit `--db` path.
pub(crate) async fn open_db(config: &Config, db_path: Option<&Path>) -> anyhow::Result<SqlitePool> {
    let path = db_path.unwrap_or(&config.library.database);
    let url = db::db_url(Some(path));
    db::init_db(&url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database {}: {e}", path.display()))
}
