//! Path Tagger - fills missing music tags from file paths.
//!
//! Imports audio files into a SQLite library. Fields a file's tags leave
//! blank are guessed from its filename and directory, or filled with a
//! configured placeholder so every stored record is complete. Placeholders
//! are kept out of the tags written back to files.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod guess;
pub mod hooks;
pub mod library;
pub mod metadata;
pub mod model;
pub mod policy;
pub mod reconcile;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log filter used when `RUST_LOG` is unset. Events carry per-module
/// targets, so those are listed next to the crate itself.
const DEFAULT_LOG_FILTER: &str =
    "warn,path_tagger=info,library=info,db=info,hooks=info,guess=info,reconcile=info,metadata=info";

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    cli::run_command(&args)
}
