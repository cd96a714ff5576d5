//! Command-line interface for path-tagger.
//!
//! This module provides CLI commands for previewing filename guesses,
//! importing music into the library, and editing and writing tags.

mod commands;

pub use commands::{Cli, Commands, run_command};
