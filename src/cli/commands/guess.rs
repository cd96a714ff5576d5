//! Filename guessing preview.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::Config;
use crate::guess::{GuessedFields, PathGuesser};

/// Print the fields guessed from each path.
///
/// Uses the configured patterns even when guessing is disabled, so patterns
/// can be tried out before being switched on.
pub fn cmd_guess(config: &Config, paths: &[PathBuf], json: bool) -> anyhow::Result<()> {
    let guesser = PathGuesser::new(&config.guessing.patterns)?;
    if !config.guessing.enabled {
        eprintln!("Note: guessing is disabled in the configuration; imports will not use it.");
    }

    let guesses: BTreeMap<String, GuessedFields> = paths
        .iter()
        .map(|p| (p.display().to_string(), guesser.guess_fields(p)))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&guesses)?);
        return Ok(());
    }

    for (path, fields) in &guesses {
        println!("{path}");
        for (name, value) in fields {
            println!("  {name:<12} {value}");
        }
    }
    Ok(())
}
