//! Configuration display and initialization.

use std::path::Path;

use crate::config::{self, Config};

/// Print the config file location and the configuration in effect.
///
/// With `init`, writes `config` (the defaults, when no file exists yet) to
/// that location. An existing file is never overwritten.
pub fn cmd_config(config: &Config, explicit_path: Option<&Path>, init: bool) -> anyhow::Result<()> {
    let path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => config::config_path().ok_or(config::ConfigError::NoConfigDir)?,
    };

    if init {
        if path.exists() {
            println!("Config file already exists: {}", path.display());
        } else {
            config::save_to(config, &path)?;
            println!("Wrote default config to {}", path.display());
        }
    } else {
        let state = if path.exists() { "" } else { " (not present, using defaults)" };
        println!("# Config file: {}{state}", path.display());
    }

    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
