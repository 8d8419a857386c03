//! `efblink config` - read and edit `~/.efblink/config.ini`.
//!
//! Every subcommand works on an explicit file path and output writer; only
//! [`run`] binds them to the real config file and stdout. Keys and values
//! go through [`resolve`] first, which applies the same [`ConfigKey`]
//! validation the file loader uses, so `set` rejects a bad value before the
//! file is read or rewritten.

use std::io::{self, Write};
use std::path::Path;

use clap::Subcommand;
use efblink::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one value
    Get {
        /// Key as section.name (e.g., arbiter.stale_threshold_ms)
        key: String,
    },

    /// Change one value
    Set {
        /// Key as section.name (e.g., plugin.target)
        key: String,

        /// New value
        value: String,
    },

    /// Print every key with its current value
    List,

    /// Print the config file location
    Path,
}

/// Run a config subcommand against the user's config file.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    let path = config_file_path();
    let mut out = io::stdout().lock();

    match command {
        ConfigCommands::Get { key } => get(&path, &key, &mut out),
        ConfigCommands::Set { key, value } => set(&path, &key, &value, &mut out),
        ConfigCommands::List => list(&path, &mut out),
        ConfigCommands::Path => writeln!(out, "{}", path.display()).map_err(CliError::from),
    }
}

/// Look up `key` and, when given, check `value` against it.
fn resolve(key: &str, value: Option<&str>) -> Result<ConfigKey, CliError> {
    let config_key: ConfigKey = key.parse().map_err(CliError::ConfigKey)?;
    if let Some(value) = value {
        config_key.validate(value).map_err(CliError::ConfigKey)?;
    }
    Ok(config_key)
}

fn get(path: &Path, key: &str, out: &mut impl Write) -> Result<(), CliError> {
    let config_key = resolve(key, None)?;
    let config = ConfigFile::load_from(path)?;
    writeln!(out, "{}", config_key.get(&config))?;
    Ok(())
}

/// Rewrite the file with one value changed.
///
/// An unreadable file is reported, never replaced with defaults.
fn set(path: &Path, key: &str, value: &str, out: &mut impl Write) -> Result<(), CliError> {
    let config_key = resolve(key, Some(value))?;

    let mut config = ConfigFile::load_from(path)?;
    let previous = config_key.get(&config);
    config_key
        .set(&mut config, value)
        .map_err(CliError::ConfigKey)?;
    config.save_to(path)?;

    writeln!(
        out,
        "{}: {} -> {}",
        config_key.name(),
        previous,
        config_key.get(&config)
    )?;
    Ok(())
}

/// One `section.key = value` line per key, aligned on `=`.
fn list(path: &Path, out: &mut impl Write) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    let width = ConfigKey::all()
        .iter()
        .map(|key| key.name().len())
        .max()
        .unwrap_or(0);

    writeln!(out, "# {}", path.display())?;
    for key in ConfigKey::all() {
        writeln!(out, "{:<width$} = {}", key.name(), key.get(&config), width = width)?;
    }
    Ok(())
}
