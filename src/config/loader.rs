// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{Config, RawConfig};
use crate::errors::Result;

/// File name looked up in the current directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "Packwatch.toml";

/// Load a configuration file from a given path and return the raw `RawConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// The returned config's `base_dir` is the directory containing the file, so
/// a relative `[watch].root` is interpreted next to the config.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = Config::try_from(raw_config)?.with_base_dir(config_base_dir(path));
    Ok(config)
}

/// Resolve the config used by the host binary.
///
/// - An explicitly requested file must exist.
/// - Otherwise `Packwatch.toml` in the current directory is used if present,
///   and built-in defaults if not.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default_path.is_file() {
        return load_and_validate(&default_path);
    }

    debug!("no {DEFAULT_CONFIG_FILE} found; using built-in defaults");
    let config = Config::try_from(RawConfig::default())?.with_base_dir(current_dir());
    Ok(config)
}

/// Figure out the directory relative config values resolve against.
///
/// - If the config path has a non-empty parent (e.g. "web/Packwatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Packwatch.toml" (parent = ""),
///   we fall back to the current working directory.
fn config_base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => current_dir(),
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
