// src/config/validate.rs

use globset::Glob;

use crate::config::model::{Config, RawConfig};
use crate::errors::{PackwatchError, Result};

impl TryFrom<RawConfig> for Config {
    type Error = PackwatchError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(Config::new_unchecked(raw.watch, raw.build))
    }
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    validate_build(cfg)?;
    validate_watch_paths(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn validate_build(cfg: &RawConfig) -> Result<()> {
    if cfg.build.program.trim().is_empty() {
        return Err(PackwatchError::ConfigError(
            "[build].program must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch_paths(cfg: &RawConfig) -> Result<()> {
    if cfg.watch.paths.is_empty() {
        return Err(PackwatchError::ConfigError(
            "[watch].paths must list at least one directory".to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfig) -> Result<()> {
    if cfg.watch.source.is_empty() && cfg.watch.manifest.is_empty() {
        return Err(PackwatchError::ConfigError(
            "[watch] needs at least one `source` or `manifest` pattern".to_string(),
        ));
    }

    for (field, patterns) in [("source", &cfg.watch.source), ("manifest", &cfg.watch.manifest)] {
        for pat in patterns {
            if let Err(e) = Glob::new(pat) {
                return Err(PackwatchError::ConfigError(format!(
                    "[watch].{field} has invalid glob '{pat}': {e}"
                )));
            }
        }
    }
    Ok(())
}
