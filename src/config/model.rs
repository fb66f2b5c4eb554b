// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::watch::WatchRule;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// root = "."
/// paths = ["."]
/// source = ["src/**/*.rs"]
/// manifest = ["Cargo.toml", "Cargo.lock"]
///
/// [build]
/// program = "wasm-pack"
/// args = ["build", "--target", "web", "--release"]
/// ```
///
/// All sections are optional; the defaults describe a standard wasm-pack
/// project.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub build: BuildSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Project root. Patterns are matched against paths relative to it.
    ///
    /// Relative values resolve against the directory of the config file.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directories (relative to `root`) registered recursively with the
    /// filesystem watcher.
    #[serde(default = "default_paths")]
    pub paths: Vec<PathBuf>,

    /// Globs for native module source files.
    #[serde(default = "default_source")]
    pub source: Vec<String>,

    /// Globs for the build manifest and lockfile.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_source() -> Vec<String> {
    vec!["src/**/*.rs".to_string()]
}

fn default_manifest() -> Vec<String> {
    vec!["Cargo.toml".to_string(), "Cargo.lock".to_string()]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            paths: default_paths(),
            source: default_source(),
            manifest: default_manifest(),
        }
    }
}

/// `[build]` section: the fixed toolchain invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

fn default_program() -> String {
    "wasm-pack".to_string()
}

fn default_args() -> Vec<String> {
    ["build", "--target", "web", "--release"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
        }
    }
}

impl BuildSection {
    /// Human readable command line, used in logs and dry-run output.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfig>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct Config {
    pub watch: WatchSection,
    pub build: BuildSection,
    /// Directory that relative `watch.root` values resolve against.
    pub base_dir: PathBuf,
}

impl Config {
    pub(crate) fn new_unchecked(watch: WatchSection, build: BuildSection) -> Self {
        Self {
            watch,
            build,
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Absolute-or-base-relative project root.
    pub fn project_root(&self) -> PathBuf {
        resolve(&self.base_dir, &self.watch.root)
    }

    /// Build the immutable [`WatchRule`] handed to the watch source.
    pub fn watch_rule(&self) -> WatchRule {
        WatchRule {
            root: self.project_root(),
            paths: self.watch.paths.clone(),
            source: self.watch.source.clone(),
            manifest: self.watch.manifest.clone(),
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_wasm_pack_defaults() {
        let raw: RawConfig = toml::from_str("").unwrap();
        assert_eq!(raw.build.program, "wasm-pack");
        assert_eq!(raw.build.command_line(), "wasm-pack build --target web --release");
        assert_eq!(raw.watch.source, vec!["src/**/*.rs"]);
        assert_eq!(raw.watch.manifest, vec!["Cargo.toml", "Cargo.lock"]);
        assert_eq!(raw.watch.paths, vec![PathBuf::from(".")]);
    }

    #[test]
    fn relative_root_resolves_against_base_dir() {
        let raw: RawConfig = toml::from_str("[watch]\nroot = \"web\"\n").unwrap();
        let cfg = Config::new_unchecked(raw.watch, raw.build).with_base_dir("/srv/app");
        assert_eq!(cfg.project_root(), PathBuf::from("/srv/app/web"));
    }
}
