use std::path::{Path, PathBuf};

use packwatch::config::{BuildSection, Config, RawConfig, WatchSection};
use packwatch::watch::WatchRule;

/// Builder for `Config` to simplify test setup.
pub struct ConfigBuilder {
    raw: RawConfig,
    base_dir: PathBuf,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }

    pub fn base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.raw.watch.root = root.as_ref().to_path_buf();
        self
    }

    /// Replace the watched directories (relative to the root).
    pub fn watch_paths(mut self, paths: &[&str]) -> Self {
        self.raw.watch.paths = paths.iter().map(PathBuf::from).collect();
        self
    }

    pub fn source(mut self, patterns: &[&str]) -> Self {
        self.raw.watch.source = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn manifest(mut self, patterns: &[&str]) -> Self {
        self.raw.watch.manifest = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Use `sh -c <script>` as the toolchain.
    pub fn shell_build(mut self, script: &str) -> Self {
        self.raw.build = BuildSection {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        };
        self
    }

    pub fn program(mut self, program: &str, args: &[&str]) -> Self {
        self.raw.build = BuildSection {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        };
        self
    }

    pub fn build(self) -> Config {
        Config::try_from(self.raw)
            .expect("Failed to build valid config from builder")
            .with_base_dir(self.base_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The default rule (`src/**/*.rs` + `Cargo.toml`/`Cargo.lock`) rooted at
/// `root`.
pub fn default_rule(root: impl AsRef<Path>) -> WatchRule {
    let watch = WatchSection::default();
    WatchRule {
        root: root.as_ref().to_path_buf(),
        paths: watch.paths,
        source: watch.source,
        manifest: watch.manifest,
    }
}
