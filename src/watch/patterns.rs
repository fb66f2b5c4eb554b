// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::{PackwatchError, Result};
use crate::fs::FileSystem;
use crate::types::{ChangeClass, ChangeKind, FsChange};
use crate::watch::path_utils::{join_normalized, relative_str};

/// What to watch and which paths count as rebuild-relevant.
///
/// Built once from the loaded config and never modified afterwards:
///
/// - `root` is the project root; patterns match paths relative to it.
/// - `paths` are directories (relative to `root`) observed recursively.
/// - `source` and `manifest` are the two independent relevance classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRule {
    pub root: PathBuf,
    pub paths: Vec<PathBuf>,
    pub source: Vec<String>,
    pub manifest: Vec<String>,
}

/// Compiled watch rule plus the filesystem used to inspect changed paths.
///
/// This is the leaf of the pipeline: it answers "should this change cause a
/// rebuild?" and nothing else.
#[derive(Clone)]
pub struct WatchSource {
    root: PathBuf,
    watch_dirs: Vec<PathBuf>,
    source_set: GlobSet,
    manifest_set: GlobSet,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for WatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSource")
            .field("root", &self.root)
            .field("watch_dirs", &self.watch_dirs)
            .finish_non_exhaustive()
    }
}

impl WatchSource {
    /// Validate the rule's roots against the filesystem and compile its
    /// patterns.
    ///
    /// Fails with `ConfigError` if the project root or any watched path is
    /// missing or not a directory, or if a pattern is not a valid glob.
    pub fn configure(rule: WatchRule, fs: Arc<dyn FileSystem>) -> Result<Self> {
        if !fs.is_dir(&rule.root) {
            return Err(PackwatchError::ConfigError(format!(
                "watch root {:?} does not exist or is not a directory",
                rule.root
            )));
        }
        let root = fs
            .canonicalize(&rule.root)
            .map_err(|e| PackwatchError::ConfigError(format!("{e:#}")))?;

        let mut watch_dirs = Vec::with_capacity(rule.paths.len());
        for rel in &rule.paths {
            let dir = join_normalized(&root, rel);
            if !fs.is_dir(&dir) {
                return Err(PackwatchError::ConfigError(format!(
                    "watched path {:?} does not exist or is not a directory",
                    dir
                )));
            }
            if !watch_dirs.contains(&dir) {
                watch_dirs.push(dir);
            }
        }

        let source_set = build_globset("source", &rule.source)?;
        let manifest_set = build_globset("manifest", &rule.manifest)?;

        debug!(?root, ?watch_dirs, "watch source configured");

        Ok(Self {
            root,
            watch_dirs,
            source_set,
            manifest_set,
            fs,
        })
    }

    /// Canonical project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directories to register with the filesystem watcher.
    pub fn watch_dirs(&self) -> &[PathBuf] {
        &self.watch_dirs
    }

    /// Classify a root-relative, forward-slash path.
    ///
    /// Both classes are checked independently; source wins when a path
    /// happens to match both.
    pub fn classify(&self, rel_path: &str) -> Option<ChangeClass> {
        if self.source_set.is_match(rel_path) {
            Some(ChangeClass::Source)
        } else if self.manifest_set.is_match(rel_path) {
            Some(ChangeClass::Manifest)
        } else {
            None
        }
    }

    /// Full classification of a filesystem change, including the event kind
    /// and the type of entry at the path.
    ///
    /// Returns the root-relative path together with its class.
    pub fn classify_change(&self, change: &FsChange) -> Option<(String, ChangeClass)> {
        if change.kind.is_ignored() {
            return None;
        }

        // Created/modified entries must be regular files right now. A removed
        // path can no longer be inspected, so it is judged by name alone.
        if change.kind != ChangeKind::Removed && !self.fs.is_file(&change.path) {
            return None;
        }

        let rel = relative_str(self.fs.as_ref(), &self.root, &change.path)?;
        let class = self.classify(&rel)?;
        Some((rel, class))
    }

    /// Whether this change should trigger a rebuild.
    pub fn on_change(&self, change: &FsChange) -> bool {
        self.classify_change(change).is_some()
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(field: &str, patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| {
            PackwatchError::ConfigError(format!("invalid {field} glob '{pat}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| PackwatchError::ConfigError(format!("building {field} globset: {e}")))
}
