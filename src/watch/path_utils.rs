// src/watch/path_utils.rs

//! Path helpers shared by the watch source.

use std::path::{Component, Path, PathBuf};

use crate::fs::FileSystem;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (symlinked prefixes, `/private/var` vs `/var` on macOS),
///   we canonicalize both paths and try again. A removed file can no longer
///   be canonicalized, so only its parent is resolved in that case.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(fs: &dyn FileSystem, root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = fs.canonicalize(root).ok()?;
    let path_canon = fs.canonicalize(path).ok().or_else(|| {
        let parent = fs.canonicalize(path.parent()?).ok()?;
        Some(parent.join(path.file_name()?))
    })?;

    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(to_slash)
}

/// Join `rel` onto `base`, dropping `.` components.
pub fn join_normalized(base: &Path, rel: &Path) -> PathBuf {
    base.join(rel)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
