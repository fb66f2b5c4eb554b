// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// What kind of entry lives at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Fifo, socket, device node, ...
    Special,
}

/// The slice of the filesystem the watch source looks at.
///
/// Classification only needs entry kinds and canonical paths, which keeps it
/// testable without touching the disk.
pub trait FileSystem: Send + Sync + Debug {
    /// Kind of the entry at `path`, following symlinks. `None` if missing.
    fn entry_kind(&self, path: &Path) -> Option<EntryKind>;

    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    fn is_file(&self, path: &Path) -> bool {
        self.entry_kind(path) == Some(EntryKind::File)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.entry_kind(path) == Some(EntryKind::Dir)
    }
}

/// `std::fs` backed implementation.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn entry_kind(&self, path: &Path) -> Option<EntryKind> {
        let meta = fs::metadata(path).ok()?;
        Some(if meta.is_file() {
            EntryKind::File
        } else if meta.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::Special
        })
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_entry_kinds() {
        let dir = std::env::temp_dir();
        let fs = RealFileSystem;
        assert_eq!(fs.entry_kind(&dir), Some(EntryKind::Dir));
        assert!(fs.is_dir(&dir));
        assert_eq!(fs.entry_kind(&dir.join("packwatch-surely-missing")), None);
    }
}
