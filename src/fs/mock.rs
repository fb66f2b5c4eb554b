// src/fs/mock.rs

use super::{EntryKind, FileSystem};
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory filesystem for tests.
///
/// Paths are stored exactly as given; `canonicalize` is the identity for
/// known paths, so tests should use absolute paths throughout.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, EntryKind>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), EntryKind::File);
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), EntryKind::Dir);
    }

    pub fn add_special(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), EntryKind::Special);
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.lock().remove(path.as_ref());
    }

    fn insert(&self, path: &Path, entry: EntryKind) {
        let mut entries = self.lock();
        // Parent directories exist implicitly.
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(EntryKind::Dir);
        }
        entries.insert(path.to_path_buf(), entry);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, EntryKind>> {
        // A panic while holding the lock only happens inside a failing test.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FileSystem for MockFileSystem {
    fn entry_kind(&self, path: &Path) -> Option<EntryKind> {
        self.lock().get(path).copied()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        if self.entry_kind(path).is_some() {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("No such file or directory: {:?}", path))
        }
    }
}
