// src/types.rs

use std::fmt;
use std::path::PathBuf;

use notify::EventKind;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};

/// Which relevance class a changed path falls into.
///
/// Both classes trigger a rebuild; the distinction only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClass {
    /// A file of the native module source tree.
    Source,
    /// A build manifest or lockfile.
    Manifest,
}

impl fmt::Display for ChangeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeClass::Source => f.write_str("source"),
            ChangeClass::Manifest => f.write_str("manifest"),
        }
    }
}

/// Simplified view of a filesystem event kind.
///
/// `notify` reports a lot of detail that is irrelevant for deciding whether
/// to rebuild; this collapses it into what the watch source cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    DirectoryCreated,
    DirectoryRemoved,
    /// Access, metadata-only and unknown events.
    Other,
}

impl ChangeKind {
    pub fn from_event_kind(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(CreateKind::Folder) => ChangeKind::DirectoryCreated,
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(RemoveKind::Folder) => ChangeKind::DirectoryRemoved,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Other,
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Removed,
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Created,
            EventKind::Modify(_) => ChangeKind::Modified,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => ChangeKind::Other,
        }
    }

    /// Directory-level and non-content events never trigger a rebuild.
    pub fn is_ignored(self) -> bool {
        matches!(
            self,
            ChangeKind::DirectoryCreated | ChangeKind::DirectoryRemoved | ChangeKind::Other
        )
    }
}

/// A single changed path together with what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl FsChange {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}
