// src/watch/event_handler.rs

//! Event processing logic for filesystem changes.

use notify::Event;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::types::{ChangeClass, ChangeKind, FsChange};
use crate::watch::patterns::WatchSource;

/// Find the first path of a raw `notify` event that warrants a rebuild.
///
/// One raw event maps to at most one rebuild trigger, even when it carries
/// several paths (e.g. both halves of a rename).
pub fn relevant_change(source: &WatchSource, event: &Event) -> Option<(String, ChangeClass)> {
    let kind = ChangeKind::from_event_kind(&event.kind);
    if kind.is_ignored() {
        return None;
    }

    event
        .paths
        .iter()
        .find_map(|path| source.classify_change(&FsChange::new(path.clone(), kind)))
}

/// Classify a single raw event and forward it to the runtime if relevant.
///
/// Returns `false` once the runtime channel is closed, so the caller can
/// stop its loop.
pub async fn process_event(
    source: &WatchSource,
    event: Event,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    let Some((path, class)) = relevant_change(source, &event) else {
        debug!(kind = ?event.kind, paths = ?event.paths, "ignoring irrelevant change");
        return true;
    };

    info!(path = %path, %class, "change detected");

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::ChangeDetected { path, class })
        .await
    {
        warn!("failed to send RuntimeEvent::ChangeDetected: {err}");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use notify::EventKind;
    use notify::event::{CreateKind, DataChange, ModifyKind, RenameMode};

    use crate::fs::mock::MockFileSystem;
    use crate::watch::WatchRule;

    fn source(fs: &MockFileSystem) -> WatchSource {
        fs.add_dir("/proj");
        let rule = WatchRule {
            root: PathBuf::from("/proj"),
            paths: vec![PathBuf::from(".")],
            source: vec!["src/**/*.rs".to_string()],
            manifest: vec!["Cargo.toml".to_string()],
        };
        WatchSource::configure(rule, Arc::new(fs.clone())).unwrap()
    }

    fn modify(path: &str) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from(path))
    }

    #[test]
    fn picks_first_relevant_path() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/README.md");
        fs.add_file("/proj/src/lib.rs");
        let src = source(&fs);

        let event = modify("/proj/README.md").add_path(PathBuf::from("/proj/src/lib.rs"));
        assert_eq!(
            relevant_change(&src, &event),
            Some(("src/lib.rs".to_string(), ChangeClass::Source))
        );
    }

    #[test]
    fn rename_to_matching_file_is_relevant() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/src/new.rs");
        let src = source(&fs);

        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/proj/src/old.rs"))
            .add_path(PathBuf::from("/proj/src/new.rs"));
        assert_eq!(
            relevant_change(&src, &event).map(|(p, _)| p),
            Some("src/new.rs".to_string())
        );
    }

    #[test]
    fn folder_creation_is_not_relevant() {
        let fs = MockFileSystem::new();
        fs.add_dir("/proj/src/nested.rs");
        let src = source(&fs);

        let event = Event::new(EventKind::Create(CreateKind::Folder))
            .add_path(PathBuf::from("/proj/src/nested.rs"));
        assert!(relevant_change(&src, &event).is_none());
    }

    #[tokio::test]
    async fn relevant_event_is_forwarded() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/Cargo.toml");
        let src = source(&fs);
        let (tx, mut rx) = mpsc::channel(4);

        assert!(process_event(&src, modify("/proj/Cargo.toml"), &tx).await);
        match rx.try_recv() {
            Ok(RuntimeEvent::ChangeDetected { path, class }) => {
                assert_eq!(path, "Cargo.toml");
                assert_eq!(class, ChangeClass::Manifest);
            }
            other => panic!("expected ChangeDetected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_runtime_channel_stops_processing() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/src/lib.rs");
        let src = source(&fs);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        assert!(!process_event(&src, modify("/proj/src/lib.rs"), &tx).await);
    }
}
