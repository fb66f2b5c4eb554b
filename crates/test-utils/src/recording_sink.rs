use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use packwatch::reload::ReloadSink;

/// Reload sink that only counts notifications.
///
/// Clones share the same counter, so a test can keep one and hand the other
/// to the runtime.
#[derive(Debug, Clone, Default)]
pub struct RecordingReloadSink {
    count: Arc<AtomicUsize>,
}

impl RecordingReloadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ReloadSink for RecordingReloadSink {
    fn broadcast_reload(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
