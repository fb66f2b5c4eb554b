// src/reload.rs

//! Reload sinks: where "the build succeeded, refresh now" is delivered.
//!
//! The contract is a single fire-and-forget trigger with no payload and no
//! acknowledgement. Sinks must not block the runtime loop.

use std::fmt;
use std::io::Write;

use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Notification primitive for a live development session.
pub trait ReloadSink: Send {
    fn broadcast_reload(&self);
}

/// The message delivered to broadcast subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMessage {
    FullReload,
}

impl fmt::Display for ReloadMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadMessage::FullReload => f.write_str(r#"{"type":"full-reload"}"#),
        }
    }
}

/// Fan-out sink for in-process consumers (e.g. a dev server's websocket
/// handlers), backed by `tokio::sync::broadcast`.
///
/// Having no subscribers is not an error: the reload simply goes nowhere.
#[derive(Debug, Clone)]
pub struct BroadcastReloadSink {
    tx: broadcast::Sender<ReloadMessage>,
}

impl BroadcastReloadSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastReloadSink {
    fn default() -> Self {
        Self::new(16)
    }
}

impl ReloadSink for BroadcastReloadSink {
    fn broadcast_reload(&self) {
        match self.tx.send(ReloadMessage::FullReload) {
            Ok(n) => debug!(subscribers = n, "reload broadcast"),
            Err(_) => debug!("reload broadcast with no subscribers"),
        }
    }
}

/// Writes one `{"type":"full-reload"}` line to stdout per reload.
///
/// Used by the host binary so a parent dev server can consume reloads by
/// reading our stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutReloadSink;

impl ReloadSink for StdoutReloadSink {
    fn broadcast_reload(&self) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", ReloadMessage::FullReload).and_then(|_| out.flush()) {
            warn!(error = %e, "failed to write reload notification");
        }
    }
}
