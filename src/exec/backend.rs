// src/exec/backend.rs

//! Pluggable build backend abstraction.
//!
//! The runtime talks to a `BuildBackend` instead of spawning processes
//! itself. Production code uses [`ProcessBackend`](super::ProcessBackend);
//! tests provide a backend whose completions they fire by hand.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::oneshot;

use crate::engine::{BuildId, BuildOutcome};
use crate::errors::Result;

/// One-shot completion of a launched build.
///
/// Resolves exactly once with the process outcome. Dropping it before it
/// resolves must stop the underlying work.
pub type BuildCompletion = Pin<Box<dyn Future<Output = BuildOutcome> + Send + 'static>>;

/// Everything the runtime keeps about one launched build.
///
/// - `cancel` requests termination. Sending is non-blocking and the
///   completion still resolves with the real exit afterwards.
/// - `completion` is polled by the runtime, tagged with `id`.
pub struct BuildHandle {
    pub id: BuildId,
    pub cancel: oneshot::Sender<()>,
    pub completion: BuildCompletion,
}

impl fmt::Debug for BuildHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Trait abstracting how a build is started.
///
/// `launch` must not block on the build itself: it starts the work and
/// returns immediately. An `Err` means the toolchain could not be started.
pub trait BuildBackend: Send {
    fn launch(&mut self, id: BuildId) -> Result<BuildHandle>;
}
