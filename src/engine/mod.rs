// src/engine/mod.rs

//! Build supervision engine.
//!
//! - [`core`] holds the pure `BuildSupervisor` state machine: generation
//!   counter, the single current build, and the decision of which exits are
//!   reported and which are discarded.
//! - [`runtime`] is the async IO shell that feeds it filesystem changes and
//!   process completions, launches builds through a
//!   [`BuildBackend`](crate::exec::BuildBackend), and notifies the reload sink.

use std::fmt;

use crate::types::ChangeClass;

/// Identity of one build invocation.
///
/// Ids come from a monotonically increasing generation counter and are
/// captured at launch time, so a completion can always be matched to the
/// build that produced it regardless of OS pid reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildId(pub u64);

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a build process ended, as observed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    /// Non-zero exit. Termination by signal is reported as `-1`.
    Failed(i32),
}

/// Why a build did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildFailure {
    /// The toolchain ran and exited with this code.
    Exit(i32),
    /// The toolchain could not be started at all.
    Launch(String),
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildFailure::Exit(code) => write!(f, "failed with code {code}"),
            BuildFailure::Launch(reason) => write!(f, "could not be started: {reason}"),
        }
    }
}

/// Lifecycle of a single build.
///
/// `Running` is the only non-terminal state; `Superseded` is reachable only
/// from `Running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    Running,
    Succeeded,
    Failed(BuildFailure),
    Superseded,
}

impl BuildState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildState::Running)
    }
}

/// Runtime options shared by the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Stop once the first build reaches a terminal state (`--once`).
    pub exit_after_build: bool,
}

/// Events flowing into the runtime from the watcher and signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A rebuild-relevant file changed (path is root-relative).
    ChangeDetected { path: String, class: ChangeClass },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod runtime;

pub use self::core::{BuildRecord, BuildSupervisor, CoreCommand, CoreStep, ExitDisposition};
pub use runtime::Runtime;
