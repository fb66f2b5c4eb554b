// src/engine/core.rs

//! Pure build supervisor state machine.
//!
//! `BuildSupervisor` consumes "something happened" calls (startup, relevant
//! change, process exit, launch failure, shutdown) and produces:
//! - an updated supervisor state
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! It owns no channels, processes or Tokio types, so the supersession rules
//! can be unit tested deterministically.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::engine::{
    BuildFailure, BuildId, BuildOutcome, BuildState, RuntimeEvent, RuntimeOptions,
};

/// Bookkeeping for the one build the supervisor currently cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRecord {
    pub id: BuildId,
    pub started_at: Instant,
    pub state: BuildState,
}

/// Command produced by the core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Ask the given build's process to stop. Never awaited.
    Terminate(BuildId),
    /// Start a new toolchain process for this build.
    Launch(BuildId),
    /// Log the successful completion of the current build.
    ReportSuccess { id: BuildId, elapsed: Duration },
    /// Tell the reload sink to refresh the consuming session.
    NotifyReload,
    /// Log a failed build. Never fatal.
    ReportFailure { id: BuildId, failure: BuildFailure },
    /// Stop the runtime loop (used with `--once`).
    RequestExit,
}

/// Decision returned by the core after handling a single input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn cont(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Whether an exit belongs to the build the supervisor is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    Current,
    /// A newer build was launched since (or the build was already reported);
    /// the exit is dropped without notification.
    Superseded,
}

/// Owns the generation counter and the single current build slot.
///
/// Invariant: at most one build is `Running`, and it is always the one in
/// `current` with `id == BuildId(generation)`.
#[derive(Debug)]
pub struct BuildSupervisor {
    generation: u64,
    current: Option<BuildRecord>,
    last_result: Option<(BuildId, BuildState)>,
    options: RuntimeOptions,
}

impl BuildSupervisor {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            generation: 0,
            current: None,
            last_result: None,
            options,
        }
    }

    /// Number of builds launched so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current(&self) -> Option<&BuildRecord> {
        self.current.as_ref()
    }

    /// Id of the build currently running, if any.
    pub fn running(&self) -> Option<BuildId> {
        self.current
            .as_ref()
            .filter(|r| r.state == BuildState::Running)
            .map(|r| r.id)
    }

    /// Terminal state of the most recently reported build.
    pub fn last_result(&self) -> Option<&(BuildId, BuildState)> {
        self.last_result.as_ref()
    }

    /// Eager build at startup, independent of any filesystem event.
    pub fn start(&mut self) -> CoreStep {
        self.relaunch()
    }

    /// Supersede whatever is running and launch a fresh build.
    pub fn on_relevant_change(&mut self) -> CoreStep {
        self.relaunch()
    }

    /// Handle an event coming from the watcher or a signal handler.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::ChangeDetected { .. } => self.on_relevant_change(),
            RuntimeEvent::ShutdownRequested => self.shutdown(),
        }
    }

    pub fn disposition(&self, id: BuildId) -> ExitDisposition {
        if self.running() == Some(id) {
            ExitDisposition::Current
        } else {
            ExitDisposition::Superseded
        }
    }

    /// A build process exited.
    ///
    /// Only the current build's exit produces reports; anything else is a
    /// superseded exit and is silently discarded.
    pub fn on_build_exit(&mut self, id: BuildId, outcome: BuildOutcome) -> CoreStep {
        if self.disposition(id) == ExitDisposition::Superseded {
            debug!(build_id = %id, ?outcome, "discarding exit of superseded build");
            return CoreStep::cont(Vec::new());
        }

        let state = match outcome {
            BuildOutcome::Success => BuildState::Succeeded,
            BuildOutcome::Failed(code) => BuildState::Failed(BuildFailure::Exit(code)),
        };
        self.finish(state)
    }

    /// The backend could not start the toolchain for this build.
    pub fn on_launch_failed(&mut self, id: BuildId, reason: String) -> CoreStep {
        if self.disposition(id) == ExitDisposition::Superseded {
            debug!(build_id = %id, "ignoring launch failure of superseded build");
            return CoreStep::cont(Vec::new());
        }
        self.finish(BuildState::Failed(BuildFailure::Launch(reason)))
    }

    /// Stop supervising: terminate the running build, if any, and ask the
    /// shell to exit. Its eventual exit is not reported.
    pub fn shutdown(&mut self) -> CoreStep {
        let commands = self
            .supersede_current()
            .map(CoreCommand::Terminate)
            .into_iter()
            .collect();
        CoreStep {
            commands,
            keep_running: false,
        }
    }

    fn relaunch(&mut self) -> CoreStep {
        let mut commands = Vec::with_capacity(2);

        if let Some(previous) = self.supersede_current() {
            commands.push(CoreCommand::Terminate(previous));
        }

        self.generation += 1;
        let id = BuildId(self.generation);
        self.current = Some(BuildRecord {
            id,
            started_at: Instant::now(),
            state: BuildState::Running,
        });
        commands.push(CoreCommand::Launch(id));

        CoreStep::cont(commands)
    }

    /// Move a running current build to `Superseded` and drop it.
    fn supersede_current(&mut self) -> Option<BuildId> {
        let mut record = self.current.take()?;
        if record.state != BuildState::Running {
            return None;
        }
        record.state = BuildState::Superseded;
        debug!(build_id = %record.id, state = ?record.state, "superseding running build");
        Some(record.id)
    }

    /// Record the terminal state of the current build and emit its reports.
    fn finish(&mut self, state: BuildState) -> CoreStep {
        let Some(record) = self.current.take() else {
            return CoreStep::cont(Vec::new());
        };
        let id = record.id;

        let mut commands = match &state {
            BuildState::Succeeded => vec![
                CoreCommand::ReportSuccess {
                    id,
                    elapsed: record.started_at.elapsed(),
                },
                CoreCommand::NotifyReload,
            ],
            BuildState::Failed(failure) => vec![CoreCommand::ReportFailure {
                id,
                failure: failure.clone(),
            }],
            BuildState::Running | BuildState::Superseded => Vec::new(),
        };
        self.last_result = Some((id, state));

        let keep_running = !self.options.exit_after_build;
        if !keep_running {
            commands.push(CoreCommand::RequestExit);
        }

        CoreStep {
            commands,
            keep_running,
        }
    }
}
