// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::errors::{PackwatchError, Result};
use crate::exec::{BuildBackend, BuildHandle};
use crate::reload::ReloadSink;

use super::core::{BuildSupervisor, CoreCommand, CoreStep};
use super::{BuildFailure, BuildId, BuildOutcome, BuildState, RuntimeEvent};

/// Drives the [`BuildSupervisor`] in response to filesystem changes and
/// build completions, and carries out its commands.
///
/// This is the IO shell around the pure core:
/// - reads `RuntimeEvent`s from the watcher / signal channel,
/// - polls each launched build's completion, tagged with the `BuildId`
///   captured at launch,
/// - launches and terminates builds through a `BuildBackend`,
/// - notifies the `ReloadSink`.
///
/// Events are handled one at a time; a handler never waits for a build to
/// exit.
pub struct Runtime<B: BuildBackend, S: ReloadSink> {
    core: BuildSupervisor,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    sink: S,
    completions: JoinSet<(BuildId, BuildOutcome)>,
    /// Cancel handle of the most recently launched build.
    active_cancel: Option<(BuildId, oneshot::Sender<()>)>,
}

impl<B: BuildBackend, S: ReloadSink> fmt::Debug for Runtime<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("pending_builds", &self.completions.len())
            .finish_non_exhaustive()
    }
}

impl<B: BuildBackend, S: ReloadSink> Runtime<B, S> {
    pub fn new(
        core: BuildSupervisor,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        backend: B,
        sink: S,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            sink,
            completions: JoinSet::new(),
            active_cancel: None,
        }
    }

    /// Main event loop.
    ///
    /// Launches the startup build, then reacts to events and completions
    /// until shutdown is requested, the core asks to exit, or there is
    /// nothing left to wait for. Any build still in flight is killed before
    /// returning.
    ///
    /// Returns the terminal state of the last reported build.
    pub async fn run(mut self) -> Result<Option<BuildState>> {
        info!("packwatch runtime started");

        let startup = self.core.start();
        let mut keep_running = self.execute(startup);
        let mut events_open = true;

        while keep_running {
            let step = tokio::select! {
                maybe_event = self.event_rx.recv(), if events_open => match maybe_event {
                    Some(event) => {
                        debug!(?event, "runtime received event");
                        self.core.step(event)
                    }
                    None => {
                        info!("runtime event channel closed");
                        events_open = false;
                        continue;
                    }
                },
                Some(joined) = self.completions.join_next(), if !self.completions.is_empty() => {
                    match joined {
                        Ok((id, outcome)) => {
                            debug!(build_id = %id, ?outcome, "build completion received");
                            self.core.on_build_exit(id, outcome)
                        }
                        Err(e) => {
                            warn!(error = %e, "build completion task failed");
                            continue;
                        }
                    }
                },
                else => {
                    info!("no pending events or builds; stopping runtime");
                    break;
                }
            };

            keep_running = self.execute(step);
        }

        self.shutdown().await;

        info!("runtime exiting");
        Ok(self.core.last_result().map(|(_, state)| state.clone()))
    }

    /// Execute the commands of one core step, including follow-up steps the
    /// core produces while they run (launch failures).
    fn execute(&mut self, step: CoreStep) -> bool {
        let mut keep_running = step.keep_running;
        let mut queue: VecDeque<CoreCommand> = step.commands.into();

        while let Some(command) = queue.pop_front() {
            match command {
                CoreCommand::Terminate(id) => self.terminate(id),
                CoreCommand::Launch(id) => {
                    if let Some(follow_up) = self.launch(id) {
                        keep_running &= follow_up.keep_running;
                        queue.extend(follow_up.commands);
                    }
                }
                CoreCommand::ReportSuccess { id, elapsed } => {
                    info!(
                        build_id = %id,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "build finished successfully"
                    );
                }
                CoreCommand::NotifyReload => {
                    debug!("notifying reload sink");
                    self.sink.broadcast_reload();
                }
                CoreCommand::ReportFailure { id, failure } => match failure {
                    BuildFailure::Exit(code) => {
                        let err = PackwatchError::BuildFailure(code);
                        error!(build_id = %id, code, "{err}");
                    }
                    BuildFailure::Launch(_) => error!(build_id = %id, "build {failure}"),
                },
                CoreCommand::RequestExit => {
                    info!("core requested exit");
                }
            }
        }

        keep_running
    }

    fn launch(&mut self, id: BuildId) -> Option<CoreStep> {
        info!(build_id = %id, "recompiling");

        match self.backend.launch(id) {
            Ok(BuildHandle {
                cancel, completion, ..
            }) => {
                self.active_cancel = Some((id, cancel));
                self.completions
                    .spawn(async move { (id, completion.await) });
                None
            }
            Err(err) => Some(self.core.on_launch_failed(id, err.to_string())),
        }
    }

    /// Request termination without waiting for the process to stop.
    fn terminate(&mut self, id: BuildId) {
        match self.active_cancel.take() {
            Some((active, cancel)) if active == id => {
                info!(build_id = %id, "terminating superseded build");
                if cancel.send(()).is_err() {
                    debug!(build_id = %id, "build already finished while terminating");
                }
            }
            other => {
                debug!(build_id = %id, "no cancel handle for build; nothing to terminate");
                self.active_cancel = other;
            }
        }
    }

    /// Stop every build still in flight. Aborting a completion drops its
    /// process, which kills it.
    async fn shutdown(&mut self) {
        self.active_cancel = None;
        let pending = self.completions.len();
        if pending > 0 {
            info!(pending, "stopping in-flight builds");
        }
        self.completions.shutdown().await;
    }
}
