// src/exec/process.rs

//! Production backend: one OS process per build.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::{BuildSection, Config};
use crate::engine::{BuildId, BuildOutcome};
use crate::errors::{PackwatchError, Result};
use crate::exec::backend::{BuildBackend, BuildHandle};

/// How long a toolchain may take to exit after SIGTERM before it is killed.
pub const DEFAULT_TERM_GRACE: Duration = Duration::from_secs(5);

/// Runs the configured toolchain command with inherited stdio.
///
/// The command line is fixed at construction; every launch is the same
/// invocation.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    term_grace: Duration,
}

impl ProcessBackend {
    pub fn new(build: &BuildSection, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: build.program.clone(),
            args: build.args.clone(),
            working_dir: working_dir.into(),
            term_grace: DEFAULT_TERM_GRACE,
        }
    }

    pub fn with_term_grace(mut self, grace: Duration) -> Self {
        self.term_grace = grace;
        self
    }

    /// Backend running `[build]` from the project root.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.build, cfg.project_root())
    }

    fn spawn_child(&self) -> Result<Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        cmd.spawn().map_err(|source| PackwatchError::ProcessLaunch {
            program: self.program.clone(),
            source,
        })
    }
}

impl BuildBackend for ProcessBackend {
    fn launch(&mut self, id: BuildId) -> Result<BuildHandle> {
        let child = self.spawn_child()?;
        debug!(
            build_id = %id,
            pid = ?child.id(),
            program = %self.program,
            "spawned build process"
        );

        let (cancel_tx, cancel_rx) = oneshot::channel();
        Ok(BuildHandle {
            id,
            cancel: cancel_tx,
            completion: Box::pin(supervise_process(id, child, cancel_rx, self.term_grace)),
        })
    }
}

/// Wait for the process to exit, terminating it if requested.
///
/// Termination sends SIGTERM first and escalates to a kill once `grace`
/// runs out. The real exit is returned also after termination; it is up to
/// the supervisor to discard it. Dropping this future drops the `Child`,
/// which kills the process (`kill_on_drop`).
async fn supervise_process(
    id: BuildId,
    mut child: Child,
    mut cancel_rx: oneshot::Receiver<()>,
    grace: Duration,
) -> BuildOutcome {
    let status = tokio::select! {
        status = child.wait() => status,
        cancel = &mut cancel_rx => {
            match cancel {
                Ok(()) => {
                    info!(build_id = %id, "termination requested; stopping build process");
                    request_termination(id, &mut child);
                    match tokio::time::timeout(grace, child.wait()).await {
                        Ok(status) => status,
                        Err(_) => {
                            warn!(
                                build_id = %id,
                                grace_ms = grace.as_millis() as u64,
                                "build process ignored termination; killing"
                            );
                            force_kill(id, &mut child);
                            child.wait().await
                        }
                    }
                }
                Err(_) => {
                    debug!(build_id = %id, "cancel handle dropped");
                    child.wait().await
                }
            }
        }
    };

    let outcome = match status {
        Ok(status) if status.success() => BuildOutcome::Success,
        Ok(status) => BuildOutcome::Failed(status.code().unwrap_or(-1)),
        Err(e) => {
            warn!(build_id = %id, error = %e, "waiting for build process failed");
            BuildOutcome::Failed(-1)
        }
    };

    debug!(build_id = %id, ?outcome, "build process exited");
    outcome
}

/// Ask the process to stop with SIGTERM, falling back to a kill when the
/// signal cannot be delivered.
#[cfg(unix)]
fn request_termination(id: BuildId, child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    // No pid means the exit status was already collected.
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(raw) = i32::try_from(pid) else {
        force_kill(id, child);
        return;
    };

    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => debug!(build_id = %id, pid, "sent SIGTERM to build process"),
        Err(errno) => {
            warn!(build_id = %id, pid, error = %errno, "SIGTERM failed; killing build process");
            force_kill(id, child);
        }
    }
}

#[cfg(not(unix))]
fn request_termination(id: BuildId, child: &mut Child) {
    force_kill(id, child);
}

fn force_kill(id: BuildId, child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(build_id = %id, error = %e, "failed to kill build process");
    }
}
