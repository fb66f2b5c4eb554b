use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use packwatch::engine::{BuildId, BuildOutcome};
use packwatch::errors::{PackwatchError, Result};
use packwatch::exec::{BuildBackend, BuildHandle};
use tokio::sync::oneshot;

struct FakeBuild {
    cancel_rx: oneshot::Receiver<()>,
    cancelled: bool,
    finish_tx: Option<oneshot::Sender<BuildOutcome>>,
}

#[derive(Default)]
struct Shared {
    builds: BTreeMap<BuildId, FakeBuild>,
    fail_next_launch: bool,
}

/// Test-side view of a [`FakeBuildBackend`].
///
/// Records every launch and lets the test decide when and how each build
/// exits. Nothing completes on its own, also not after a termination
/// request, which mirrors a toolchain that is slow to die.
#[derive(Clone, Default)]
pub struct FakeBuilds {
    shared: Arc<Mutex<Shared>>,
}

impl FakeBuilds {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap()
    }

    /// Ids of all builds launched so far, oldest first.
    pub fn launched(&self) -> Vec<BuildId> {
        self.lock().builds.keys().copied().collect()
    }

    pub fn launch_count(&self) -> usize {
        self.lock().builds.len()
    }

    /// Whether the runtime requested termination of this build.
    pub fn was_cancelled(&self, id: BuildId) -> bool {
        let mut shared = self.lock();
        let Some(build) = shared.builds.get_mut(&id) else {
            return false;
        };
        if !build.cancelled && build.cancel_rx.try_recv().is_ok() {
            build.cancelled = true;
        }
        build.cancelled
    }

    /// Make the build's process "exit" with `outcome`.
    pub fn finish(&self, id: BuildId, outcome: BuildOutcome) {
        let tx = self
            .lock()
            .builds
            .get_mut(&id)
            .and_then(|b| b.finish_tx.take())
            .unwrap_or_else(|| panic!("build {id} not launched or already finished"));
        let _ = tx.send(outcome);
    }

    /// Make the next `launch` call fail as if the toolchain were missing.
    pub fn fail_next_launch(&self) {
        self.lock().fail_next_launch = true;
    }
}

/// In-memory build backend: no processes, completions driven by the test.
pub struct FakeBuildBackend {
    builds: FakeBuilds,
}

impl FakeBuildBackend {
    pub fn new() -> (Self, FakeBuilds) {
        let builds = FakeBuilds::default();
        (
            Self {
                builds: builds.clone(),
            },
            builds,
        )
    }
}

impl BuildBackend for FakeBuildBackend {
    fn launch(&mut self, id: BuildId) -> Result<BuildHandle> {
        let mut shared = self.builds.lock();
        if shared.fail_next_launch {
            shared.fail_next_launch = false;
            return Err(PackwatchError::ProcessLaunch {
                program: "fake-toolchain".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "not installed"),
            });
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (finish_tx, finish_rx) = oneshot::channel();
        shared.builds.insert(
            id,
            FakeBuild {
                cancel_rx,
                cancelled: false,
                finish_tx: Some(finish_tx),
            },
        );

        Ok(BuildHandle {
            id,
            cancel: cancel_tx,
            completion: Box::pin(async move {
                finish_rx.await.unwrap_or(BuildOutcome::Failed(-1))
            }),
        })
    }
}
