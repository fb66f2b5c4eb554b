// tests/supervisor_runtime.rs

use std::error::Error;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use packwatch::engine::{
    BuildFailure, BuildId, BuildOutcome, BuildState, BuildSupervisor, Runtime, RuntimeEvent,
    RuntimeOptions,
};
use packwatch::errors::Result as PwResult;
use packwatch::types::ChangeClass;
use packwatch_test_utils::fake_backend::{FakeBuildBackend, FakeBuilds};
use packwatch_test_utils::log_capture::LogCapture;
use packwatch_test_utils::recording_sink::RecordingReloadSink;
use packwatch_test_utils::{init_tracing, wait_until, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

struct Harness {
    tx: mpsc::Sender<RuntimeEvent>,
    builds: FakeBuilds,
    sink: RecordingReloadSink,
    handle: JoinHandle<PwResult<Option<BuildState>>>,
}

fn spawn_runtime(options: RuntimeOptions, prepare: impl FnOnce(&FakeBuilds)) -> Harness {
    init_tracing();

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
    let (backend, builds) = FakeBuildBackend::new();
    prepare(&builds);
    let sink = RecordingReloadSink::new();

    let runtime = Runtime::new(BuildSupervisor::new(options), rx, backend, sink.clone());
    let handle = tokio::spawn(runtime.run());

    Harness {
        tx,
        builds,
        sink,
        handle,
    }
}

fn change(path: &str) -> RuntimeEvent {
    RuntimeEvent::ChangeDetected {
        path: path.to_string(),
        class: ChangeClass::Source,
    }
}

/// Give the runtime a chance to process anything already queued.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn startup_builds_without_any_change() -> TestResult {
    let h = spawn_runtime(RuntimeOptions::default(), |_| {});

    wait_until("startup build", || h.builds.launch_count() == 1).await;
    assert_eq!(h.builds.launched(), vec![BuildId(1)]);
    assert_eq!(h.sink.count(), 0);

    h.tx.send(RuntimeEvent::ShutdownRequested).await?;
    let last = with_timeout(h.handle).await??;
    assert_eq!(last, None);
    Ok(())
}

#[tokio::test]
async fn change_then_success_notifies_exactly_once() -> TestResult {
    let h = spawn_runtime(RuntimeOptions::default(), |_| {});

    wait_until("startup build", || h.builds.launch_count() == 1).await;
    h.builds.finish(BuildId(1), BuildOutcome::Success);
    wait_until("startup reload", || h.sink.count() == 1).await;

    h.tx.send(change("module/lib.rs")).await?;
    wait_until("rebuild launch", || h.builds.launch_count() == 2).await;
    // Build 1 had already exited; nothing to terminate.
    assert!(!h.builds.was_cancelled(BuildId(1)));

    h.builds.finish(BuildId(2), BuildOutcome::Success);
    wait_until("rebuild reload", || h.sink.count() == 2).await;
    settle().await;
    assert_eq!(h.sink.count(), 2);

    h.tx.send(RuntimeEvent::ShutdownRequested).await?;
    let last = with_timeout(h.handle).await??;
    assert_eq!(last, Some(BuildState::Succeeded));
    Ok(())
}

#[tokio::test]
async fn superseded_build_exit_is_discarded() -> TestResult {
    let h = spawn_runtime(RuntimeOptions::default(), |_| {});

    wait_until("startup build", || h.builds.launch_count() == 1).await;

    // Second change arrives while build 1 is still running.
    h.tx.send(change("module/lib.rs")).await?;
    wait_until("replacement launch", || h.builds.launch_count() == 2).await;
    wait_until("termination request", || h.builds.was_cancelled(BuildId(1))).await;
    assert!(!h.builds.was_cancelled(BuildId(2)));

    // The superseded process exits late, and even successfully.
    h.builds.finish(BuildId(1), BuildOutcome::Success);
    settle().await;
    assert_eq!(h.sink.count(), 0);

    h.builds.finish(BuildId(2), BuildOutcome::Success);
    wait_until("reload for latest build", || h.sink.count() == 1).await;
    settle().await;
    assert_eq!(h.sink.count(), 1);

    h.tx.send(RuntimeEvent::ShutdownRequested).await?;
    with_timeout(h.handle).await??;
    Ok(())
}

#[tokio::test]
async fn burst_of_changes_only_reports_the_last_build() -> TestResult {
    let h = spawn_runtime(RuntimeOptions::default(), |_| {});
    wait_until("startup build", || h.builds.launch_count() == 1).await;

    for _ in 0..3 {
        h.tx.send(change("module/lib.rs")).await?;
    }
    wait_until("all launches", || h.builds.launch_count() == 4).await;

    for id in 1..=3 {
        assert!(
            h.builds.was_cancelled(BuildId(id)),
            "build {id} should have been terminated"
        );
    }

    // Newest first, then the stale ones trickle in.
    h.builds.finish(BuildId(4), BuildOutcome::Success);
    wait_until("reload", || h.sink.count() == 1).await;
    for id in 1..=3 {
        h.builds.finish(BuildId(id), BuildOutcome::Success);
    }
    settle().await;
    assert_eq!(h.sink.count(), 1);

    h.tx.send(RuntimeEvent::ShutdownRequested).await?;
    with_timeout(h.handle).await??;
    Ok(())
}

#[tokio::test]
async fn failed_build_is_not_fatal() -> TestResult {
    let logs = LogCapture::new();
    let _guard = logs.install();
    let h = spawn_runtime(RuntimeOptions::default(), |_| {});

    wait_until("startup build", || h.builds.launch_count() == 1).await;
    h.builds.finish(BuildId(1), BuildOutcome::Failed(3));
    wait_until("failure log line", || logs.contains("build failed with code 3")).await;
    settle().await;
    assert_eq!(h.sink.count(), 0);
    assert!(!h.handle.is_finished());
    assert!(!logs.contains("build finished successfully"));

    h.tx.send(change("module/lib.rs")).await?;
    wait_until("rebuild launch", || h.builds.launch_count() == 2).await;
    h.builds.finish(BuildId(2), BuildOutcome::Success);
    wait_until("reload after recovery", || h.sink.count() == 1).await;

    h.tx.send(RuntimeEvent::ShutdownRequested).await?;
    with_timeout(h.handle).await??;
    Ok(())
}

#[tokio::test]
async fn launch_failure_is_reported_and_next_change_retries() -> TestResult {
    let h = spawn_runtime(RuntimeOptions::default(), |builds| builds.fail_next_launch());

    settle().await;
    assert_eq!(h.builds.launch_count(), 0);
    assert_eq!(h.sink.count(), 0);
    assert!(!h.handle.is_finished());

    h.tx.send(change("Cargo.toml")).await?;
    wait_until("retry launch", || h.builds.launch_count() == 1).await;
    // The failed startup attempt still consumed generation 1.
    assert_eq!(h.builds.launched(), vec![BuildId(2)]);

    h.builds.finish(BuildId(2), BuildOutcome::Success);
    wait_until("reload", || h.sink.count() == 1).await;

    h.tx.send(RuntimeEvent::ShutdownRequested).await?;
    with_timeout(h.handle).await??;
    Ok(())
}

#[tokio::test]
async fn exit_after_build_returns_the_outcome() -> TestResult {
    let h = spawn_runtime(
        RuntimeOptions {
            exit_after_build: true,
        },
        |_| {},
    );

    wait_until("startup build", || h.builds.launch_count() == 1).await;
    h.builds.finish(BuildId(1), BuildOutcome::Failed(7));

    let last = with_timeout(h.handle).await??;
    assert_eq!(last, Some(BuildState::Failed(BuildFailure::Exit(7))));
    assert_eq!(h.sink.count(), 0);
    Ok(())
}

#[tokio::test]
async fn closed_event_channel_still_waits_for_running_build() -> TestResult {
    let h = spawn_runtime(RuntimeOptions::default(), |_| {});
    wait_until("startup build", || h.builds.launch_count() == 1).await;

    drop(h.tx);
    settle().await;
    assert!(!h.handle.is_finished());

    h.builds.finish(BuildId(1), BuildOutcome::Success);
    let last = with_timeout(h.handle).await??;
    assert_eq!(last, Some(BuildState::Succeeded));
    assert_eq!(h.sink.count(), 1);
    Ok(())
}

#[tokio::test]
async fn shutdown_does_not_wait_for_running_build() -> TestResult {
    let h = spawn_runtime(RuntimeOptions::default(), |_| {});
    wait_until("startup build", || h.builds.launch_count() == 1).await;

    // Build 1 never finishes on its own.
    h.tx.send(RuntimeEvent::ShutdownRequested).await?;
    let last = with_timeout(h.handle).await??;
    assert_eq!(last, None);
    assert_eq!(h.sink.count(), 0);
    Ok(())
}
