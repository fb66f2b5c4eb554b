// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod reload;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{Config, load_or_default};
use crate::engine::{BuildFailure, BuildState, BuildSupervisor, Runtime, RuntimeEvent, RuntimeOptions};
use crate::exec::ProcessBackend;
use crate::fs::RealFileSystem;
use crate::reload::StdoutReloadSink;
use crate::watch::{WatchSource, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the watch source and (unless `--once`) the file watcher
/// - the build supervisor and its runtime
/// - Ctrl-C handling
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_or_default(args.config.as_deref().map(Path::new))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(0);
    }

    // Invalid roots are fatal before anything is started.
    let source = WatchSource::configure(cfg.watch_rule(), Arc::new(RealFileSystem))?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let _watcher_handle = if !args.once {
        Some(spawn_watcher(Arc::new(source), rt_tx.clone())?)
    } else {
        None
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(command = %cfg.build.command_line(), "starting build supervisor");

    let options = RuntimeOptions {
        exit_after_build: args.once,
    };
    let core = BuildSupervisor::new(options);
    let backend = ProcessBackend::from_config(&cfg);
    let runtime = Runtime::new(core, rt_rx, backend, StdoutReloadSink);

    let last = runtime.run().await?;

    Ok(if args.once { exit_code(last.as_ref()) } else { 0 })
}

/// Exit code for `--once`: the toolchain's own code where there is one.
fn exit_code(last: Option<&BuildState>) -> i32 {
    match last {
        Some(BuildState::Succeeded) => 0,
        Some(BuildState::Failed(BuildFailure::Exit(code))) if *code > 0 => *code,
        _ => 1,
    }
}

/// Simple dry-run output: print the resolved watch rule and command.
fn print_dry_run(cfg: &Config) {
    let rule = cfg.watch_rule();
    println!("packwatch dry-run");
    println!("  root: {}", rule.root.display());
    println!("  paths: {:?}", rule.paths);
    println!("  source: {:?}", rule.source);
    println!("  manifest: {:?}", rule.manifest);
    println!("  build: {}", cfg.build.command_line());

    debug!("dry-run complete (no execution)");
}
