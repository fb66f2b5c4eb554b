// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the build toolchain,
//! using `tokio::process::Command`, and handing its exit back to the runtime.
//!
//! - [`backend`] provides the `BuildBackend` trait and the `BuildHandle`
//!   every launch returns; tests replace the backend with a fake.
//! - [`process`] holds the production `ProcessBackend` and the per-process
//!   supervision task (wait for exit or termination request).

pub mod backend;
pub mod process;

pub use backend::{BuildBackend, BuildHandle};
pub use process::ProcessBackend;
