// src/watch/mod.rs

//! File watching and change classification.
//!
//! This module is responsible for:
//! - Compiling the source and manifest glob patterns (`patterns`).
//! - Deciding whether a single filesystem change warrants a rebuild.
//! - Wiring up a cross-platform filesystem watcher (`notify`) that forwards
//!   relevant changes to the runtime.
//!
//! It never launches builds itself; it only turns filesystem changes into
//! `RuntimeEvent::ChangeDetected`.

pub mod event_handler;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use patterns::{WatchRule, WatchSource};
pub use watcher::{WatcherHandle, spawn_watcher};
