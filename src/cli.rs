// src/cli.rs

//! CLI argument parsing for the `packwatch` host binary.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `packwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "packwatch",
    version,
    about = "Rebuild a wasm module on source changes and signal live reloads.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted and `Packwatch.toml` does not exist, built-in defaults
    /// are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Run a single build and exit with its status, no watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PACKWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print it, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
