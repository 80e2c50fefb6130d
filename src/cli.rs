// src/cli.rs

//! CLI argument parsing using `clap`.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dagrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagrun",
    version,
    about = "Run a graph of shell commands and Lua snippets in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task file (TOML, or JSON when the extension is `.json`).
    #[arg(long, short, value_name = "PATH", default_value = "tasks.toml")]
    pub input: PathBuf,

    /// Maximum number of tasks running at once.
    ///
    /// Overrides `[config].max_parallel`. Unbounded when neither is set.
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<NonZeroUsize>,

    /// How long the scheduler waits for a completion before polling again.
    ///
    /// Overrides `[config].poll_interval_ms`.
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the execution plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with status 2 when any task failed or was skipped.
    #[arg(long)]
    pub strict: bool,
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
