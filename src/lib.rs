// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod observer;
pub mod report;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{TaskFile, build_tracker, load_and_validate};
use crate::dag::TaskTracker;
use crate::engine::{SchedulerOptions, run_graph};
use crate::exec::RealExecutor;
use crate::observer::TracingObserver;

/// Exit status when `--strict` is set and some task did not complete.
pub const EXIT_TASKS_FAILED: i32 = 2;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - task file loading and validation
/// - tracker preparation (structural checks)
/// - the scheduler loop with the real executor
/// - the final summary table
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let file = load_and_validate(&args.input).context("failed to load tasks")?;
    let options = resolve_options(&args, &file);

    let mut tracker =
        build_tracker(&file, Arc::new(TracingObserver)).context("failed to load tasks")?;
    tracker.prepare().context("failed to load tasks")?;

    if args.dry_run {
        print_dry_run(&tracker, &options);
        return Ok(0);
    }

    info!(
        input = %args.input.display(),
        tasks = tracker.len(),
        max_parallel = ?options.max_parallel,
        "starting run"
    );
    let summary = run_graph(tracker, RealExecutor::new(), options).await?;
    print!("{}", summary.render_table());

    if args.strict && !summary.all_succeeded() {
        return Ok(EXIT_TASKS_FAILED);
    }
    Ok(0)
}

/// CLI values override the task file's `[config]`.
fn resolve_options(args: &CliArgs, file: &TaskFile) -> SchedulerOptions {
    let mut options = file.scheduler_options();
    if let Some(cap) = args.max_parallel {
        options.max_parallel = Some(cap);
    }
    if let Some(ms) = args.poll_interval_ms {
        options.poll_interval = Duration::from_millis(ms);
    }
    options
}

/// Print tasks, their dependencies, and the waves they would run in.
fn print_dry_run(tracker: &TaskTracker, options: &SchedulerOptions) {
    println!("dagrun dry-run");
    match options.max_parallel {
        Some(cap) => println!("  max_parallel = {cap}"),
        None => println!("  max_parallel = unbounded"),
    }
    println!("  poll_interval = {:?}", options.poll_interval);
    println!();

    println!("tasks ({}):", tracker.len());
    for (name, task) in tracker.tasks() {
        println!("  - {name} [{}]", task.kind);
        println!("      arguments: {}", task.arguments);
        if !task.dependencies().is_empty() {
            println!("      dependencies: {:?}", task.dependencies());
        }
    }

    if let Some(layers) = tracker.graph().and_then(|g| g.layers()) {
        println!();
        println!("plan:");
        for (index, layer) in layers.iter().enumerate() {
            println!("  wave {}: {}", index + 1, layer.join(", "));
        }
    }

    debug!("dry-run complete (no execution)");
}
