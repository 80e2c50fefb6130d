// src/engine/mod.rs

//! Scheduler loop for dagrun.
//!
//! The pure core state machine lives in [`core`]: it asks the tracker for
//! ready tasks, decides which of them to launch, and applies completions.
//! The async/IO shell in [`runtime`] spawns executions, waits for their
//! completions and polls the core until the graph is resolved.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::exec::ExecutionResult;

pub use crate::types::TaskName;

/// How long the loop waits for a completion before asking the tracker again.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Maximum number of tasks executing at once; `None` means unbounded.
    pub max_parallel: Option<NonZeroUsize>,
    /// Upper bound on how long the loop sleeps when nothing can be launched.
    pub poll_interval: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_parallel: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// A dispatched task finished executing.
#[derive(Debug, Clone)]
pub struct TaskCompletion {
    pub task: TaskName,
    pub result: ExecutionResult,
}

pub mod core;
pub mod runtime;

pub use self::core::{CoreRuntime, CoreStep, DispatchedTask};
pub use self::runtime::{Runtime, run_graph};
