// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The scheduler loop talks to a `TaskExecutor` instead of spawning processes
//! itself. Production code uses [`RealExecutor`]; tests provide their own
//! implementation that returns scripted results without touching the OS.

use std::future::Future;
use std::pin::Pin;

use crate::dag::Task;
use crate::exec::result::ExecutionResult;
use crate::exec::{command, script};
use crate::types::TaskKind;

/// Future returned by [`TaskExecutor::execute`].
///
/// It owns everything it needs so the loop can spawn it on its own Tokio task.
pub type ExecutionFuture = Pin<Box<dyn Future<Output = ExecutionResult> + Send + 'static>>;

/// Runs a single task's side effect.
///
/// Implementations must not fail: every outcome, including a task kind they
/// cannot handle, is expressed through the returned [`ExecutionResult`].
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, name: &str, task: &Task) -> ExecutionFuture;
}

/// Executor that runs `exec` tasks as shell commands and `eval` tasks as Lua
/// snippets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl TaskExecutor for RealExecutor {
    fn execute(&self, name: &str, task: &Task) -> ExecutionFuture {
        let name = name.to_string();
        let arguments = task.arguments.clone();

        match task.kind {
            TaskKind::Exec => Box::pin(async move { command::run_command(&name, &arguments).await }),
            TaskKind::Eval => Box::pin(async move { script::run_snippet(&name, arguments).await }),
        }
    }
}
