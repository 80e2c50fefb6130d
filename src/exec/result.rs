// src/exec/result.rs

use std::fmt;

use thiserror::Error;

use crate::types::TaskStatus;

/// Where a task's execution broke down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The process could not be started at all.
    Spawn,
    /// Reading the process output or waiting for it failed.
    Io,
    /// The process was terminated by a signal.
    Signal,
    /// The Lua snippet raised an error.
    Script,
    /// The worker thread running a snippet panicked.
    Worker,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Spawn => "spawn error",
            FailureKind::Io => "io error",
            FailureKind::Signal => "terminated by signal",
            FailureKind::Script => "script error",
            FailureKind::Worker => "worker error",
        };
        f.write_str(s)
    }
}

/// A failure captured while executing a task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything the executor learned from running one task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub return_code: Option<i32>,
    pub failure: Option<TaskFailure>,
}

impl ExecutionResult {
    /// Result for a task that could not produce any output.
    pub fn from_failure(failure: TaskFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.return_code == Some(0) && self.failure.is_none()
    }

    /// `Completed` for a success, `Failed` for anything else.
    pub fn terminal_status(&self) -> TaskStatus {
        if self.is_success() {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        }
    }
}
