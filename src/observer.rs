// src/observer.rs

//! Task lifecycle events and the observers that consume them.
//!
//! The tracker and the scheduler loop never write to the console directly.
//! They emit [`TaskEvent`]s to an injected [`TaskObserver`]; production code
//! uses [`TracingObserver`], tests use [`RecordingObserver`].

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info};

use crate::types::{TaskKind, TaskName, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// The task was dispatched to the executor.
    Started { task: TaskName, kind: TaskKind },
    /// Captured stdout of a successful task (only emitted when non-empty).
    Output { task: TaskName, stdout: String },
    /// The task ran and failed.
    Failure {
        task: TaskName,
        stderr: String,
        return_code: Option<i32>,
        failure: Option<String>,
    },
    /// The task reached `Completed` or `Failed`.
    Finished { task: TaskName, status: TaskStatus },
    /// The task will not run because these dependencies failed or were skipped.
    Skipped {
        task: TaskName,
        blocked_by: Vec<TaskName>,
    },
}

impl TaskEvent {
    pub fn task(&self) -> &str {
        match self {
            TaskEvent::Started { task, .. }
            | TaskEvent::Output { task, .. }
            | TaskEvent::Failure { task, .. }
            | TaskEvent::Finished { task, .. }
            | TaskEvent::Skipped { task, .. } => task,
        }
    }
}

pub trait TaskObserver: Send + Sync {
    fn on_event(&self, event: &TaskEvent);
}

/// Writes every event as a `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TaskObserver for TracingObserver {
    fn on_event(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { task, kind } => {
                info!(task = %task, kind = %kind, "started");
            }
            TaskEvent::Output { task, stdout } => {
                info!(task = %task, "output:\n{stdout}");
            }
            TaskEvent::Failure {
                task,
                stderr,
                return_code,
                failure,
            } => {
                if !stderr.is_empty() {
                    error!(task = %task, ?return_code, "stderr:\n{stderr}");
                }
                if let Some(failure) = failure {
                    error!(task = %task, ?return_code, "failure: {failure}");
                }
                if stderr.is_empty() && failure.is_none() {
                    error!(task = %task, ?return_code, "task failed without output");
                }
            }
            TaskEvent::Finished { task, status } => {
                info!(task = %task, status = %status, "ended");
            }
            TaskEvent::Skipped { task, blocked_by } => {
                info!(task = %task, ?blocked_by, "skipped");
            }
        }
    }
}

/// Keeps every event in memory, in emission order.
///
/// Clones share the same buffer, so one clone can be handed to the tracker
/// while the test keeps another.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<TaskEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_for(&self, task: &str) -> Vec<TaskEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.task() == task)
            .collect()
    }
}

impl TaskObserver for RecordingObserver {
    fn on_event(&self, event: &TaskEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
