// src/dag/task.rs

//! Task description plus its per-run status.

use crate::errors::{DagrunError, Result};
use crate::types::{TaskKind, TaskName, TaskStatus};

/// One unit of work in the graph.
///
/// Everything except `status` is fixed once the task is registered with a
/// [`TaskTracker`](crate::dag::TaskTracker). Status only moves forward along
/// the edges allowed by [`TaskStatus::can_transition_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    pub arguments: String,
    dependencies: Vec<TaskName>,
    status: TaskStatus,
}

impl Task {
    pub fn new(kind: TaskKind, arguments: impl Into<String>) -> Self {
        Self {
            kind,
            arguments: arguments.into(),
            dependencies: Vec::new(),
            status: TaskStatus::Pending,
        }
    }

    /// Shell command task.
    pub fn exec(arguments: impl Into<String>) -> Self {
        Self::new(TaskKind::Exec, arguments)
    }

    /// In-process Lua snippet task.
    pub fn eval(arguments: impl Into<String>) -> Self {
        Self::new(TaskKind::Eval, arguments)
    }

    /// Attach dependencies. Input order is kept for display; repeated names
    /// are collapsed.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        for dep in deps {
            let dep = dep.into();
            if !self.dependencies.contains(&dep) {
                self.dependencies.push(dep);
            }
        }
        self
    }

    pub fn dependencies(&self) -> &[TaskName] {
        &self.dependencies
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub(crate) fn transition(&mut self, name: &str, next: TaskStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DagrunError::InvalidTransition {
                task: name.to_string(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
