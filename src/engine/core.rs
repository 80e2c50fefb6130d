// src/engine/core.rs

//! Pure core of the scheduler loop.
//!
//! `CoreRuntime` is synchronous and deterministic: it owns the tracker, turns
//! ready tasks into dispatch commands and applies completions. It has no
//! channels, no Tokio types, and performs no IO, so the whole scheduling
//! protocol can be unit tested by feeding it completions by hand.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dag::{Task, TaskTracker};
use crate::engine::{SchedulerOptions, TaskCompletion, TaskName};
use crate::errors::{DagrunError, Result};
use crate::observer::{TaskEvent, TaskObserver};
use crate::report::RunSummary;
use crate::types::TaskStatus;

/// A task the IO shell should hand to the executor now.
#[derive(Debug, Clone)]
pub struct DispatchedTask {
    pub name: TaskName,
    pub task: Task,
}

/// Decision returned by the core after a poll or a completion.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    /// Tasks that were just marked `Running` and must be executed.
    pub dispatch: Vec<DispatchedTask>,
    /// Whether the graph still has unfinished tasks.
    pub keep_running: bool,
}

pub struct CoreRuntime {
    tracker: TaskTracker,
    observer: Arc<dyn TaskObserver>,
    options: SchedulerOptions,
    /// Ready tasks waiting for a free slot (only used with `max_parallel`).
    backlog: VecDeque<TaskName>,
    in_flight: usize,
}

impl fmt::Debug for CoreRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreRuntime")
            .field("tracker", &self.tracker)
            .field("options", &self.options)
            .field("backlog", &self.backlog)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl CoreRuntime {
    /// Wrap a tracker. Prepares it first if the caller has not.
    pub fn new(mut tracker: TaskTracker, options: SchedulerOptions) -> Result<Self> {
        if !tracker.is_prepared() {
            tracker.prepare()?;
        }
        let observer = tracker.observer();
        Ok(Self {
            tracker,
            observer,
            options,
            backlog: VecDeque::new(),
            in_flight: 0,
        })
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    pub fn into_tracker(self) -> TaskTracker {
        self.tracker
    }

    pub fn is_active(&self) -> bool {
        self.tracker.is_active()
    }

    /// Number of dispatched tasks whose completion has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// True when polling again right away can make progress without waiting
    /// for any completion (e.g. a skip cascade is still unfolding).
    pub fn can_progress_without_waiting(&self) -> bool {
        self.in_flight == 0 && (self.tracker.has_queued() || !self.backlog.is_empty())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_tracker(&self.tracker)
    }

    /// Ask the tracker for ready tasks and launch as many as allowed.
    pub fn poll(&mut self) -> Result<CoreStep> {
        let ready = self.tracker.get_ready()?;
        if !ready.is_empty() {
            debug!(?ready, "tasks ready");
        }
        self.backlog.extend(ready);

        let mut dispatch = Vec::new();
        while self.has_free_slot() {
            let Some(name) = self.backlog.pop_front() else {
                break;
            };
            dispatch.push(self.launch(name)?);
        }

        Ok(CoreStep {
            dispatch,
            keep_running: self.tracker.is_active(),
        })
    }

    /// Apply the result of one execution, then poll.
    pub fn complete(&mut self, completion: TaskCompletion) -> Result<CoreStep> {
        let TaskCompletion { task, result } = completion;

        if self.tracker.status_of(&task) != Some(TaskStatus::Running) {
            return Err(DagrunError::UnknownTask(task));
        }
        self.in_flight = self.in_flight.saturating_sub(1);

        let status = result.terminal_status();
        self.tracker.set_status(&task, status)?;

        if status == TaskStatus::Completed {
            if !result.stdout.is_empty() {
                self.observer.on_event(&TaskEvent::Output {
                    task: task.clone(),
                    stdout: result.stdout,
                });
            }
        } else {
            self.observer.on_event(&TaskEvent::Failure {
                task: task.clone(),
                stderr: result.stderr,
                return_code: result.return_code,
                failure: result.failure.map(|f| f.to_string()),
            });
        }
        self.observer.on_event(&TaskEvent::Finished {
            task: task.clone(),
            status,
        });

        self.tracker.mark_done(&task)?;
        self.poll()
    }

    fn has_free_slot(&self) -> bool {
        self.options
            .max_parallel
            .is_none_or(|cap| self.in_flight < cap.get())
    }

    fn launch(&mut self, name: TaskName) -> Result<DispatchedTask> {
        self.tracker.set_status(&name, TaskStatus::Running)?;
        let task = self
            .tracker
            .task(&name)
            .cloned()
            .ok_or_else(|| DagrunError::UnknownTask(name.clone()))?;

        self.observer.on_event(&TaskEvent::Started {
            task: name.clone(),
            kind: task.kind,
        });
        self.in_flight += 1;

        Ok(DispatchedTask { name, task })
    }
}
