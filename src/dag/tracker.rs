// src/dag/tracker.rs

//! The single source of truth for "what can run next".

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::dag::graph::DagGraph;
use crate::dag::task::Task;
use crate::errors::{DagrunError, Result};
use crate::observer::{TaskEvent, TaskObserver, TracingObserver};
use crate::types::{TaskName, TaskStatus};

/// Owns the task set and hands out ready tasks in topological order.
///
/// Usage follows three phases:
/// 1. [`add_task`](Self::add_task) for every task,
/// 2. [`prepare`](Self::prepare) once, which validates the graph,
/// 3. repeated [`get_ready`](Self::get_ready) / [`mark_done`](Self::mark_done)
///    until [`is_active`](Self::is_active) returns `false`.
pub struct TaskTracker {
    tasks: BTreeMap<TaskName, Task>,
    /// Names in registration order, for reporting.
    order: Vec<TaskName>,
    readiness: Option<Readiness>,
    observer: Arc<dyn TaskObserver>,
}

/// Kahn-style readiness bookkeeping, built by `prepare()`.
#[derive(Debug)]
struct Readiness {
    graph: DagGraph,
    /// Unfinished dependency count per task.
    remaining: HashMap<TaskName, usize>,
    /// Tasks whose count reached zero and which were not handed out yet.
    queued: VecDeque<TaskName>,
    /// Tasks already handed out (returned as runnable, or skipped).
    dispatched: HashSet<TaskName>,
    done: HashSet<TaskName>,
}

impl Readiness {
    fn complete(&mut self, name: &str) -> Result<()> {
        if !self.remaining.contains_key(name) || self.done.contains(name) {
            return Err(DagrunError::UnknownTask(name.to_string()));
        }
        if !self.dispatched.contains(name) {
            return Err(DagrunError::TaskNotDispatched(name.to_string()));
        }

        self.done.insert(name.to_string());

        for dependent in self.graph.dependents_of(name) {
            if let Some(count) = self.remaining.get_mut(dependent) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.queued.push_back(dependent.clone());
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TaskTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskTracker")
            .field("tasks", &self.tasks)
            .field("readiness", &self.readiness)
            .finish_non_exhaustive()
    }
}

impl Default for TaskTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTracker {
    /// Tracker that reports task events through `tracing`.
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    pub fn with_observer(observer: Arc<dyn TaskObserver>) -> Self {
        Self {
            tasks: BTreeMap::new(),
            order: Vec::new(),
            readiness: None,
            observer,
        }
    }

    pub fn observer(&self) -> Arc<dyn TaskObserver> {
        Arc::clone(&self.observer)
    }

    pub fn add_task(&mut self, name: impl Into<TaskName>, task: Task) -> Result<()> {
        if self.readiness.is_some() {
            return Err(DagrunError::AlreadyPrepared);
        }
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(DagrunError::DuplicateTaskName(name));
        }
        debug!(task = %name, kind = %task.kind, deps = ?task.dependencies(), "registered task");
        self.order.push(name.clone());
        self.tasks.insert(name, task);
        Ok(())
    }

    /// Validate the dependency relation and build the readiness structure.
    ///
    /// Fails with `UnknownDependency` for the first task (by name) that refers
    /// to an unregistered task, or `CyclicDependency` with one cycle path.
    pub fn prepare(&mut self) -> Result<()> {
        if self.readiness.is_some() {
            return Err(DagrunError::AlreadyPrepared);
        }

        let graph = DagGraph::from_tasks(&self.tasks);

        if let Some((task, missing)) = graph.missing_dependencies().into_iter().next() {
            return Err(DagrunError::UnknownDependency { task, missing });
        }
        if let Some(cycle) = graph.find_cycle() {
            return Err(DagrunError::CyclicDependency { cycle });
        }

        let mut remaining = HashMap::with_capacity(self.tasks.len());
        let mut queued = VecDeque::new();
        for name in self.tasks.keys() {
            let count = graph.dependencies_of(name).len();
            if count == 0 {
                queued.push_back(name.clone());
            }
            remaining.insert(name.clone(), count);
        }

        info!(
            tasks = self.tasks.len(),
            roots = queued.len(),
            "task graph prepared"
        );

        self.readiness = Some(Readiness {
            graph,
            remaining,
            queued,
            dispatched: HashSet::new(),
            done: HashSet::new(),
        });
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.readiness.is_some()
    }

    /// Hand out every task whose dependencies are all done and which has not
    /// been handed out before.
    ///
    /// A candidate with a `Failed` or `Skipped` dependency is marked `Skipped`
    /// and done instead of being returned. Its own dependents become
    /// candidates on the next call, so a failure cascades one level per call.
    pub fn get_ready(&mut self) -> Result<BTreeSet<TaskName>> {
        let readiness = self.readiness.as_ref().ok_or(DagrunError::NotPrepared)?;

        // Work out every decision before touching the queue, so a rejected
        // transition leaves the candidates in place.
        let mut decisions = Vec::with_capacity(readiness.queued.len());
        for name in &readiness.queued {
            let blocked_by: Vec<TaskName> = readiness
                .graph
                .dependencies_of(name)
                .iter()
                .filter(|dep| {
                    self.tasks
                        .get(*dep)
                        .is_some_and(|t| t.status().blocks_dependents())
                })
                .cloned()
                .collect();

            if !blocked_by.is_empty() {
                let task = self
                    .tasks
                    .get(name)
                    .ok_or_else(|| DagrunError::UnknownTask(name.clone()))?;
                if !task.status().can_transition_to(TaskStatus::Skipped) {
                    return Err(DagrunError::InvalidTransition {
                        task: name.clone(),
                        from: task.status(),
                        to: TaskStatus::Skipped,
                    });
                }
            }
            decisions.push((name.clone(), blocked_by));
        }

        let Some(readiness) = self.readiness.as_mut() else {
            return Err(DagrunError::NotPrepared);
        };
        readiness.queued.drain(..decisions.len());

        let mut runnable = BTreeSet::new();
        for (name, blocked_by) in decisions {
            readiness.dispatched.insert(name.clone());

            if blocked_by.is_empty() {
                runnable.insert(name);
                continue;
            }

            if let Some(task) = self.tasks.get_mut(&name) {
                task.transition(&name, TaskStatus::Skipped)?;
            }
            debug!(task = %name, ?blocked_by, "upstream failure; skipping task");

            self.observer.on_event(&TaskEvent::Skipped {
                task: name.clone(),
                blocked_by,
            });
            readiness.complete(&name)?;
        }

        Ok(runnable)
    }

    /// Record that a handed-out task reached a terminal state.
    pub fn mark_done(&mut self, name: &str) -> Result<()> {
        let readiness = self
            .readiness
            .as_mut()
            .ok_or_else(|| DagrunError::UnknownTask(name.to_string()))?;
        readiness.complete(name)
    }

    /// True while at least one task is not done.
    pub fn is_active(&self) -> bool {
        self.readiness
            .as_ref()
            .is_some_and(|r| r.done.len() < r.remaining.len())
    }

    /// True if the next `get_ready()` has candidates to look at.
    pub fn has_queued(&self) -> bool {
        self.readiness.as_ref().is_some_and(|r| !r.queued.is_empty())
    }

    pub fn set_status(&mut self, name: &str, status: TaskStatus) -> Result<()> {
        let task = self
            .tasks
            .get_mut(name)
            .ok_or_else(|| DagrunError::UnknownTask(name.to_string()))?;
        task.transition(name, status)
    }

    pub fn status_of(&self, name: &str) -> Option<TaskStatus> {
        self.tasks.get(name).map(Task::status)
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// All tasks, in the order they were added.
    pub fn tasks(&self) -> impl Iterator<Item = (&TaskName, &Task)> {
        self.order
            .iter()
            .filter_map(|name| self.tasks.get_key_value(name))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The dependency graph, available once prepared.
    pub fn graph(&self) -> Option<&DagGraph> {
        self.readiness.as_ref().map(|r| &r.graph)
    }
}
