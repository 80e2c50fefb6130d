// src/engine/runtime.rs

use std::fmt;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::dag::TaskTracker;
use crate::engine::core::{CoreRuntime, CoreStep, DispatchedTask};
use crate::engine::{SchedulerOptions, TaskCompletion};
use crate::errors::{DagrunError, Result};
use crate::exec::{ExecutionResult, FailureKind, TaskExecutor, TaskFailure};
use crate::report::RunSummary;
use crate::types::TaskStatus;

/// Drives the core scheduler to completion and delegates actual task
/// execution to a `TaskExecutor`.
///
/// Every dispatched task runs on its own Tokio task and reports back over an
/// mpsc channel, so the loop is the only writer of task status. When nothing
/// can be launched the loop waits for the next completion, but never longer
/// than the poll interval before asking the tracker again.
pub struct Runtime<E: TaskExecutor> {
    core: CoreRuntime,
    executor: E,
    completion_tx: mpsc::Sender<TaskCompletion>,
    completion_rx: mpsc::Receiver<TaskCompletion>,
}

impl<E: TaskExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: TaskExecutor> Runtime<E> {
    pub fn new(core: CoreRuntime, executor: E) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(64);
        Self {
            core,
            executor,
            completion_tx,
            completion_rx,
        }
    }

    /// Main scheduling loop.
    ///
    /// - Polls the core for ready tasks and spawns them.
    /// - Feeds completions back into the core.
    /// - Returns the final summary once every task is terminal.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!(tasks = self.core.tracker().len(), "dagrun runtime started");

        let mut step = self.core.poll()?;
        loop {
            self.spawn_ready(step.dispatch);

            if !step.keep_running {
                break;
            }

            step = if self.core.can_progress_without_waiting() {
                self.core.poll()?
            } else {
                self.wait_for_completion().await?
            };
        }

        let summary = self.core.summary();
        info!(
            completed = summary.count(TaskStatus::Completed),
            failed = summary.count(TaskStatus::Failed),
            skipped = summary.count(TaskStatus::Skipped),
            "all tasks resolved"
        );
        Ok(summary)
    }

    async fn wait_for_completion(&mut self) -> Result<CoreStep> {
        let poll_interval = self.core.options().poll_interval;

        match timeout(poll_interval, self.completion_rx.recv()).await {
            Ok(Some(completion)) => {
                debug!(task = %completion.task, "task completion received");
                self.core.complete(completion)
            }
            Ok(None) => Err(DagrunError::Other(anyhow!(
                "completion channel closed with {} task(s) in flight",
                self.core.in_flight()
            ))),
            Err(_elapsed) => {
                trace!(in_flight = self.core.in_flight(), "no completion within poll interval");
                self.core.poll()
            }
        }
    }

    fn spawn_ready(&self, tasks: Vec<DispatchedTask>) {
        if tasks.is_empty() {
            return;
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "spawning ready tasks");

        for DispatchedTask { name, task } in tasks {
            let execution = self.executor.execute(&name, &task);
            let tx = self.completion_tx.clone();

            tokio::spawn(async move {
                // Run the execution as its own task so a panic inside it still
                // produces a completion instead of leaving the task Running.
                let result = match tokio::spawn(execution).await {
                    Ok(result) => result,
                    Err(join_err) => {
                        warn!(task = %name, error = %join_err, "task execution panicked");
                        ExecutionResult::from_failure(TaskFailure::new(
                            FailureKind::Worker,
                            format!("execution of task '{name}' did not finish: {join_err}"),
                        ))
                    }
                };
                if tx.send(TaskCompletion { task: name.clone(), result }).await.is_err() {
                    warn!(task = %name, "runtime stopped before task completion was delivered");
                }
            });
        }
    }
}

/// Prepare `tracker` (if needed) and run it to completion with `executor`.
///
/// Structural errors are returned before any task is executed.
pub async fn run_graph<E: TaskExecutor>(
    tracker: TaskTracker,
    executor: E,
    options: SchedulerOptions,
) -> Result<RunSummary> {
    let core = CoreRuntime::new(tracker, options)?;
    Runtime::new(core, executor).run().await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::dag::Task;
    use crate::exec::ExecutionFuture;

    /// Succeeds every task except those named in `failing`, after a short delay.
    #[derive(Default)]
    struct ScriptedExecutor {
        failing: Vec<&'static str>,
        started: Arc<Mutex<Vec<String>>>,
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl TaskExecutor for ScriptedExecutor {
        fn execute(&self, name: &str, _task: &Task) -> ExecutionFuture {
            self.started.lock().unwrap().push(name.to_string());
            let code = if self.failing.iter().any(|f| *f == name) { 1 } else { 0 };
            let running = Arc::clone(&self.running);
            let peak = Arc::clone(&self.peak);

            Box::pin(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                ExecutionResult {
                    return_code: Some(code),
                    ..Default::default()
                }
            })
        }
    }

    fn tracker(layout: &[(&str, &[&str])]) -> TaskTracker {
        let mut tracker = TaskTracker::new();
        for (name, deps) in layout {
            tracker
                .add_task(*name, Task::exec("true").with_dependencies(deps.iter().copied()))
                .unwrap();
        }
        tracker
    }

    fn fast() -> SchedulerOptions {
        SchedulerOptions {
            poll_interval: Duration::from_millis(10),
            ..SchedulerOptions::default()
        }
    }

    #[tokio::test]
    async fn runs_independent_tasks_concurrently() {
        let executor = ScriptedExecutor::default();
        let peak = Arc::clone(&executor.peak);

        let summary = run_graph(tracker(&[("a", &[]), ("b", &[]), ("c", &[])]), executor, fast())
            .await
            .unwrap();

        assert!(summary.all_succeeded());
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn dependents_start_after_their_dependencies() {
        let executor = ScriptedExecutor::default();
        let started = Arc::clone(&executor.started);

        run_graph(
            tracker(&[("build", &[]), ("test", &["build"]), ("deploy", &["test", "build"])]),
            executor,
            fast(),
        )
        .await
        .unwrap();

        assert_eq!(*started.lock().unwrap(), ["build", "test", "deploy"]);
    }

    #[tokio::test]
    async fn failure_skips_downstream_and_run_still_finishes() {
        let executor = ScriptedExecutor {
            failing: vec!["task1"],
            ..Default::default()
        };
        let started = Arc::clone(&executor.started);

        let summary = run_graph(
            tracker(&[("task1", &[]), ("task2", &["task1"]), ("task3", &["task2"]), ("other", &[])]),
            executor,
            fast(),
        )
        .await
        .unwrap();

        let statuses: HashMap<_, _> = summary.rows().iter().map(|r| (r.name.as_str(), r.status)).collect();
        assert_eq!(statuses["task1"], TaskStatus::Failed);
        assert_eq!(statuses["task2"], TaskStatus::Skipped);
        assert_eq!(statuses["task3"], TaskStatus::Skipped);
        assert_eq!(statuses["other"], TaskStatus::Completed);
        assert!(!started.lock().unwrap().iter().any(|n| n == "task2" || n == "task3"));
    }

    #[tokio::test]
    async fn respects_max_parallel() {
        let executor = ScriptedExecutor::default();
        let peak = Arc::clone(&executor.peak);
        let options = SchedulerOptions {
            max_parallel: NonZeroUsize::new(2),
            ..fast()
        };

        let names: Vec<String> = (0..6).map(|i| format!("t{i}")).collect();
        let mut tracker = TaskTracker::new();
        for name in &names {
            tracker.add_task(name.as_str(), Task::exec("true")).unwrap();
        }

        let summary = run_graph(tracker, executor, options).await.unwrap();
        assert_eq!(summary.count(TaskStatus::Completed), 6);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cycle_is_reported_before_anything_runs() {
        let executor = ScriptedExecutor::default();
        let started = Arc::clone(&executor.started);

        let err = run_graph(tracker(&[("a", &["b"]), ("b", &["a"])]), executor, fast())
            .await
            .unwrap_err();

        assert!(matches!(err, DagrunError::CyclicDependency { .. }));
        assert!(started.lock().unwrap().is_empty());
    }

    struct PanickingExecutor;

    impl TaskExecutor for PanickingExecutor {
        fn execute(&self, name: &str, _task: &Task) -> ExecutionFuture {
            let explode = name == "boom";
            Box::pin(async move {
                if explode {
                    panic!("executor blew up");
                }
                ExecutionResult {
                    return_code: Some(0),
                    ..Default::default()
                }
            })
        }
    }

    #[tokio::test]
    async fn panicking_execution_fails_the_task_instead_of_hanging() {
        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            run_graph(
                tracker(&[("boom", &[]), ("after", &["boom"]), ("other", &[])]),
                PanickingExecutor,
                fast(),
            ),
        )
        .await
        .expect("run did not finish")
        .unwrap();

        assert_eq!(summary.status_of("boom"), Some(TaskStatus::Failed));
        assert_eq!(summary.status_of("after"), Some(TaskStatus::Skipped));
        assert_eq!(summary.status_of("other"), Some(TaskStatus::Completed));
    }
}
