use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dagrun::dag::Task;
use dagrun::exec::{ExecutionFuture, ExecutionResult, FailureKind, TaskExecutor, TaskFailure};

/// Scripted outcome for one task.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Succeed { stdout: String },
    Exit { code: i32, stderr: String },
    Fail { kind: FailureKind, message: String },
}

impl FakeOutcome {
    fn into_result(self) -> ExecutionResult {
        match self {
            FakeOutcome::Succeed { stdout } => ExecutionResult {
                stdout,
                return_code: Some(0),
                ..Default::default()
            },
            FakeOutcome::Exit { code, stderr } => ExecutionResult {
                stderr,
                return_code: Some(code),
                ..Default::default()
            },
            FakeOutcome::Fail { kind, message } => {
                ExecutionResult::from_failure(TaskFailure::new(kind, message))
            }
        }
    }
}

/// A fake executor that:
/// - records which tasks were started, and in which order
/// - returns a scripted result per task (success with empty output otherwise)
/// - optionally sleeps per task, so overlapping executions can be observed
/// - tracks the peak number of executions in flight.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    outcomes: HashMap<String, FakeOutcome>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    started: Arc<Mutex<Vec<String>>>,
    finished: Arc<Mutex<Vec<String>>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed_with(mut self, task: &str, stdout: &str) -> Self {
        self.outcomes.insert(
            task.to_string(),
            FakeOutcome::Succeed {
                stdout: stdout.to_string(),
            },
        );
        self
    }

    pub fn exit_with(mut self, task: &str, code: i32, stderr: &str) -> Self {
        self.outcomes.insert(
            task.to_string(),
            FakeOutcome::Exit {
                code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    pub fn fail_with(mut self, task: &str, kind: FailureKind, message: &str) -> Self {
        self.outcomes.insert(
            task.to_string(),
            FakeOutcome::Fail {
                kind,
                message: message.to_string(),
            },
        );
        self
    }

    pub fn delay(mut self, task: &str, delay: Duration) -> Self {
        self.delays.insert(task.to_string(), delay);
        self
    }

    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Task names in the order the scheduler handed them out.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// Task names in the order their executions finished.
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl TaskExecutor for FakeExecutor {
    fn execute(&self, name: &str, _task: &Task) -> ExecutionFuture {
        self.started.lock().unwrap().push(name.to_string());

        let name = name.to_string();
        let outcome = self
            .outcomes
            .get(&name)
            .cloned()
            .unwrap_or(FakeOutcome::Succeed { stdout: String::new() });
        let delay = self.delays.get(&name).copied().unwrap_or(self.default_delay);
        let finished = Arc::clone(&self.finished);
        let running = Arc::clone(&self.running);
        let peak = Arc::clone(&self.peak);

        Box::pin(async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            running.fetch_sub(1, Ordering::SeqCst);
            finished.lock().unwrap().push(name);
            outcome.into_result()
        })
    }
}
