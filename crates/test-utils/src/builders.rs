#![allow(dead_code)]

use std::sync::Arc;

use dagrun::config::{ConfigSection, RawTask, RawTaskFile, TaskFile};
use dagrun::dag::{Task, TaskTracker};
use dagrun::observer::TaskObserver;

/// Builder for task files, producing either the raw serde model, a validated
/// `TaskFile`, or a ready-to-prepare `TaskTracker`.
pub struct TaskFileBuilder {
    file: RawTaskFile,
}

impl TaskFileBuilder {
    pub fn new() -> Self {
        Self {
            file: RawTaskFile {
                config: ConfigSection::default(),
                tasks: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskBuilder) -> Self {
        self.file.tasks.push(task.build());
        self
    }

    /// Shorthand for an `exec` task running `cmd`.
    pub fn exec(self, name: &str, cmd: &str, deps: &[&str]) -> Self {
        self.with_task(TaskBuilder::exec(name, cmd).after_all(deps))
    }

    /// Shorthand for an `eval` task running `source`.
    pub fn eval(self, name: &str, source: &str, deps: &[&str]) -> Self {
        self.with_task(TaskBuilder::eval(name, source).after_all(deps))
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.file.config.max_parallel = Some(n);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.file.config.poll_interval_ms = ms;
        self
    }

    pub fn raw(self) -> RawTaskFile {
        self.file
    }

    pub fn build(self) -> TaskFile {
        TaskFile::try_from(self.file).expect("Failed to build valid task file from builder")
    }

    /// Register every task with a new tracker, skipping file validation so
    /// structurally broken graphs can be tested too.
    pub fn tracker(self) -> TaskTracker {
        let mut tracker = TaskTracker::new();
        fill(&mut tracker, self.file);
        tracker
    }

    pub fn tracker_with_observer(self, observer: Arc<dyn TaskObserver>) -> TaskTracker {
        let mut tracker = TaskTracker::with_observer(observer);
        fill(&mut tracker, self.file);
        tracker
    }
}

impl Default for TaskFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn fill(tracker: &mut TaskTracker, file: RawTaskFile) {
    for raw in file.tasks {
        let kind = raw.kind.parse().expect("builder task kind must be valid");
        let task = Task::new(kind, raw.arguments).with_dependencies(raw.dependencies);
        tracker
            .add_task(raw.name, task)
            .expect("builder tasks must have unique names");
    }
}

/// Builder for one `[[tasks]]` entry.
pub struct TaskBuilder {
    task: RawTask,
}

impl TaskBuilder {
    pub fn new(name: &str, kind: &str, arguments: &str) -> Self {
        Self {
            task: RawTask {
                name: name.to_string(),
                kind: kind.to_string(),
                arguments: arguments.to_string(),
                dependencies: vec![],
            },
        }
    }

    pub fn exec(name: &str, cmd: &str) -> Self {
        Self::new(name, "exec", cmd)
    }

    pub fn eval(name: &str, source: &str) -> Self {
        Self::new(name, "eval", source)
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.dependencies.push(dep.to_string());
        self
    }

    pub fn after_all(mut self, deps: &[&str]) -> Self {
        self.task.dependencies.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn build(self) -> RawTask {
        self.task
    }
}
