// src/config/model.rs

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

use crate::dag::Task;
use crate::engine::SchedulerOptions;
use crate::types::{TaskKind, TaskName};

/// Top-level task file as read from TOML or JSON.
///
/// ```toml
/// [config]
/// max_parallel = 4
/// poll_interval_ms = 250
///
/// [[tasks]]
/// name = "build"
/// type = "exec"
/// arguments = "make"
///
/// [[tasks]]
/// name = "check"
/// type = "eval"
/// arguments = "print('ok')"
/// dependencies = ["build"]
/// ```
///
/// The equivalent JSON document is
/// `{"config": {...}, "tasks": [{"name": ..., "type": ..., ...}]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTaskFile {
    /// Scheduler settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Tasks in file order.
    #[serde(default)]
    pub tasks: Vec<RawTask>,
}

/// `[config]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigSection {
    /// Upper bound on concurrently running tasks. Absent means unbounded.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// How long the scheduler loop sleeps when nothing can be launched.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_parallel: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// One `[[tasks]]` entry, exactly as written.
///
/// `type` stays a string here so an unknown kind is reported together with
/// every other problem in the file instead of failing deserialisation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawTask {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub arguments: String,

    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// A validated task entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: TaskName,
    pub kind: TaskKind,
    pub arguments: String,
    pub dependencies: Vec<TaskName>,
}

impl TaskSpec {
    pub fn to_task(&self) -> Task {
        Task::new(self.kind, self.arguments.clone()).with_dependencies(self.dependencies.iter().cloned())
    }
}

/// A task file that passed validation.
///
/// Only constructible through `TryFrom<RawTaskFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct TaskFile {
    config: ConfigSection,
    tasks: Vec<TaskSpec>,
}

impl TaskFile {
    pub(crate) fn new_unchecked(config: ConfigSection, tasks: Vec<TaskSpec>) -> Self {
        Self { config, tasks }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    /// Scheduler options described by `[config]`.
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            max_parallel: self.config.max_parallel.and_then(NonZeroUsize::new),
            poll_interval: Duration::from_millis(self.config.poll_interval_ms),
        }
    }
}
