// src/errors.rs

//! Crate-wide error type.
//!
//! Structural problems with the task set (duplicates, dangling dependencies,
//! cycles) and misuse of the tracker API surface here. Failures of individual
//! tasks never do: they live inside `ExecutionResult`.

use thiserror::Error;

use crate::types::{TaskName, TaskStatus};

#[derive(Error, Debug)]
pub enum DagrunError {
    #[error("invalid task file: {}", .0.join("; "))]
    InvalidTaskFile(Vec<String>),

    #[error("duplicate task name '{0}'")]
    DuplicateTaskName(TaskName),

    #[error("task '{task}' has unknown dependencies: {}", .missing.join(", "))]
    UnknownDependency {
        task: TaskName,
        missing: Vec<TaskName>,
    },

    #[error("cycle detected in task graph: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<TaskName> },

    #[error("unknown task '{0}'")]
    UnknownTask(TaskName),

    #[error("task '{0}' was marked done before being handed out as ready")]
    TaskNotDispatched(TaskName),

    #[error("unknown task type '{0}' (expected \"exec\" or \"eval\")")]
    UnknownTaskType(String),

    #[error("task '{task}' cannot move from {from} to {to}")]
    InvalidTransition {
        task: TaskName,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("task graph has not been prepared")]
    NotPrepared,

    #[error("task graph is already prepared; tasks can no longer be added")]
    AlreadyPrepared,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DagrunError>;
