// src/config/validate.rs

use std::collections::{BTreeSet, HashSet};

use crate::config::model::{RawTask, RawTaskFile, TaskFile, TaskSpec};
use crate::errors::DagrunError;
use crate::types::TaskKind;

impl TryFrom<RawTaskFile> for TaskFile {
    type Error = DagrunError;

    fn try_from(raw: RawTaskFile) -> std::result::Result<Self, Self::Error> {
        let mut problems = Vec::new();

        ensure_has_tasks(&raw, &mut problems);
        validate_global_config(&raw, &mut problems);
        validate_names(&raw, &mut problems);
        validate_task_dependencies(&raw, &mut problems);

        let tasks: Vec<TaskSpec> = raw
            .tasks
            .iter()
            .filter_map(|task| resolve_kind(task, &mut problems))
            .collect();

        if !problems.is_empty() {
            return Err(DagrunError::InvalidTaskFile(problems));
        }
        Ok(TaskFile::new_unchecked(raw.config, tasks))
    }
}

/// Validate a raw task file without consuming it.
pub fn validate_task_file(raw: &RawTaskFile) -> crate::errors::Result<()> {
    TaskFile::try_from(raw.clone()).map(|_| ())
}

fn ensure_has_tasks(raw: &RawTaskFile, problems: &mut Vec<String>) {
    if raw.tasks.is_empty() {
        problems.push("task file must contain at least one [[tasks]] entry".to_string());
    }
}

fn validate_global_config(raw: &RawTaskFile, problems: &mut Vec<String>) {
    if raw.config.max_parallel == Some(0) {
        problems.push("[config].max_parallel must be >= 1 (got 0)".to_string());
    }
    if raw.config.poll_interval_ms == 0 {
        problems.push("[config].poll_interval_ms must be >= 1 (got 0)".to_string());
    }
}

fn validate_names(raw: &RawTaskFile, problems: &mut Vec<String>) {
    let mut seen = HashSet::new();
    let mut reported = BTreeSet::new();

    for (index, task) in raw.tasks.iter().enumerate() {
        if task.name.trim().is_empty() {
            problems.push(format!("task #{} has an empty name", index + 1));
            continue;
        }
        if !seen.insert(task.name.as_str()) && reported.insert(task.name.as_str()) {
            problems.push(format!("duplicate task name '{}'", task.name));
        }
    }
}

fn validate_task_dependencies(raw: &RawTaskFile, problems: &mut Vec<String>) {
    let names: HashSet<&str> = raw.tasks.iter().map(|t| t.name.as_str()).collect();

    for task in &raw.tasks {
        for dep in &task.dependencies {
            if dep == &task.name {
                problems.push(format!("task '{}' cannot depend on itself", task.name));
            } else if !names.contains(dep.as_str()) {
                problems.push(format!("task '{}' has unknown dependency '{}'", task.name, dep));
            }
        }
    }
}

fn resolve_kind(task: &RawTask, problems: &mut Vec<String>) -> Option<TaskSpec> {
    match task.kind.parse::<TaskKind>() {
        Ok(kind) => Some(TaskSpec {
            name: task.name.clone(),
            kind,
            arguments: task.arguments.clone(),
            dependencies: task.dependencies.clone(),
        }),
        Err(err) => {
            problems.push(format!("task '{}': {err}", task.name));
            None
        }
    }
}
