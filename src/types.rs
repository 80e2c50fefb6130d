// src/types.rs

//! Small shared vocabulary types: task names, kinds and statuses.

use std::fmt;
use std::str::FromStr;

use crate::errors::DagrunError;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// What a task does when it runs.
///
/// - `Exec`: run the argument string through the platform shell.
/// - `Eval`: run the argument string as an in-process Lua snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Exec,
    Eval,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Exec => "exec",
            TaskKind::Eval => "eval",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = DagrunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exec" => Ok(TaskKind::Exec),
            "eval" => Ok(TaskKind::Eval),
            other => Err(DagrunError::UnknownTaskType(other.to_string())),
        }
    }
}

/// Lifecycle of a task within one scheduling run.
///
/// ```text
/// Pending -> Running -> Completed | Failed
/// Pending -> Skipped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    /// A failed or skipped dependency poisons every downstream task.
    pub fn blocks_dependents(&self) -> bool {
        matches!(self, TaskStatus::Failed | TaskStatus::Skipped)
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Skipped)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_case_insensitive() {
        assert_eq!("EXEC".parse::<TaskKind>().unwrap(), TaskKind::Exec);
        assert_eq!(" eval ".parse::<TaskKind>().unwrap(), TaskKind::Eval);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        match "python".parse::<TaskKind>() {
            Err(DagrunError::UnknownTaskType(kind)) => assert_eq!(kind, "python"),
            other => panic!("expected UnknownTaskType, got {other:?}"),
        }
    }

    #[test]
    fn terminal_states_never_transition() {
        let all = [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Skipped,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(!from.can_transition_to(to), "{from} -> {to} allowed");
            }
        }
    }

    #[test]
    fn running_cannot_be_skipped() {
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Skipped));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Skipped));
    }
}
