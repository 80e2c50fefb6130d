// src/config/loader.rs

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::config::model::{RawTaskFile, TaskFile};
use crate::dag::TaskTracker;
use crate::errors::Result;
use crate::observer::TaskObserver;

/// Serialisation format of a task file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Toml,
    Json,
}

impl InputFormat {
    /// `.json` (any case) means JSON; everything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Toml,
        }
    }

    pub fn parse(self, contents: &str) -> Result<RawTaskFile> {
        let raw: RawTaskFile = match self {
            InputFormat::Toml => toml::from_str(contents)?,
            InputFormat::Json => serde_json::from_str(contents)?,
        };
        Ok(raw)
    }
}

/// Load a task file from a given path and return the raw `RawTaskFile`.
///
/// This only performs deserialisation; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawTaskFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let format = InputFormat::from_path(path);
    debug!(path = %path.display(), ?format, "parsing task file");

    format.parse(&contents)
}

/// Load a task file from path and validate every entry.
///
/// Cycles are not detected here; they surface when the tracker built from the
/// file is prepared.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<TaskFile> {
    let raw = load_from_path(&path)?;
    TaskFile::try_from(raw)
}

/// Register every task of `file` with `tracker`, in file order.
pub fn populate_tracker(tracker: &mut TaskTracker, file: &TaskFile) -> Result<()> {
    for spec in file.tasks() {
        tracker.add_task(spec.name.clone(), spec.to_task())?;
    }
    Ok(())
}

/// Build a fresh tracker reporting to `observer` and fill it from `file`.
pub fn build_tracker(file: &TaskFile, observer: Arc<dyn TaskObserver>) -> Result<TaskTracker> {
    let mut tracker = TaskTracker::with_observer(observer);
    populate_tracker(&mut tracker, file)?;
    Ok(tracker)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(InputFormat::from_path(&PathBuf::from("tasks.json")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(&PathBuf::from("TASKS.JSON")), InputFormat::Json);
        assert_eq!(InputFormat::from_path(&PathBuf::from("tasks.toml")), InputFormat::Toml);
        assert_eq!(InputFormat::from_path(&PathBuf::from("tasks")), InputFormat::Toml);
    }

    #[test]
    fn parses_both_formats_to_same_model() {
        let toml_src = r#"
            [config]
            max_parallel = 2

            [[tasks]]
            name = "a"
            type = "exec"
            arguments = "echo a"

            [[tasks]]
            name = "b"
            type = "eval"
            arguments = "print(1)"
            dependencies = ["a"]
        "#;
        let json_src = r#"{
            "config": {"max_parallel": 2},
            "tasks": [
                {"name": "a", "type": "exec", "arguments": "echo a"},
                {"name": "b", "type": "eval", "arguments": "print(1)", "dependencies": ["a"]}
            ]
        }"#;

        let from_toml = InputFormat::Toml.parse(toml_src).unwrap();
        let from_json = InputFormat::Json.parse(json_src).unwrap();

        assert_eq!(from_toml.config, from_json.config);
        assert_eq!(from_toml.tasks, from_json.tasks);
        assert_eq!(from_toml.config.poll_interval_ms, 250);
        assert_eq!(from_toml.tasks[1].dependencies, vec!["a".to_string()]);
    }
}
