// tests/loader_errors.rs

use std::io::Write;
use std::sync::Arc;

use tempfile::{Builder, NamedTempFile};

use dagrun::config::{build_tracker, load_and_validate, load_from_path};
use dagrun::errors::DagrunError;
use dagrun::observer::TracingObserver;
use dagrun::types::TaskKind;

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_toml_task_file() {
    let file = toml_file(
        r#"
[config]
max_parallel = 2

[[tasks]]
name = "build"
type = "exec"
arguments = "make"

[[tasks]]
name = "check"
type = "eval"
arguments = "print('ok')"
dependencies = ["build"]
"#,
    );

    let tasks = load_and_validate(file.path()).unwrap();
    assert_eq!(tasks.tasks().len(), 2);
    assert_eq!(tasks.tasks()[1].kind, TaskKind::Eval);
    assert_eq!(tasks.tasks()[1].dependencies, vec!["build".to_string()]);
    assert_eq!(tasks.scheduler_options().max_parallel.map(|n| n.get()), Some(2));

    let tracker = build_tracker(&tasks, Arc::new(TracingObserver)).unwrap();
    assert_eq!(tracker.len(), 2);
}

#[test]
fn loads_json_task_file() {
    let file = json_file(
        r#"{"tasks": [
            {"name": "a", "type": "exec", "arguments": "echo a"},
            {"name": "b", "type": "exec", "arguments": "echo b", "dependencies": ["a"]}
        ]}"#,
    );

    let tasks = load_and_validate(file.path()).unwrap();
    assert_eq!(tasks.tasks().len(), 2);
    assert!(tasks.scheduler_options().max_parallel.is_none());
}

#[test]
fn unknown_type_and_dependency_are_reported_together() {
    let file = toml_file(
        r#"
[[tasks]]
name = "a"
type = "python"
arguments = "print(1)"
dependencies = ["missing"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagrunError::InvalidTaskFile(problems)) => {
            assert_eq!(problems.len(), 2, "{problems:?}");
            assert!(problems.iter().any(|p| p.contains("python")));
            assert!(problems.iter().any(|p| p.contains("missing")));
        }
        other => panic!("expected InvalidTaskFile, got {other:?}"),
    }
}

#[test]
fn cycle_passes_file_validation_but_fails_prepare() {
    let file = toml_file(
        r#"
[[tasks]]
name = "A"
type = "exec"
dependencies = ["B"]

[[tasks]]
name = "B"
type = "exec"
dependencies = ["A"]
"#,
    );

    let tasks = load_and_validate(file.path()).unwrap();
    let mut tracker = build_tracker(&tasks, Arc::new(TracingObserver)).unwrap();

    let err = tracker.prepare().unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, DagrunError::CyclicDependency { .. }));
    assert!(msg.contains("cycle detected"));
    assert!(msg.contains("A -> B -> A"));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = toml_file("[[tasks]\nname = ");
    assert!(matches!(load_from_path(file.path()), Err(DagrunError::TomlError(_))));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let file = json_file("{\"tasks\": [");
    assert!(matches!(load_from_path(file.path()), Err(DagrunError::JsonError(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    assert!(matches!(load_from_path(&path), Err(DagrunError::IoError(_))));
}
