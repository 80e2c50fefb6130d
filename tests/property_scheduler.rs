// tests/property_scheduler.rs

mod common;
use crate::common::builders::TaskFileBuilder;

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;

use dagrun::dag::TaskTracker;
use dagrun::errors::DagrunError;
use dagrun::types::TaskStatus;

/// Random acyclic graphs: task N may only depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), num_tasks).prop_map(
            |raw| {
                raw.into_iter()
                    .enumerate()
                    .map(|(i, picks)| {
                        let deps: BTreeSet<usize> =
                            picks.into_iter().filter(|_| i > 0).map(|p| p % i.max(1)).collect();
                        deps.into_iter().collect()
                    })
                    .collect()
            },
        )
    })
}

fn name(i: usize) -> String {
    format!("task_{i}")
}

fn build(deps: &[Vec<usize>]) -> TaskTracker {
    let mut builder = TaskFileBuilder::new();
    for (i, task_deps) in deps.iter().enumerate() {
        let dep_names: Vec<String> = task_deps.iter().map(|d| name(*d)).collect();
        let dep_refs: Vec<&str> = dep_names.iter().map(String::as_str).collect();
        builder = builder.exec(&name(i), "true", &dep_refs);
    }
    builder.tracker()
}

/// Drain the tracker, failing every task in `failing`. Returns the dispatch
/// order of tasks that actually ran.
fn drive(tracker: &mut TaskTracker, failing: &HashSet<String>) -> Vec<String> {
    let mut ran = Vec::new();
    let mut rounds = 0;
    while tracker.is_active() {
        rounds += 1;
        assert!(rounds <= 10_000, "tracker did not terminate");

        for task in tracker.get_ready().unwrap() {
            tracker.set_status(&task, TaskStatus::Running).unwrap();
            let status = if failing.contains(&task) {
                TaskStatus::Failed
            } else {
                TaskStatus::Completed
            };
            tracker.set_status(&task, status).unwrap();
            tracker.mark_done(&task).unwrap();
            ran.push(task);
        }
    }
    ran
}

proptest! {
    #[test]
    fn every_task_ends_terminal_and_skips_follow_blocked_dependencies(
        deps in dag_strategy(12),
        failing in proptest::collection::hash_set(0..12usize, 0..4),
    ) {
        let failing: HashSet<String> = failing.into_iter().map(name).collect();
        let mut tracker = build(&deps);
        tracker.prepare().unwrap();

        let ran = drive(&mut tracker, &failing);
        let position: std::collections::HashMap<&str, usize> =
            ran.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

        for (i, task_deps) in deps.iter().enumerate() {
            let task = name(i);
            let status = tracker.status_of(&task).unwrap();
            prop_assert!(status.is_terminal());

            let blocked = task_deps
                .iter()
                .any(|d| tracker.status_of(&name(*d)).unwrap().blocks_dependents());
            prop_assert_eq!(status == TaskStatus::Skipped, blocked);

            if let Some(&at) = position.get(task.as_str()) {
                for d in task_deps {
                    let dep_at = position.get(name(*d).as_str()).copied();
                    prop_assert!(dep_at.is_some_and(|p| p < at));
                }
            }
        }
    }

    #[test]
    fn prepare_rejects_any_back_edge(
        deps in dag_strategy(10),
        from in any::<usize>(),
    ) {
        // Close a cycle: the last task gets a dependent that it depends on.
        let n = deps.len();
        let mut deps = deps;
        if n < 2 {
            return Ok(());
        }
        let target = from % (n - 1);
        deps[n - 1].push(target);
        deps[target].push(n - 1);

        let mut tracker = build(&deps);
        let is_cycle = matches!(tracker.prepare(), Err(DagrunError::CyclicDependency { .. }));
        prop_assert!(is_cycle);
    }
}
