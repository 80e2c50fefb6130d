// src/dag/graph.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::dag::task::Task;
use crate::types::TaskName;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: tasks that must finish before this one can run.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that list this one as a dependency.
    dependents: Vec<TaskName>,
}

/// In-memory adjacency view of a task set, keyed by task name.
///
/// Building the graph never fails; dangling dependency names and cycles are
/// reported by [`DagGraph::missing_dependencies`] and [`DagGraph::find_cycle`]
/// so the caller decides how to surface them.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: BTreeMap<TaskName, DagNode>,
}

impl DagGraph {
    pub fn from_tasks(tasks: &BTreeMap<TaskName, Task>) -> Self {
        let mut nodes: BTreeMap<TaskName, DagNode> = tasks
            .iter()
            .map(|(name, task)| {
                (
                    name.clone(),
                    DagNode {
                        deps: task.dependencies().to_vec(),
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        // Second pass: populate dependents based on deps.
        for (name, task) in tasks {
            for dep in task.dependencies() {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// All task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks with no dependencies.
    pub fn roots(&self) -> Vec<TaskName> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.deps.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Dependency names that do not resolve to a task, per referencing task.
    pub fn missing_dependencies(&self) -> BTreeMap<TaskName, Vec<TaskName>> {
        let mut missing = BTreeMap::new();
        for (name, node) in &self.nodes {
            let unknown: Vec<TaskName> = node
                .deps
                .iter()
                .filter(|dep| !self.nodes.contains_key(*dep))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                missing.insert(name.clone(), unknown);
            }
        }
        missing
    }

    /// Return one dependency cycle, if any, as a closed path
    /// `a -> b -> ... -> a` where each arrow reads "depends on".
    ///
    /// Unknown dependency names are ignored here.
    pub fn find_cycle(&self) -> Option<Vec<TaskName>> {
        // Edge direction: task -> dep.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in &self.nodes {
            for dep in &node.deps {
                if self.nodes.contains_key(dep) {
                    graph.add_edge(name.as_str(), dep.as_str(), ());
                }
            }
        }

        let mut components = tarjan_scc(&graph);
        // Deterministic choice between several independent cycles.
        components.iter_mut().for_each(|c| c.sort_unstable());
        components.sort();

        components
            .into_iter()
            .find(|c| c.len() > 1 || graph.contains_edge(c[0], c[0]))
            .map(|component| walk_cycle(&graph, &component))
    }

    /// Group tasks into waves: every task in wave `n` depends only on tasks in
    /// waves `< n`. Returns `None` if the graph is not a complete DAG.
    pub fn layers(&self) -> Option<Vec<Vec<TaskName>>> {
        let mut remaining: HashMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(name, node)| (name.as_str(), node.deps.len()))
            .collect();

        let mut current: Vec<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut layers = Vec::new();
        let mut placed = 0;

        while !current.is_empty() {
            current.sort_unstable();
            placed += current.len();

            let mut next = Vec::new();
            for name in &current {
                for dependent in self.dependents_of(name) {
                    if let Some(count) = remaining.get_mut(dependent.as_str()) {
                        *count -= 1;
                        if *count == 0 {
                            next.push(dependent.as_str());
                        }
                    }
                }
            }

            layers.push(current.iter().map(|s| s.to_string()).collect());
            current = next;
        }

        (placed == self.nodes.len()).then_some(layers)
    }
}

/// Follow edges inside a strongly connected component until a node repeats.
///
/// Every node of a cyclic component has an outgoing edge that stays inside the
/// component, so the walk always closes.
fn walk_cycle(graph: &DiGraphMap<&str, ()>, component: &[&str]) -> Vec<TaskName> {
    let members: HashSet<&str> = component.iter().copied().collect();
    let mut path: Vec<&str> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut current = component[0];

    loop {
        if let Some(&start) = position.get(current) {
            let mut cycle: Vec<TaskName> = path[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(current.to_string());
            return cycle;
        }
        position.insert(current, path.len());
        path.push(current);

        let next = graph
            .neighbors(current)
            .filter(|n| members.contains(n))
            .min();
        match next {
            Some(n) => current = n,
            None => return path.iter().map(|s| s.to_string()).collect(),
        }
    }
}
