// src/dag/mod.rs

//! DAG representation and readiness tracking.
//!
//! - [`task`] holds the task description and its status.
//! - [`graph`] keeps adjacency information and detects cycles.
//! - [`tracker`] owns the task set and decides which tasks are ready,
//!   applying skip propagation when a dependency failed.

pub mod graph;
pub mod task;
pub mod tracker;

pub use graph::DagGraph;
pub use task::Task;
pub use tracker::TaskTracker;
