// src/config/mod.rs

//! Task file loading and validation for dagrun.
//!
//! Responsibilities:
//! - Define the TOML/JSON-backed data model (`model.rs`).
//! - Load a task file from disk (`loader.rs`).
//! - Validate per-task invariants before anything reaches the tracker
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{InputFormat, build_tracker, load_and_validate, load_from_path, populate_tracker};
pub use model::{ConfigSection, RawTask, RawTaskFile, TaskFile, TaskSpec};
