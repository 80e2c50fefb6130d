// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] provides the `TaskExecutor` trait and the production
//!   `RealExecutor`, which tests can replace with a fake.
//! - [`command`] runs `exec` tasks through the platform shell using
//!   `tokio::process::Command`.
//! - [`script`] runs `eval` tasks as Lua snippets on a blocking worker.
//! - [`result`] holds `ExecutionResult` and the captured failure types.

pub mod backend;
pub mod command;
pub mod result;
pub mod script;

pub use backend::{ExecutionFuture, RealExecutor, TaskExecutor};
pub use result::{ExecutionResult, FailureKind, TaskFailure};
