// src/exec/command.rs

//! `exec` tasks: run the argument string through the platform shell.

use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::exec::result::{ExecutionResult, FailureKind, TaskFailure};

/// Run `command_line` in a shell and capture its trimmed stdout/stderr and
/// exit code. Never fails; launch and IO errors end up in `failure`.
pub async fn run_command(task: &str, command_line: &str) -> ExecutionResult {
    capture(task, shell_command(command_line)).await
}

/// Build a shell command appropriate for the platform.
fn shell_command(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    }
}

async fn capture(task: &str, mut cmd: Command) -> ExecutionResult {
    match capture_inner(task, &mut cmd).await {
        Ok(result) => result,
        Err(failure) => {
            warn!(task = %task, error = %failure, "task process could not be run");
            ExecutionResult::from_failure(failure)
        }
    }
}

async fn capture_inner(task: &str, cmd: &mut Command) -> Result<ExecutionResult, TaskFailure> {
    debug!(task = %task, cmd = ?cmd.as_std(), "starting task process");

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| {
        TaskFailure::new(
            FailureKind::Spawn,
            format!("spawning process for task '{task}': {e}"),
        )
    })?;

    let output = child.wait_with_output().await.map_err(|e| {
        TaskFailure::new(
            FailureKind::Io,
            format!("waiting for process of task '{task}': {e}"),
        )
    })?;

    let return_code = output.status.code();
    info!(
        task = %task,
        exit_code = ?return_code,
        success = output.status.success(),
        "task process exited"
    );

    Ok(ExecutionResult {
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        return_code,
        failure: return_code
            .is_none()
            .then(|| signal_failure(&output.status)),
    })
}

#[cfg(unix)]
fn signal_failure(status: &ExitStatus) -> TaskFailure {
    use std::os::unix::process::ExitStatusExt;

    let message = match status.signal() {
        Some(sig) => format!("process killed by signal {sig}"),
        None => "process exited without a code".to_string(),
    };
    TaskFailure::new(FailureKind::Signal, message)
}

#[cfg(not(unix))]
fn signal_failure(_status: &ExitStatus) -> TaskFailure {
    TaskFailure::new(FailureKind::Signal, "process exited without a code")
}
