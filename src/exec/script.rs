// src/exec/script.rs

//! `eval` tasks: run the argument string as a Lua snippet.
//!
//! Each snippet gets a fresh interpreter on a blocking worker thread, so a
//! slow snippet never holds up the dispatch loop. Output written through
//! `print`, `io.write`, `io.stdout`, `io.output()` and `io.stderr` is
//! captured for that execution only; `os.exit` is removed so a snippet cannot end the whole process.

use std::sync::{Arc, Mutex, PoisonError};

use mlua::{Function, Lua, Table, Value, Variadic};
use tracing::{debug, warn};

use crate::exec::result::{ExecutionResult, FailureKind, TaskFailure};

type Buffer = Arc<Mutex<String>>;

/// What a snippet left behind, even when it raised.
#[derive(Debug, Default)]
struct SnippetOutput {
    stdout: String,
    stderr: String,
    error: Option<TaskFailure>,
}

/// Run `source` off the async runtime and translate the outcome.
///
/// Normal completion yields `return_code = Some(0)`. A Lua error or a
/// panicking worker yields a captured failure and no return code.
pub async fn run_snippet(task: &str, source: String) -> ExecutionResult {
    let name = task.to_string();
    let handle = tokio::task::spawn_blocking(move || eval_blocking(&name, &source));

    match handle.await {
        Ok(SnippetOutput {
            stdout,
            stderr,
            error: None,
        }) => {
            debug!(task = %task, "eval snippet completed");
            ExecutionResult {
                stdout: stdout.trim().to_string(),
                stderr: stderr.trim().to_string(),
                return_code: Some(0),
                failure: None,
            }
        }
        Ok(SnippetOutput {
            stdout,
            stderr,
            error: Some(failure),
        }) => {
            warn!(task = %task, error = %failure, "eval snippet raised an error");
            ExecutionResult {
                stdout: stdout.trim().to_string(),
                stderr: stderr.trim().to_string(),
                return_code: None,
                failure: Some(failure),
            }
        }
        Err(join_err) => {
            warn!(task = %task, error = %join_err, "eval worker did not finish");
            ExecutionResult::from_failure(TaskFailure::new(
                FailureKind::Worker,
                format!("snippet worker for task '{task}' failed: {join_err}"),
            ))
        }
    }
}

fn eval_blocking(task: &str, source: &str) -> SnippetOutput {
    let stdout: Buffer = Arc::default();
    let stderr: Buffer = Arc::default();

    let lua = Lua::new();
    let outcome = install_capture(&lua, &stdout, &stderr).and_then(|()| {
        lua.load(source)
            .set_name(format!("={task}"))
            .exec()
    });

    SnippetOutput {
        stdout: take(&stdout),
        stderr: take(&stderr),
        error: outcome
            .err()
            .map(|e| TaskFailure::new(FailureKind::Script, e.to_string())),
    }
}

/// Point the snippet's output functions at the given buffers.
fn install_capture(lua: &Lua, stdout: &Buffer, stderr: &Buffer) -> mlua::Result<()> {
    let globals = lua.globals();

    let out = Arc::clone(stdout);
    let print = lua.create_function(move |lua, args: Variadic<Value>| {
        let mut line = join_values(lua, args, "\t")?;
        line.push('\n');
        append(&out, &line);
        Ok(())
    })?;
    globals.set("print", print)?;

    let io: Table = globals.get("io")?;

    let out = Arc::clone(stdout);
    let write = lua.create_function(move |lua, args: Variadic<Value>| {
        append(&out, &join_values(lua, args, "")?);
        Ok(())
    })?;
    io.set("write", write)?;

    io.set("stdout", capture_stream(lua, stdout)?)?;
    io.set("stderr", capture_stream(lua, stderr)?)?;

    // `io.output()` hands back the default output file; keep it pointing at
    // the captured stdout and ignore attempts to switch it.
    lua.load("local out = io.stdout\nio.output = function() return out end")
        .set_name("=capture")
        .exec()?;

    let os: Table = globals.get("os")?;
    os.set("exit", Value::Nil)?;

    Ok(())
}

/// A file-like table whose `write` appends to `buffer`.
///
/// Method calls (`f:write(...)`) pass the table itself first; `write`
/// returns it so calls can be chained.
fn capture_stream(lua: &Lua, buffer: &Buffer) -> mlua::Result<Table> {
    let stream = lua.create_table()?;

    let sink = Arc::clone(buffer);
    let write = lua.create_function(move |lua, (this, args): (Value, Variadic<Value>)| {
        append(&sink, &join_values(lua, args, "")?);
        Ok(this)
    })?;
    stream.set("write", write)?;

    let noop = lua.create_function(|_, _: Variadic<Value>| Ok(true))?;
    stream.set("flush", noop.clone())?;
    stream.set("close", noop.clone())?;
    stream.set("setvbuf", noop)?;

    Ok(stream)
}

fn join_values(lua: &Lua, args: Variadic<Value>, sep: &str) -> mlua::Result<String> {
    let tostring: Function = lua.globals().get("tostring")?;
    let mut parts = Vec::with_capacity(args.len());
    for value in args.iter() {
        parts.push(tostring.call::<String>(value.clone())?);
    }
    Ok(parts.join(sep))
}

fn append(buffer: &Buffer, text: &str) {
    buffer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push_str(text);
}

fn take(buffer: &Buffer) -> String {
    std::mem::take(&mut *buffer.lock().unwrap_or_else(PoisonError::into_inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn print_is_captured_as_stdout() {
        let result = run_snippet("t", "print('hello from eval')".into()).await;
        assert_eq!(result.return_code, Some(0));
        assert_eq!(result.stdout, "hello from eval");
        assert_eq!(result.stderr, "");
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn print_joins_arguments_with_tabs() {
        let result = run_snippet("t", "print(1, 'two', true, nil)".into()).await;
        assert_eq!(result.stdout, "1\ttwo\ttrue\tnil");
    }

    #[tokio::test]
    async fn stderr_writes_are_captured_separately() {
        let result = run_snippet("t", "io.stderr:write('eval error')".into()).await;
        assert_eq!(result.return_code, Some(0));
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "eval error");
        assert!(result.failure.is_none());
    }

    #[tokio::test]
    async fn file_handles_write_into_the_captured_streams() {
        let source = "io.stdout:write('out') io.output():write('put', 1) \
                      io.stderr:write('e'):write('rr') \
                      io.stdout:flush() io.stderr:flush() io.output():close()";
        let result = run_snippet("t", source.into()).await;
        assert!(result.failure.is_none(), "{:?}", result.failure);
        assert_eq!(result.return_code, Some(0));
        assert_eq!(result.stdout, "output1");
        assert_eq!(result.stderr, "err");
    }

    #[tokio::test]
    async fn io_write_goes_to_stdout() {
        let result = run_snippet("t", "io.write('a', 1) io.write('b')".into()).await;
        assert_eq!(result.stdout, "a1b");
    }

    #[tokio::test]
    async fn raised_error_is_captured_without_return_code() {
        let result = run_snippet("t", "error('eval exception')".into()).await;
        assert_eq!(result.return_code, None);
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "");
        let failure = result.failure.expect("failure expected");
        assert_eq!(failure.kind, FailureKind::Script);
        assert!(failure.message.contains("eval exception"));
    }

    #[tokio::test]
    async fn output_before_an_error_is_kept() {
        let result = run_snippet("t", "print('partial') error('boom')".into()).await;
        assert_eq!(result.stdout, "partial");
        assert!(result.failure.is_some());
    }

    #[tokio::test]
    async fn syntax_error_is_a_script_failure() {
        let result = run_snippet("t", "this is not lua".into()).await;
        assert_eq!(result.failure.map(|f| f.kind), Some(FailureKind::Script));
    }

    #[tokio::test]
    async fn os_exit_is_unavailable() {
        let result = run_snippet("t", "os.exit(0)".into()).await;
        assert!(result.failure.is_some());
    }

    #[tokio::test]
    async fn snippets_do_not_share_state() {
        let first = run_snippet("a", "shared = 41 print(shared)".into()).await;
        let second = run_snippet("b", "print(shared)".into()).await;
        assert_eq!(first.stdout, "41");
        assert_eq!(second.stdout, "nil");
    }
}
