//! Worker supervision: launch one rasterizer process and capture its output.
//!
//! ## Why drain both pipes concurrently?
//!
//! A rasterizer streaming a 200-DPI document easily produces tens of
//! megabytes on stdout, far beyond the OS pipe buffer (typically 64 KiB).
//! If nothing reads the pipe while the process runs, Poppler blocks on
//! `write(2)` the moment the buffer fills — and a supervisor that only reads
//! after `wait()` then deadlocks forever. Both streams are therefore read to
//! completion *concurrently with* process execution, joined with the exit
//! wait in a single `tokio::join!`.

use crate::error::Pdf2ImgError;
use crate::pipeline::command::WorkerInvocation;
use crate::pipeline::partition::PageRange;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

/// What one worker produced, handed to the aggregator untouched.
#[derive(Debug)]
pub(crate) struct WorkerResult {
    /// Position of the worker's range in partition order.
    pub range_index: usize,
    /// The page range the worker was assigned.
    pub range: PageRange,
    /// Captured stdout. Empty or ignorable for directory-mode invocations.
    pub stdout: Vec<u8>,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

/// Launch the invocation and await its completion.
///
/// Returns [`Pdf2ImgError::ToolNotLaunchable`] when the process cannot be
/// created at all — a deployment problem, distinct from anything the tool
/// reports once running. All pipe handles are closed on every path out of
/// this function, including the failed-launch one (nothing was opened yet)
/// and read errors (the `join!` still awaits the child).
pub(crate) async fn run(invocation: &WorkerInvocation) -> Result<WorkerResult, Pdf2ImgError> {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(ref path) = invocation.child_path {
        cmd.env("PATH", path);
    }

    let mut child = cmd.spawn().map_err(|e| Pdf2ImgError::ToolNotLaunchable {
        tool: invocation.program.clone(),
        source: e,
    })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| Pdf2ImgError::Internal("child stdout pipe missing".into()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| Pdf2ImgError::Internal("child stderr pipe missing".into()))?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let (stdout_read, stderr_read, status) = tokio::join!(
        stdout_pipe.read_to_end(&mut stdout),
        stderr_pipe.read_to_end(&mut stderr),
        child.wait(),
    );

    stdout_read.map_err(|e| Pdf2ImgError::Internal(format!("reading worker stdout: {e}")))?;
    stderr_read.map_err(|e| Pdf2ImgError::Internal(format!("reading worker stderr: {e}")))?;
    let status =
        status.map_err(|e| Pdf2ImgError::Internal(format!("waiting for worker: {e}")))?;

    // Exit status is informational only; the failure policy keys off stderr
    // content in the aggregator.
    debug!(
        range_index = invocation.range_index,
        first = invocation.range.first,
        last = invocation.range.last,
        status = %status,
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "worker finished"
    );

    Ok(WorkerResult {
        range_index: invocation.range_index,
        range: invocation.range,
        stdout,
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::command::OutputTarget;
    use std::ffi::OsString;

    fn invocation(program: &str, args: &[&str]) -> WorkerInvocation {
        WorkerInvocation {
            range_index: 0,
            range: PageRange { first: 1, last: 1 },
            program: program.to_string(),
            args: args.iter().map(OsString::from).collect(),
            child_path: None,
            target: OutputTarget::Stdout,
        }
    }

    #[tokio::test]
    async fn missing_binary_is_not_launchable() {
        let err = run(&invocation("pdf2img-no-such-rasterizer", &[]))
            .await
            .unwrap_err();
        match err {
            Pdf2ImgError::ToolNotLaunchable { tool, source } => {
                assert_eq!(tool, "pdf2img-no-such-rasterizer");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected ToolNotLaunchable, got {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout_and_stderr_separately() {
        let result = run(&invocation(
            "sh",
            &["-c", "printf rendered; printf 'some warning' >&2"],
        ))
        .await
        .unwrap();

        assert_eq!(result.stdout, b"rendered");
        assert_eq!(result.stderr, "some warning");
        assert_eq!(result.range_index, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_larger_than_pipe_buffer_does_not_deadlock() {
        // 1 MiB on both streams — far beyond any OS pipe buffer. A
        // sequential read-after-wait implementation hangs here.
        let result = run(&invocation(
            "sh",
            &[
                "-c",
                "head -c 1048576 /dev/zero; head -c 1048576 /dev/zero >&2",
            ],
        ))
        .await
        .unwrap();

        assert_eq!(result.stdout.len(), 1_048_576);
        assert_eq!(result.stderr.len(), 1_048_576);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_not_itself_an_error() {
        let result = run(&invocation("sh", &["-c", "exit 3"])).await.unwrap();
        assert!(result.stdout.is_empty());
        assert!(result.stderr.is_empty());
    }
}
