// src/exec/process_runner.rs

//! Production process runner.

use std::fmt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::diagnostic::route_error_line;
use crate::engine::CommandIdentity;
use crate::fs::FileSystem;
use crate::sink::{LineKind, Sink};

use super::backend::{Completion, ProcessHandle, ProcessRunner};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs each command on a task of the given tokio runtime.
///
/// `start` may be called from any thread, inside or outside the runtime.
pub struct TokioProcessRunner {
    runtime: Handle,
    sink: Arc<dyn Sink>,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for TokioProcessRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioProcessRunner")
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl TokioProcessRunner {
    pub fn new(runtime: Handle, sink: Arc<dyn Sink>, fs: Arc<dyn FileSystem>) -> Self {
        Self { runtime, sink, fs }
    }
}

impl ProcessRunner for TokioProcessRunner {
    fn start(&self, command: &CommandIdentity, completion: Completion) -> ProcessHandle {
        let command = command.clone();
        let sink = Arc::clone(&self.sink);
        let fs = Arc::clone(&self.fs);

        let task = self.runtime.spawn(async move {
            run_command(&command, sink.as_ref(), fs.as_ref()).await;
            completion.complete();
        });

        ProcessHandle::from_task(task)
    }
}

/// Run `command` to completion, forwarding its output to `sink`.
///
/// Returns the exit status, or `None` if the process could not be started
/// or waited on. Every failure is reported to the sink; nothing here is
/// fatal.
pub async fn run_command(
    command: &CommandIdentity,
    sink: &dyn Sink,
    fs: &dyn FileSystem,
) -> Option<ExitStatus> {
    sink.write_line(LineKind::Info, &format!("Running \"{command}\""));

    let mut child = match build_command(command.as_path()).spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(command = %command, error = %err, "failed to start command");
            sink.write_line(
                LineKind::Error,
                &format!("failed to start \"{command}\": {err}"),
            );
            return None;
        }
    };

    debug!(command = %command, pid = ?child.id(), "command process started");

    let stdout = forward_lines(child.stdout.take(), |line| {
        sink.write_line(LineKind::Output, &line);
    });
    let stderr = forward_lines(child.stderr.take(), |line| {
        route_error_line(&line, fs, sink);
    });

    // Both pipes are drained to EOF before the run counts as finished.
    let (status, (), ()) = tokio::join!(child.wait(), stdout, stderr);

    match status {
        Ok(status) => {
            info!(
                command = %command,
                exit_code = ?status.code(),
                success = status.success(),
                "command process exited"
            );
            let how = match status.code() {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            };
            sink.write_line(LineKind::Info, &format!("Finished \"{command}\" ({how})"));
            Some(status)
        }
        Err(err) => {
            warn!(command = %command, error = %err, "failed waiting for command process");
            sink.write_line(
                LineKind::Error,
                &format!("lost track of \"{command}\": {err}"),
            );
            None
        }
    }
}

fn build_command(path: &Path) -> Command {
    let mut cmd = Command::new(path);

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);

    cmd
}

/// Feed every line of `reader` to `on_line` until EOF.
///
/// Lines are decoded lossily so a stray invalid byte never stops the pipe
/// from being drained; the line terminator (`\n` or `\r\n`) is removed.
async fn forward_lines<R>(reader: Option<R>, mut on_line: impl FnMut(String))
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return;
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                on_line(String::from_utf8_lossy(&buf).into_owned());
            }
            Err(err) => {
                debug!(error = %err, "output pipe read failed; stopping");
                break;
            }
        }
    }
}
