//! External process execution for the query tool.
//!
//! [`ProcessRunner`] launches the tool, drains stdout and stderr on two
//! named reader threads, and waits for exit with a bounded timeout. The
//! [`CommandRunner`] trait is the seam the collector depends on, so a cycle
//! can be driven by canned output in tests.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::util::constants::PROCESS_POLL_INTERVAL_MS;
use crate::util::error::{EventScopeError, Result};

/// Output of one successful tool invocation. Discarded after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCollectionResult {
    /// stdout followed by stderr, decoded as UTF-8 (lossy).
    pub combined_output: String,
    /// Process exit code.
    pub exit_code: i32,
}

/// Runs the query tool with a prepared argument list.
///
/// Implementations must return [`EventScopeError::ExternalTool`] for a
/// non-zero exit, carrying the captured output.
pub trait CommandRunner: Send + Sync {
    fn run(&self, args: &[String]) -> Result<RawCollectionResult>;
}

/// Spawns a real child process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, args: &[String]) -> Result<RawCollectionResult> {
        tracing::debug!("Running {} {}", self.program, args.join(" "));

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        hide_console_window(&mut command);

        let mut child = command.spawn().map_err(|source| EventScopeError::Execution {
            program: self.program.clone(),
            source,
        })?;

        let deadline = Instant::now() + self.timeout;
        let readers = spawn_pipe_reader("tool-stdout", child.stdout.take()).and_then(|out| {
            Ok((out, spawn_pipe_reader("tool-stderr", child.stderr.take())?))
        });
        let (stdout, stderr) = match readers {
            Ok(readers) => readers,
            Err(e) => {
                kill_and_reap(&mut child);
                return Err(e);
            }
        };

        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                tracing::warn!(
                    "{} exceeded {}s, killing pid {}",
                    self.program,
                    self.timeout.as_secs(),
                    child.id()
                );
                kill_and_reap(&mut child);
                return Err(EventScopeError::Timeout(self.timeout));
            }
            Err(e) => {
                kill_and_reap(&mut child);
                return Err(e);
            }
        };

        // A process that inherited the pipes can hold them open after the
        // child exits, so draining is bounded by the same deadline.
        let mut combined = collect_pipe(stdout, deadline, self.timeout)?;
        combined.extend(collect_pipe(stderr, deadline, self.timeout)?);
        let combined_output = String::from_utf8_lossy(&combined).into_owned();

        let exit_code = status.code().unwrap_or(-1);
        if !status.success() {
            tracing::warn!("{} exited with code {}", self.program, exit_code);
            return Err(EventScopeError::ExternalTool {
                exit_code,
                output: combined_output,
            });
        }

        tracing::debug!(
            "{} exited cleanly with {} bytes of output",
            self.program,
            combined_output.len()
        );
        Ok(RawCollectionResult {
            combined_output,
            exit_code,
        })
    }
}

/// Poll the child until it exits or `deadline` passes.
///
/// Returns `Ok(None)` on timeout; the caller owns killing the child.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>> {
    let poll = Duration::from_millis(PROCESS_POLL_INTERVAL_MS);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        std::thread::sleep(poll.min(deadline - now));
    }
}

/// The child may have exited between the last poll and the kill, so both
/// results are ignored.
fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

type PipeReader = Option<Receiver<std::io::Result<Vec<u8>>>>;

/// Drain a child pipe to completion on its own thread so neither stream can
/// fill up and stall the child. The bytes arrive on the returned channel.
fn spawn_pipe_reader<R>(name: &str, pipe: Option<R>) -> Result<PipeReader>
where
    R: Read + Send + 'static,
{
    let Some(mut pipe) = pipe else {
        return Ok(None);
    };
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::Builder::new()
        .name(name.into())
        .spawn(move || {
            let mut buf = Vec::new();
            let result = pipe.read_to_end(&mut buf).map(|_| buf);
            // The receiver is gone once the deadline has passed.
            let _ = tx.send(result);
        })?;
    Ok(Some(rx))
}

/// Wait for a reader's bytes until `deadline`. A reader still blocked at the
/// deadline is left detached and the call fails with `Timeout`.
fn collect_pipe(reader: PipeReader, deadline: Instant, timeout: Duration) -> Result<Vec<u8>> {
    let Some(rx) = reader else {
        return Ok(Vec::new());
    };
    match rx.recv_deadline(deadline) {
        Ok(bytes) => Ok(bytes?),
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!("Tool output still open after {}s", timeout.as_secs());
            Err(EventScopeError::Timeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(EventScopeError::Io(std::io::Error::other(
            "pipe reader thread exited without a result",
        ))),
    }
}

/// Keep `wevtutil` from flashing a console window when launched from a
/// windowless parent.
#[cfg(windows)]
fn hide_console_window(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    use windows::Win32::System::Threading::CREATE_NO_WINDOW;
    command.creation_flags(CREATE_NO_WINDOW.0);
}

#[cfg(not(windows))]
fn hide_console_window(_command: &mut Command) {}
