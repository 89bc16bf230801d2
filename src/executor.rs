//! Child-process executor.
//!
//! Runs a resolved argv with a working directory, a hard timeout, and
//! bounded output capture. Every exit path reaps the child: a command that
//! outlives its deadline is sent SIGTERM (to its whole process group on
//! Unix), given a short grace period, then SIGKILLed and waited on.
//!
//! Partial output is never discarded; a failing or timed-out command still
//! reports whatever it printed, since that is usually what the remote user
//! needs to diagnose the problem. The executor performs no retries:
//! re-running a side-effecting command without idempotency guarantees would
//! be unsafe.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Default per-stream capture cap: 64 KiB. Output past the cap is drained
/// and discarded so a runaway process can neither block on a full pipe nor
/// grow our memory without bound.
pub const DEFAULT_CAPTURE_LIMIT: usize = 64 * 1024;

/// How long a timed-out child gets between SIGTERM and SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Everything needed to run one command. Built once per dispatch and
/// consumed immediately.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Full argv: program, fixed base arguments, then translated flags,
    /// each as a discrete element. Never passed through a shell.
    pub argv: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub capture_limit: usize,
}

/// Captured standard output and error, with truncation flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
}

impl CapturedOutput {
    pub fn is_empty(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }
}

/// Terminal result of one dispatch. Exactly one of these is produced per
/// incoming message and immediately rendered into reply text.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// Process exited with status 0.
    Success { output: CapturedOutput },
    /// Process exited with a nonzero status; output is still captured.
    NonZeroExit { code: i32, output: CapturedOutput },
    /// Process exceeded its deadline and was terminated.
    TimedOut {
        limit: Duration,
        output: CapturedOutput,
    },
    /// Process could not be started (missing executable, permissions, bad
    /// working directory).
    LaunchFailed { detail: String },
    /// Action name not present in the table. Carries every available name,
    /// sorted, plus the rendered listing for the reply.
    UnknownAction {
        requested: String,
        available: Vec<String>,
        listing: String,
    },
    /// The message itself was malformed.
    ParseFailed { detail: String },
    /// A built-in action ran to completion.
    BuiltinDone { detail: String },
    /// A built-in action rejected its parameters or failed.
    BuiltinFailed { detail: String },
    /// Unexpected internal fault; still answered, never silent.
    Fault { detail: String },
}

/// Run the command described by `request` to completion.
///
/// This function blocks until the child has exited or been killed. It is
/// infallible by design: every failure mode maps to an outcome variant.
pub fn execute(request: &ExecutionRequest) -> ExecutionOutcome {
    let Some((program, args)) = request.argv.split_first() else {
        return ExecutionOutcome::LaunchFailed {
            detail: "empty command line".to_string(),
        };
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &request.working_dir {
        command.current_dir(dir);
    }
    #[cfg(unix)]
    {
        // Own process group, so the timeout kill reaches grandchildren too.
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ExecutionOutcome::LaunchFailed {
                detail: format!("failed to launch '{program}': {e}"),
            };
        }
    };

    let stdout_capture = spawn_capture(child.stdout.take(), request.capture_limit);
    let stderr_capture = spawn_capture(child.stderr.take(), request.capture_limit);

    let (status, timed_out) = match child.wait_timeout(request.timeout) {
        Ok(Some(status)) => (Some(status), false),
        Ok(None) => {
            warn!(
                %program,
                timeout_secs = request.timeout.as_secs(),
                "command exceeded timeout, terminating"
            );
            terminate(&mut child);
            (None, true)
        }
        Err(e) => {
            terminate(&mut child);
            return ExecutionOutcome::Fault {
                detail: format!("failed waiting for '{program}': {e}"),
            };
        }
    };

    // The child is dead either way, so the pipes hit EOF and these joins
    // cannot hang.
    let (stdout, stdout_truncated) = join_capture(stdout_capture);
    let (stderr, stderr_truncated) = join_capture(stderr_capture);
    let output = CapturedOutput {
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
    };

    if timed_out {
        return ExecutionOutcome::TimedOut {
            limit: request.timeout,
            output,
        };
    }

    match status.and_then(|s| s.code()) {
        Some(0) => {
            debug!(%program, "command completed");
            ExecutionOutcome::Success { output }
        }
        Some(code) => ExecutionOutcome::NonZeroExit { code, output },
        // Killed by a signal we did not send; no exit code exists.
        None => ExecutionOutcome::NonZeroExit { code: -1, output },
    }
}

type CaptureHandle = Option<JoinHandle<(String, bool)>>;

fn spawn_capture<R: Read + Send + 'static>(stream: Option<R>, limit: usize) -> CaptureHandle {
    stream.map(|mut reader| thread::spawn(move || read_capped(&mut reader, limit)))
}

/// Read a stream to EOF, keeping at most `limit` bytes. The remainder is
/// drained and dropped so the child never stalls on a full pipe.
fn read_capped(reader: &mut impl Read, limit: usize) -> (String, bool) {
    let mut kept = Vec::with_capacity(limit.min(8 * 1024));
    let mut chunk = [0u8; 8 * 1024];
    let mut truncated = false;

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                if kept.len() < limit {
                    let take = n.min(limit - kept.len());
                    kept.extend_from_slice(&chunk[..take]);
                    if take < n {
                        truncated = true;
                    }
                } else {
                    truncated = true;
                }
            }
            Err(_) => break,
        }
    }

    (String::from_utf8_lossy(&kept).into_owned(), truncated)
}

fn join_capture(handle: CaptureHandle) -> (String, bool) {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Terminate a child that exceeded its deadline: graceful signal first,
/// forced kill after the grace period, and always reap.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    let pgid = child.id() as libc::pid_t;
    // The child was spawned with process_group(0), so its pgid is its pid.
    unsafe {
        libc::kill(-pgid, libc::SIGTERM);
    }
    if let Ok(Some(_)) = child.wait_timeout(KILL_GRACE) {
        return;
    }
    unsafe {
        libc::kill(-pgid, libc::SIGKILL);
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
