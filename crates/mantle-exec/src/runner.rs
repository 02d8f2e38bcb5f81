//! Command runners

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io::Read;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::{CommandRequest, Error, Result};

/// How long a killed command's pipes may stay open before its output is abandoned.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the child was terminated by a signal
    pub code: Option<i32>,
    /// Raw stdout; rendered manifests are written from these bytes unchanged
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(code: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout decoded as UTF-8, invalid sequences replaced.
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Stdout followed by stderr, for diagnostics.
    pub fn combined(&self) -> String {
        let stdout = self.stdout_text();
        match (stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => stdout.into_owned(),
            (true, false) => self.stderr.clone(),
            (false, false) if stdout.ends_with('\n') => format!("{stdout}{}", self.stderr),
            (false, false) => format!("{stdout}\n{}", self.stderr),
        }
    }
}

/// Executes [`CommandRequest`]s.
pub trait CommandRunner {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput> {
        (**self).run(request)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput> {
        (**self).run(request)
    }
}

/// Runs requests as real child processes.
///
/// A request without its own timeout inherits the runner's default. The
/// child's stdin is closed; stdout and stderr are captured.
///
/// On unix each child leads its own process group, so a timeout or
/// [`SystemRunner::terminate_all`] also reaches the processes it started.
/// Clones share the set of running children.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    default_timeout: Option<Duration>,
    running: Arc<Mutex<BTreeSet<u32>>>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_timeout(timeout: Duration) -> Self {
        Self {
            default_timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Kill every running child together with its descendants.
    ///
    /// Returns the number of children signalled.
    pub fn terminate_all(&self) -> usize {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        for &pid in running.iter() {
            kill_group(pid);
        }
        running.len()
    }

    fn track(&self, pid: u32) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pid);
    }

    fn untrack(&self, pid: u32) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&pid);
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput> {
        debug!(command = %request, "Running external command");

        let mut command = request.to_command();
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: request.program().to_string(),
                source,
            })?;
        let pid = child.id();
        self.track(pid);

        // Drain both pipes concurrently so a chatty child never blocks on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let limit = request.get_timeout().or(self.default_timeout);
        let waited = wait(&mut child, limit);
        if !matches!(waited, Ok(Some(_))) {
            kill_group(pid);
            let _ = child.kill();
            let _ = child.wait();
        }
        self.untrack(pid);

        let status = waited.map_err(|source| Error::Wait {
            program: request.program().to_string(),
            source,
        })?;
        let Some(status) = status else {
            let timeout = limit.unwrap_or_default();
            warn!(
                command = %request,
                timeout_secs = timeout.as_secs_f64(),
                "Command timed out, killed its process group"
            );
            let deadline = Instant::now() + DRAIN_GRACE;
            let output = CommandOutput {
                code: None,
                stdout: collect_until(stdout, deadline),
                stderr: String::from_utf8_lossy(&collect_until(stderr, deadline)).into_owned(),
            };
            return Err(Error::TimedOut {
                command: request.to_string(),
                timeout,
                output: output.combined(),
            });
        };

        let output = CommandOutput {
            code: status.code(),
            stdout: collect(stdout),
            stderr: String::from_utf8_lossy(&collect(stderr)).into_owned(),
        };
        debug!(command = %request, code = ?output.code, "External command finished");
        Ok(output)
    }
}

/// Wait for the child; `Ok(None)` when the limit expired first.
fn wait(child: &mut Child, limit: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    match limit {
        Some(limit) => child.wait_timeout(limit),
        None => child.wait().map(Some),
    }
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(errno) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        debug!(pid, %errno, "Process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Like [`collect`], but detaches a reader still blocked at `deadline`.
///
/// A descendant that escaped the process group can keep the pipe open
/// indefinitely.
fn collect_until(handle: Option<JoinHandle<Vec<u8>>>, deadline: Instant) -> Vec<u8> {
    let Some(handle) = handle else {
        return Vec::new();
    };
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            debug!("Output pipe still open after kill, abandoning it");
            return Vec::new();
        }
        thread::sleep(Duration::from_millis(10));
    }
    collect(Some(handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_joins_streams() {
        let output = CommandOutput::new(1, "partial", "Expected to find a map key");
        assert_eq!(output.combined(), "partial\nExpected to find a map key");

        let output = CommandOutput::new(0, "line\n", "warn\n");
        assert_eq!(output.combined(), "line\nwarn\n");

        let output = CommandOutput::new(0, "", "only stderr");
        assert_eq!(output.combined(), "only stderr");
    }

    #[test]
    fn success_requires_zero_exit() {
        assert!(CommandOutput::new(0, "", "").success());
        assert!(!CommandOutput::new(10, "", "").success());
        assert!(!CommandOutput::default().success());
    }

    #[test]
    fn stdout_keeps_raw_bytes() {
        let output = CommandOutput::new(0, vec![b'a', 0xff, b'\n'], "");
        assert_eq!(output.stdout, [b'a', 0xff, b'\n']);
        assert_eq!(output.stdout_text(), "a\u{fffd}\n");
    }

    #[test]
    fn terminate_all_without_children_is_a_no_op() {
        assert_eq!(SystemRunner::new().terminate_all(), 0);
    }
}
