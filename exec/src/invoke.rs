//! Process invocation.
//!
//! An [`Invoker`] runs the wrapped executable once per call with a prepared
//! argument vector, in one of two [`Mode`]s:
//!
//! - **Captured** — stdout and stderr are piped; a clean exit returns stdout
//!   verbatim, a non-zero exit returns [`ExecError::ProcessExecution`] with
//!   the exit code and stderr attached. stderr is never merged into the
//!   returned output.
//! - **Live** — all three standard streams are inherited from the parent.
//!   The call returns once the child exits, whatever its exit status.
//!
//! The child always inherits the parent's environment and working directory,
//! and arguments are passed as a discrete vector with no shell involved.
//!
//! # Example
//!
//! ```no_run
//! use argv_shim_exec::{BinaryPath, Invoker, Mode};
//!
//! let invoker = Invoker::new(BinaryPath::from_install_location("tool").unwrap());
//! let output = invoker.execute(&["--version"], Mode::Captured).unwrap();
//! println!("{}", output.trim());
//! ```

use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use argv_shim_core::{Options, OptionsSchema, prepare_command};
use tracing::debug;
use wait_timeout::ChildExt;

use crate::error::{ExecError, Result};
use crate::locate::BinaryPath;

/// I/O mode of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Buffer stdout and return it; non-zero exits are errors.
    #[default]
    Captured,
    /// Inherit stdin/stdout/stderr; exit status is discarded.
    Live,
}

impl From<bool> for Mode {
    /// `true` selects [`Mode::Live`].
    fn from(live: bool) -> Self {
        if live { Self::Live } else { Self::Captured }
    }
}

/// Runs the wrapped executable.
///
/// Cloning is cheap; every call spawns an independent child process, so
/// concurrent calls from several threads do not interact.
#[derive(Debug, Clone)]
pub struct Invoker {
    binary: BinaryPath,
    timeout: Option<Duration>,
}

impl Invoker {
    /// Creates an invoker targeting `binary`, with no wait timeout.
    pub fn new(binary: BinaryPath) -> Self {
        Self {
            binary,
            timeout: None,
        }
    }

    /// Creates an invoker for `name` at its default install-relative path.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Locate`] if the install location is unknown.
    pub fn from_install_location(name: &str) -> Result<Self> {
        BinaryPath::from_install_location(name).map(Self::new)
    }

    /// Bounds how long a call waits for the child to exit and, in captured
    /// mode, for its output streams to close.
    ///
    /// On expiry the child is killed and the call fails with
    /// [`ExecError::Timeout`]. Without a timeout a hung child hangs the call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn binary(&self) -> &BinaryPath {
        &self.binary
    }

    pub fn binary_mut(&mut self) -> &mut BinaryPath {
        &mut self.binary
    }

    /// Points subsequent calls at `path`. Calls already completed are
    /// unaffected.
    pub fn set_binary_path(&mut self, path: impl Into<PathBuf>) {
        self.binary.set_path(path);
    }

    /// Runs the executable with `args`.
    ///
    /// Returns the captured stdout in [`Mode::Captured`] and an empty string
    /// in [`Mode::Live`].
    ///
    /// # Errors
    ///
    /// - [`ExecError::Spawn`] if the executable cannot be started.
    /// - [`ExecError::ProcessExecution`] on a non-zero exit in captured mode.
    /// - [`ExecError::Timeout`] if a configured timeout elapses.
    /// - [`ExecError::Wait`] if waiting on the child or reading its output fails.
    pub fn execute<S: AsRef<OsStr>>(&self, args: &[S], mode: Mode) -> Result<String> {
        debug!(
            binary = %self.binary.path().display(),
            args = ?display_args(args),
            mode = ?mode,
            "Invoking binary"
        );
        match mode {
            Mode::Captured => self.run_captured(args),
            Mode::Live => self.run_live(args).map(|()| String::new()),
        }
    }

    /// Runs in captured mode and returns stdout.
    pub fn capture<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<String> {
        self.execute(args, Mode::Captured)
    }

    /// Runs in live mode; the child's exit status is not inspected.
    pub fn live<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<()> {
        self.execute(args, Mode::Live).map(drop)
    }

    /// Prepares `command` with `options` and runs the result.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::InvalidOption`] without spawning anything if an
    /// option value does not match `schema`; otherwise as
    /// [`execute`](Self::execute).
    pub fn run<I, S>(
        &self,
        command: I,
        schema: &OptionsSchema,
        options: &Options,
        mode: Mode,
    ) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = prepare_command(command, schema, options)?;
        self.execute(&args, mode)
    }

    /// Runs [`execute`](Self::execute) on a dedicated worker thread.
    ///
    /// Joining the handle yields the call's result. There is no way to
    /// cancel the child through the handle; use a timeout for that.
    pub fn spawn_execute(&self, args: Vec<String>, mode: Mode) -> JoinHandle<Result<String>> {
        let invoker = self.clone();
        thread::spawn(move || invoker.execute(&args, mode))
    }

    fn run_captured<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<String> {
        let started = Instant::now();
        let deadline = self.timeout.map(|timeout| started + timeout);
        let mut child = self.spawn(args, Stdio::null(), Stdio::piped(), Stdio::piped())?;

        // Drain stdout and stderr in background threads to prevent
        // deadlock when the child's pipe buffer fills before it exits.
        let stdout_rx = child.stdout.take().map(drain_pipe);
        let stderr_rx = child.stderr.take().map(drain_pipe);

        let status = self.wait(&mut child, deadline)?;
        // A grandchild may still hold the pipes open after the child exits,
        // so collecting output counts against the same deadline.
        let stdout = self.collect_pipe(stdout_rx, deadline)?;
        let stderr = self.collect_pipe(stderr_rx, deadline)?;

        debug!(
            binary = %self.binary.path().display(),
            exit_code = ?status.code(),
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Captured invocation finished"
        );

        if status.success() {
            Ok(stdout)
        } else {
            Err(ExecError::ProcessExecution {
                path: self.binary.path().to_path_buf(),
                code: status.code(),
                stdout,
                stderr,
            })
        }
    }

    fn run_live<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<()> {
        let started = Instant::now();
        let deadline = self.timeout.map(|timeout| started + timeout);
        let mut child = self.spawn(args, Stdio::inherit(), Stdio::inherit(), Stdio::inherit())?;
        let status = self.wait(&mut child, deadline)?;

        // Exit status is reported but never turned into an error in live mode.
        debug!(
            binary = %self.binary.path().display(),
            exit_code = ?status.code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Live invocation finished"
        );
        Ok(())
    }

    fn spawn<S: AsRef<OsStr>>(
        &self,
        args: &[S],
        stdin: Stdio,
        stdout: Stdio,
        stderr: Stdio,
    ) -> Result<Child> {
        Command::new(self.binary.path())
            .args(args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| {
                debug!(
                    binary = %self.binary.path().display(),
                    error = %source,
                    "Failed to spawn binary"
                );
                ExecError::Spawn {
                    path: self.binary.path().to_path_buf(),
                    source,
                }
            })
    }

    fn wait(&self, child: &mut Child, deadline: Option<Instant>) -> Result<ExitStatus> {
        let Some(deadline) = deadline else {
            return child.wait().map_err(ExecError::Wait);
        };

        match child.wait_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                debug!(
                    binary = %self.binary.path().display(),
                    timeout_ms = self.timeout_ms(),
                    "Invocation timed out, killing process"
                );
                let _ = child.kill();
                let _ = child.wait();
                Err(self.timed_out())
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(ExecError::Wait(e))
            }
        }
    }

    /// Waits for a pipe reader's output, giving up at `deadline`.
    fn collect_pipe(
        &self,
        rx: Option<Receiver<io::Result<Vec<u8>>>>,
        deadline: Option<Instant>,
    ) -> Result<String> {
        let Some(rx) = rx else {
            return Ok(String::new());
        };
        let received = match deadline {
            None => rx.recv().map_err(|_| reader_gone()),
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(buf) => Ok(buf),
                    Err(RecvTimeoutError::Timeout) => {
                        debug!(
                            binary = %self.binary.path().display(),
                            timeout_ms = self.timeout_ms(),
                            "Output still open at deadline, abandoning reader"
                        );
                        return Err(self.timed_out());
                    }
                    Err(RecvTimeoutError::Disconnected) => Err(reader_gone()),
                }
            }
        };
        let buf = received?.map_err(ExecError::Wait)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn timed_out(&self) -> ExecError {
        ExecError::Timeout {
            path: self.binary.path().to_path_buf(),
            timeout: self.timeout.unwrap_or_default(),
        }
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.map_or(0, |timeout| timeout.as_millis() as u64)
    }
}

/// Reads `pipe` to the end on a background thread and sends the result.
fn drain_pipe<R: Read + Send + 'static>(mut pipe: R) -> Receiver<io::Result<Vec<u8>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = pipe.read_to_end(&mut buf).map(|_| buf);
        // The receiver is gone if the call already timed out.
        let _ = tx.send(result);
    });
    rx
}

fn reader_gone() -> ExecError {
    ExecError::Wait(io::Error::other("pipe reader thread exited without a result"))
}

fn display_args<S: AsRef<OsStr>>(args: &[S]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.as_ref().to_string_lossy().into_owned())
        .collect()
}
