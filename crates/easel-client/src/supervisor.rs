//! Ownership and lifecycle of the renderer child process.
//!
//! The [`Supervisor`] spawns the renderer with its stdin/stdout captured as
//! pipes, answers liveness queries, forwards captured stderr to the log, and
//! tears the process down exactly once, either explicitly via [`terminate`]
//! or implicitly on drop.
//!
//! [`terminate`]: Supervisor::terminate

use std::fs::OpenOptions;
use std::io::{ErrorKind, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};

use crate::config::{LaunchConfig, StderrMode};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    /// The child exited on its own; observed by a liveness check or a pipe
    /// failure.
    Exited,
    /// The child was torn down explicitly.
    Terminated,
}

/// Owner of the renderer process and its pipes.
#[derive(Debug)]
pub struct Supervisor {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    state: State,
}

impl Supervisor {
    /// Launch the renderer described by `config`.
    ///
    /// stdin and stdout are wired as pipes; stderr is either appended to a
    /// log file or captured as a third pipe, per the configuration. The read
    /// ends are switched to non-blocking mode so waits can be driven by
    /// readiness polling.
    pub fn spawn(config: &LaunchConfig) -> Result<Self> {
        let program = config.resolved_program();
        // A bare program name is resolved through $PATH by the OS; only an
        // explicit path can be pre-checked.
        if program.parent().is_some_and(|p| !p.as_os_str().is_empty()) && !program.exists() {
            return Err(Error::MissingRenderer(program));
        }

        let mut command = Command::new(&program);
        command
            .args(config.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped());
        if let Some(dir) = config.cwd() {
            command.current_dir(dir);
        }
        match config.stderr_mode() {
            StderrMode::Captured => {
                command.stderr(Stdio::piped());
            }
            StderrMode::LogFile(path) => {
                let file = OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(path)
                    .map_err(Error::Spawn)?;
                command.stderr(Stdio::from(file));
            }
        }

        let mut child = command.spawn().map_err(Error::Spawn)?;
        log::info!("spawned renderer {} (pid {})", program.display(), child.id());

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let mut pipe_err = None;
        for fd in stdout
            .as_ref()
            .map(|p| p.as_raw_fd())
            .into_iter()
            .chain(stderr.as_ref().map(|p| p.as_raw_fd()))
        {
            if let Err(e) = set_nonblocking(fd) {
                pipe_err = Some(e);
            }
        }
        if let Some(e) = pipe_err {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Spawn(e));
        }

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
            state: State::Running,
        })
    }

    /// Query OS process status. On the first observation of an exit the
    /// pipes are released and the supervisor transitions to the exited
    /// state; the controller turns that transition into its termination
    /// callback.
    pub fn poll_alive(&mut self) -> bool {
        if self.state != State::Running {
            return false;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                log::warn!("renderer exited: {status}");
                self.release_pipes();
                self.state = State::Exited;
                false
            }
            Ok(None) => true,
            Err(e) => {
                log::error!("failed to query renderer status: {e}");
                true
            }
        }
    }

    /// True once the child has been seen to die on its own, as opposed to an
    /// explicit [`terminate`](Supervisor::terminate).
    pub fn exited_unexpectedly(&self) -> bool {
        self.state == State::Exited
    }

    /// The renderer's OS process ID while it is running.
    pub fn pid(&self) -> Option<u32> {
        (self.state == State::Running).then(|| self.child.id())
    }

    /// Record renderer death after a pipe-level failure (EPIPE on write,
    /// EOF on read) and reap the child.
    pub(crate) fn mark_broken(&mut self) {
        if self.state != State::Running {
            return;
        }
        log::warn!("renderer pipe broke; marking process dead");
        self.release_pipes();
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.state = State::Exited;
    }

    /// Tear the renderer down: close the pipes, kill the process if it is
    /// still running, and reap it. Idempotent; also runs on drop.
    pub fn terminate(&mut self) {
        if self.state != State::Running {
            return;
        }
        log::debug!("terminating renderer (pid {})", self.child.id());
        self.release_pipes();
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.state = State::Terminated;
    }

    /// Forward any pending bytes on the captured stderr pipe to the log.
    /// Never blocks; a renderer without a captured stderr is a no-op.
    pub fn drain_stderr(&mut self) {
        let Some(stderr) = self.stderr.as_mut() else {
            return;
        };
        let mut pending = Vec::new();
        let mut buf = [0u8; 8192];
        let mut eof = false;
        loop {
            match stderr.read(&mut buf) {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("renderer stderr read failed: {e}");
                    eof = true;
                    break;
                }
            }
        }
        if eof {
            self.stderr = None;
        }
        for line in String::from_utf8_lossy(&pending).lines() {
            if !line.trim().is_empty() {
                log::warn!(target: "renderer", "{line}");
            }
        }
    }

    pub(crate) fn stdin(&mut self) -> Option<&mut ChildStdin> {
        self.stdin.as_mut()
    }

    pub(crate) fn stdout(&mut self) -> Option<&mut ChildStdout> {
        self.stdout.as_mut()
    }

    pub(crate) fn stdout_fd(&self) -> Option<RawFd> {
        self.stdout.as_ref().map(|p| p.as_raw_fd())
    }

    fn release_pipes(&mut self) {
        self.stdin = None;
        self.stdout = None;
        self.stderr = None;
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn set_nonblocking(fd: RawFd) -> std::io::Result<()> {
    // fcntl is the portable way to flip O_NONBLOCK on an already-open pipe.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
