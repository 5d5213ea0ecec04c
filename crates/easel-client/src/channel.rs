//! Synchronous, strictly half-duplex exchange with the renderer.
//!
//! At most one request is ever in flight: the next request is not written
//! until the previous reply has been consumed. Replies carry no framing:
//! the first non-empty read burst is the complete response, which is sound
//! only because of the half-duplex discipline.

use std::io::{ErrorKind, Read, Write};
use std::os::fd::RawFd;

use crate::supervisor::Supervisor;

/// Poll tick while waiting on a reply. Liveness and stderr are re-checked at
/// this cadence; the wait itself has no overall timeout.
const WAIT_TICK_MS: i32 = 25;

/// Transport seam over the request/response exchange.
///
/// Lets controller logic be exercised without a running renderer.
pub trait Transport {
    /// Perform one half-duplex exchange.
    ///
    /// Returns `None` when the renderer is gone (nothing was written, or it
    /// died before a reply arrived). A successful send that expects no reply
    /// returns `Some` with an empty buffer.
    fn exchange(&mut self, request: &[u8], expect_reply: bool) -> Option<Vec<u8>>;

    /// Re-check renderer liveness.
    fn is_alive(&mut self) -> bool;

    /// True once the renderer has been seen to die on its own.
    fn exited_unexpectedly(&self) -> bool;

    /// Release the renderer and its streams. Idempotent.
    fn shutdown(&mut self);
}

/// The real transport: one renderer process behind a [`Supervisor`].
#[derive(Debug)]
pub struct SyncChannel {
    supervisor: Supervisor,
}

impl SyncChannel {
    pub fn new(supervisor: Supervisor) -> Self {
        Self { supervisor }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Block until the renderer's complete reply arrives.
    ///
    /// Readiness-driven: poll(2) on the stdout descriptor, draining stderr
    /// and re-checking liveness on every tick so a renderer that dies
    /// mid-wait ends the exchange instead of hanging it. A renderer that
    /// stays alive but never answers blocks the caller indefinitely; there
    /// is deliberately no timeout or cancellation for a request in flight.
    fn wait_for_reply(&mut self) -> Option<Vec<u8>> {
        let mut pending = Vec::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let fd = self.supervisor.stdout_fd()?;
            let ready = match wait_readable(fd, WAIT_TICK_MS) {
                Ok(ready) => ready,
                Err(e) => {
                    log::warn!("poll on renderer stdout failed: {e}");
                    self.supervisor.mark_broken();
                    return None;
                }
            };

            if !ready {
                self.supervisor.drain_stderr();
                if !self.supervisor.poll_alive() {
                    // Died mid-wait; deliver whatever already arrived.
                    return (!pending.is_empty()).then_some(pending);
                }
                continue;
            }

            // Drain everything immediately available; the first non-empty
            // burst is the whole reply.
            let mut saw_eof = false;
            {
                let stdout = self.supervisor.stdout()?;
                loop {
                    match stdout.read(&mut buf) {
                        Ok(0) => {
                            saw_eof = true;
                            break;
                        }
                        Ok(n) => pending.extend_from_slice(&buf[..n]),
                        Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                        Err(e) => {
                            log::warn!("renderer read failed: {e}");
                            saw_eof = true;
                            break;
                        }
                    }
                }
            }

            if saw_eof {
                self.supervisor.mark_broken();
                return (!pending.is_empty()).then_some(pending);
            }
            if !pending.is_empty() {
                return Some(pending);
            }
        }
    }
}

impl Transport for SyncChannel {
    fn exchange(&mut self, request: &[u8], expect_reply: bool) -> Option<Vec<u8>> {
        if !self.supervisor.poll_alive() {
            log::debug!("exchange skipped: renderer is not running");
            return None;
        }
        self.supervisor.drain_stderr();

        let written = {
            let stdin = self.supervisor.stdin()?;
            match stdin.write_all(request) {
                Ok(()) => stdin.flush(),
                Err(e) => Err(e),
            }
        };
        if let Err(e) = written {
            log::warn!("renderer write failed: {e}");
            self.supervisor.mark_broken();
            return None;
        }

        if !expect_reply {
            return Some(Vec::new());
        }
        self.wait_for_reply()
    }

    fn is_alive(&mut self) -> bool {
        self.supervisor.poll_alive()
    }

    fn exited_unexpectedly(&self) -> bool {
        self.supervisor.exited_unexpectedly()
    }

    fn shutdown(&mut self) {
        self.supervisor.terminate();
    }
}

/// Wait up to `timeout_ms` for the descriptor to become readable.
fn wait_readable(fd: RawFd, timeout_ms: i32) -> std::io::Result<bool> {
    let mut pollfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        let rc = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if rc < 0 {
            let e = std::io::Error::last_os_error();
            if e.kind() == ErrorKind::Interrupted {
                continue;
            }
            return Err(e);
        }
        return Ok(rc > 0);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LaunchConfig;
    use std::thread::sleep;
    use std::time::Duration;

    // `cat` is a perfectly obedient renderer double for transport-level
    // behavior: it answers every request by echoing it back in one burst.

    fn cat_channel() -> SyncChannel {
        SyncChannel::new(Supervisor::spawn(&LaunchConfig::new("cat")).unwrap())
    }

    #[test]
    fn reply_is_first_non_empty_burst() {
        let mut channel = cat_channel();
        let reply = channel.exchange(b"hello renderer", true).unwrap();
        assert_eq!(reply, b"hello renderer");
        assert!(channel.is_alive());
        channel.shutdown();
    }

    #[test]
    fn exchanges_stay_ordered_and_half_duplex() {
        let mut channel = cat_channel();
        for i in 0..10u8 {
            let request = vec![i; 16];
            let reply = channel.exchange(&request, true).unwrap();
            assert_eq!(reply, request);
        }
        channel.shutdown();
    }

    #[test]
    fn fire_and_forget_returns_empty_ack() {
        let mut channel = cat_channel();
        let reply = channel.exchange(b"no reply wanted", false).unwrap();
        assert!(reply.is_empty());
        channel.shutdown();
    }

    #[test]
    fn exchange_after_shutdown_returns_none() {
        let mut channel = cat_channel();
        channel.shutdown();
        assert!(!channel.is_alive());
        assert!(channel.exchange(b"anyone there?", true).is_none());
        // An explicit shutdown is not an unexpected death.
        assert!(!channel.exited_unexpectedly());
    }

    #[test]
    fn child_exit_is_reported_as_dead_without_write() {
        let mut channel = SyncChannel::new(Supervisor::spawn(&LaunchConfig::new("true")).unwrap());
        for _ in 0..500 {
            if !channel.is_alive() {
                break;
            }
            sleep(Duration::from_millis(10));
        }
        assert!(channel.exchange(b"late request", true).is_none());
        assert!(channel.exited_unexpectedly());
    }
}
