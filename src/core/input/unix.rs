//! POSIX terminal input
//!
//! Canonical mode, echo and signal generation are switched off so each key
//! press arrives immediately and Ctrl+C is delivered as byte 0x03 instead of
//! SIGINT.

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::thread;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};
use nix::sys::termios::{self, InputFlags, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use tracing::{debug, warn};

use super::RawInput;
use crate::core::keys::{Key, KeyDecoder};

/// Saved termios settings, put back on restore or drop
pub struct ModeGuard {
    fd: RawFd,
    original: Option<Termios>,
}

impl ModeGuard {
    /// Switch stdin to raw key input.
    ///
    /// Returns `None` when stdin is not a terminal; keys are still read, just
    /// without a mode change.
    pub fn enable() -> io::Result<Option<Self>> {
        Self::enable_on(io::stdin().as_raw_fd())
    }

    pub fn enable_on(fd: RawFd) -> io::Result<Option<Self>> {
        // SAFETY: callers pass a descriptor that outlives the guard
        let tty = unsafe { BorrowedFd::borrow_raw(fd) };
        let original = match termios::tcgetattr(tty) {
            Ok(t) => t,
            Err(e) => {
                warn!("fd {} is not a terminal ({}), leaving input mode alone", fd, e);
                return Ok(None);
            }
        };

        let mut raw = original.clone();
        raw.local_flags
            .remove(LocalFlags::ICANON | LocalFlags::ECHO | LocalFlags::ISIG | LocalFlags::IEXTEN);
        raw.input_flags.remove(InputFlags::IXON | InputFlags::ICRNL);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(tty, SetArg::TCSANOW, &raw).map_err(io::Error::from)?;
        debug!(fd, "switched to raw mode");
        Ok(Some(Self {
            fd,
            original: Some(original),
        }))
    }

    /// Put the saved settings back. Later calls do nothing.
    pub fn restore(&mut self) {
        let Some(original) = self.original.take() else {
            return;
        };
        // SAFETY: see `enable_on`
        let tty = unsafe { BorrowedFd::borrow_raw(self.fd) };
        if let Err(e) = termios::tcsetattr(tty, SetArg::TCSANOW, &original) {
            warn!("failed to restore terminal mode: {}", e);
        }
    }
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Polls stdin and decodes escape sequences
pub struct Reader {
    decoder: KeyDecoder,
    buf: [u8; 64],
}

impl Reader {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            decoder: KeyDecoder::new(),
            buf: [0; 64],
        })
    }
}

impl RawInput for Reader {
    fn read_keys(&mut self, timeout: Duration, out: &mut Vec<Key>) -> io::Result<()> {
        let fd = io::stdin().as_raw_fd();
        // SAFETY: stdin stays open for the life of the process
        let borrowed_fd = unsafe { BorrowedFd::borrow_raw(fd) };
        let mut fds = [PollFd::new(&borrowed_fd, PollFlags::POLLIN)];

        let ready = match poll(&mut fds, timeout.as_millis() as i32) {
            Ok(n) => n > 0,
            Err(Errno::EINTR) => false,
            Err(e) => return Err(e.into()),
        };

        if !ready {
            // A lone ESC with nothing after it is the Escape key
            self.decoder.flush(out);
            return Ok(());
        }

        match nix::unistd::read(fd, &mut self.buf) {
            Ok(0) => {
                // EOF on a closed stdin; avoid spinning on it
                thread::sleep(timeout);
                Ok(())
            }
            Ok(n) => {
                self.decoder.feed(&self.buf[..n], out);
                Ok(())
            }
            Err(Errno::EINTR) | Err(Errno::EAGAIN) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
