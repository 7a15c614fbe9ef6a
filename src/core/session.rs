//! Screen session management
//!
//! Brackets a screen consumer with alternate-screen setup and teardown.
//! Teardown runs on every exit path: normal return, error, Ctrl+C and panic.

use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};

use crossterm::cursor::{Hide, Show};
use crossterm::queue;
use crossterm::style::{Attribute, ResetColor, SetAttribute};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::input::KeySource;
use super::screen::Screen;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to set up terminal: {0}")]
    Setup(#[source] io::Error),

    #[error("Interrupted")]
    Interrupted,

    #[error("Panicked: {0}")]
    Panicked(String),
}

impl SessionError {
    /// True when `err` is, or wraps, a Ctrl+C interrupt
    pub fn is_interrupt(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<SessionError>(), Some(SessionError::Interrupted))
    }
}

/// Minimum terminal size a screen consumer needs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinSize {
    pub cols: u16,
    pub rows: u16,
}

impl MinSize {
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Human-readable shortfall lines for an actual (cols, rows), empty if it fits
    pub fn shortfall(&self, name: &str, cols: u16, rows: u16) -> Vec<String> {
        if cols >= self.cols && rows >= self.rows {
            return Vec::new();
        }
        let mut lines = vec![format!("  [ACTION] Terminal size is too small to run {}.", name)];
        if cols < self.cols {
            lines.push(format!(
                "  [ACTION] Actual Columns: {} Required Columns: {}",
                cols, self.cols
            ));
        }
        if rows < self.rows {
            lines.push(format!("  [ACTION] Actual Rows: {} Required Rows: {}", rows, self.rows));
        }
        lines
    }
}

/// Check the real terminal against `min`, explaining any shortfall on the
/// normal screen. Returns false when the session should not start.
pub fn ensure_min_size(name: &str, min: MinSize) -> bool {
    let (cols, rows) = terminal::size().unwrap_or((0, 0));
    let lines = min.shortfall(name, cols, rows);
    for line in &lines {
        println!("{}", line);
    }
    if !lines.is_empty() {
        info!(name, cols, rows, "terminal too small");
    }
    lines.is_empty()
}

/// Alternate screen + hidden cursor, undone exactly once
pub struct TerminalGuard<W: Write> {
    out: W,
    active: bool,
}

impl<W: Write> TerminalGuard<W> {
    pub fn enter(mut out: W) -> io::Result<Self> {
        queue!(out, EnterAlternateScreen, Hide)?;
        out.flush()?;
        Ok(Self { out, active: true })
    }

    /// Show the cursor, reset colors and leave the alternate screen.
    ///
    /// Each step is attempted even if an earlier one fails. Calling this again
    /// does nothing.
    pub fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Err(e) = queue!(self.out, Show) {
            warn!("failed to show cursor: {}", e);
        }
        if let Err(e) = queue!(self.out, SetAttribute(Attribute::Reset), ResetColor) {
            warn!("failed to reset colors: {}", e);
        }
        if let Err(e) = queue!(self.out, Clear(ClearType::All), LeaveAlternateScreen) {
            warn!("failed to leave alternate screen: {}", e);
        }
        let _ = self.out.flush();
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Run `consumer` on a fresh screen in the alternate buffer.
///
/// The consumer's result is returned after the key source has stopped and
/// the terminal is restored. A panic in the consumer becomes
/// [`SessionError::Panicked`].
pub fn run<T>(consumer: impl FnOnce(&mut Screen) -> anyhow::Result<T>) -> anyhow::Result<T> {
    let guard = TerminalGuard::enter(io::stdout()).map_err(SessionError::Setup)?;
    let keys = KeySource::start().map_err(SessionError::Setup)?;
    debug!("session started");
    run_in(guard, Screen::terminal(keys), consumer)
}

/// Session body with the terminal already entered
pub(crate) fn run_in<W: Write, T>(
    mut guard: TerminalGuard<W>,
    mut screen: Screen,
    consumer: impl FnOnce(&mut Screen) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| consumer(&mut screen)));

    if let Some(mut keys) = screen.take_keys() {
        keys.stop();
    }
    drop(screen);
    guard.restore();
    debug!("session ended");

    match result {
        Ok(result) => result,
        Err(payload) => Err(SessionError::Panicked(panic_message(payload.as_ref())).into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
