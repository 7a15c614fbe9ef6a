//! Virtual screen
//!
//! An in-memory character + attribute grid. Drawing only touches the grid;
//! [`Screen::flush`] turns the whole grid into one terminal write, emitting an
//! SGR sequence only where the attribute changes between neighbouring cells.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::terminal;
use crossterm::Command;
use tracing::{debug, trace};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::attr::Attr;
use super::input::KeySource;
use super::keys::Key;

/// Size used until the terminal reports one
pub const FALLBACK_SIZE: (usize, usize) = (24, 80);

/// Reports the terminal size as (cols, rows), like `crossterm::terminal::size`
pub type SizeProbe = Box<dyn FnMut() -> io::Result<(u16, u16)>>;

/// Display width of a string in terminal columns
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Column at which `text` starts when centered in `cols`
pub fn centered_col(cols: i32, text: &str) -> i32 {
    (cols - display_width(text) as i32) / 2
}

/// Frame buffer plus the key queue feeding it
pub struct Screen {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<char>>,
    attrs: Vec<Vec<Attr>>,
    /// Terminal output
    out: Box<dyn Write>,
    probe: SizeProbe,
    keys: Option<KeySource>,
    /// How long `get_key` waits
    timeout: Duration,
    /// Reused encode buffer
    frame: String,
}

impl Screen {
    /// Screen drawing to stdout, sized from the real terminal
    pub fn terminal(keys: KeySource) -> Self {
        let mut screen = Self::new(Box::new(io::stdout()), Box::new(terminal::size));
        screen.keys = Some(keys);
        screen
    }

    /// Screen over an arbitrary writer and size source
    pub fn new(out: Box<dyn Write>, probe: SizeProbe) -> Self {
        let (rows, cols) = FALLBACK_SIZE;
        let mut screen = Self {
            rows,
            cols,
            cells: Vec::new(),
            attrs: Vec::new(),
            out,
            probe,
            keys: None,
            timeout: Duration::ZERO,
            frame: String::new(),
        };
        screen.resize_refresh();
        screen.blank();
        screen
    }

    /// Attach the key source `get_key` reads from
    #[cfg(test)]
    pub fn with_keys(mut self, keys: KeySource) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Detach the key source, e.g. to stop it before the terminal is restored
    pub fn take_keys(&mut self) -> Option<KeySource> {
        self.keys.take()
    }

    /// Re-query the terminal size. On change the grids are reallocated blank
    /// and `true` is returned; the caller must redraw everything.
    ///
    /// A failed query keeps the last known size.
    pub fn resize_refresh(&mut self) -> bool {
        let (rows, cols) = match (self.probe)() {
            Ok((cols, rows)) if cols > 0 && rows > 0 => (rows as usize, cols as usize),
            Ok(_) => (self.rows, self.cols),
            Err(e) => {
                trace!("terminal size query failed: {}", e);
                (self.rows, self.cols)
            }
        };

        let changed = rows != self.rows || cols != self.cols || self.cells.len() != rows;
        if changed {
            debug!(rows, cols, "screen resized");
            self.rows = rows;
            self.cols = cols;
            self.blank();
        }
        changed
    }

    /// Refresh and return (rows, cols)
    pub fn query_size(&mut self) -> (i32, i32) {
        self.resize_refresh();
        self.size()
    }

    /// (rows, cols) as of the last refresh
    pub fn size(&self) -> (i32, i32) {
        (self.rows as i32, self.cols as i32)
    }

    /// Refresh the size and blank every cell
    pub fn clear(&mut self) {
        if !self.resize_refresh() {
            self.blank();
        }
    }

    fn blank(&mut self) {
        self.cells = vec![vec![' '; self.cols]; self.rows];
        self.attrs = vec![vec![Attr::NORMAL; self.cols]; self.rows];
    }

    fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    /// Write `text` from (row, col) rightwards. Cells outside the grid are
    /// skipped; there is no wrapping.
    pub fn write_str(&mut self, row: i32, col: i32, text: &str, attr: impl Into<Attr>) {
        if row < 0 || row as usize >= self.rows {
            return;
        }
        let attr = attr.into();
        for (i, ch) in text.chars().enumerate() {
            let x = col.saturating_add(i as i32);
            if x >= self.cols as i32 {
                break;
            }
            if x >= 0 {
                self.cells[row as usize][x as usize] = ch;
                self.attrs[row as usize][x as usize] = attr;
            }
        }
    }

    pub fn write_char(&mut self, row: i32, col: i32, ch: char, attr: impl Into<Attr>) {
        if self.in_bounds(row, col) {
            self.cells[row as usize][col as usize] = ch;
            self.attrs[row as usize][col as usize] = attr.into();
        }
    }

    /// Character and attribute at a cell
    #[cfg(test)]
    pub fn cell(&self, row: i32, col: i32) -> Option<(char, Attr)> {
        if !self.in_bounds(row, col) {
            return None;
        }
        Some((self.cells[row as usize][col as usize], self.attrs[row as usize][col as usize]))
    }

    /// Text of one row
    #[cfg(test)]
    pub fn row_text(&self, row: i32) -> String {
        if row < 0 || row as usize >= self.rows {
            return String::new();
        }
        self.cells[row as usize].iter().collect()
    }

    /// Encode the grid as one frame of terminal output
    pub fn encode_frame(&self, out: &mut String) {
        out.clear();
        let _ = MoveTo(0, 0).write_ansi(out);
        for (y, (cells, attrs)) in self.cells.iter().zip(&self.attrs).enumerate() {
            if y > 0 {
                out.push_str("\r\n");
            }
            let mut prev: Option<Attr> = None;
            for (&ch, &attr) in cells.iter().zip(attrs) {
                if prev != Some(attr) {
                    attr.write_sgr(out);
                    prev = Some(attr);
                }
                // Anything not exactly one column wide would shift the row
                if UnicodeWidthChar::width(ch) == Some(1) {
                    out.push(ch);
                } else {
                    out.push(' ');
                }
            }
            Attr::write_reset(out);
        }
    }

    /// Write the frame to the terminal. Output errors are logged and dropped.
    pub fn flush(&mut self) {
        let mut frame = std::mem::take(&mut self.frame);
        self.encode_frame(&mut frame);
        let result = self
            .out
            .write_all(frame.as_bytes())
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            debug!("frame write failed: {}", e);
        }
        self.frame = frame;
    }

    /// Set the `get_key` wait in milliseconds (curses `timeout`)
    pub fn set_timeout(&mut self, ms: u64) {
        self.timeout = Duration::from_millis(ms);
    }

    /// Next queued key, waiting up to the configured timeout
    pub fn get_key(&mut self) -> Option<Key> {
        match &self.keys {
            Some(keys) if self.timeout.is_zero() => keys.try_key(),
            Some(keys) => keys.poll(self.timeout),
            None => {
                std::thread::sleep(self.timeout);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Writer whose bytes stay inspectable after it is boxed
    #[derive(Clone, Default)]
    pub struct SharedBuf(pub Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        pub fn take(&self) -> Vec<u8> {
            std::mem::take(&mut *self.0.borrow_mut())
        }
    }

    /// Fixed-size screen writing into a shared buffer
    pub fn screen(rows: u16, cols: u16) -> (Screen, SharedBuf) {
        let buf = SharedBuf::default();
        let screen = Screen::new(Box::new(buf.clone()), Box::new(move || Ok((cols, rows))));
        (screen, buf)
    }

    /// Screen whose size can be changed from the test
    pub fn resizable(rows: u16, cols: u16) -> (Screen, Rc<Cell<(u16, u16)>>) {
        let size = Rc::new(Cell::new((cols, rows)));
        let probe = size.clone();
        let screen = Screen::new(Box::new(io::sink()), Box::new(move || Ok(probe.get())));
        (screen, size)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::core::attr::{AttrFlags, Color};

    #[test]
    fn test_write_clips_at_right_edge() {
        let (mut screen, _) = screen(24, 80);
        screen.write_str(0, 78, "AB", Attr::NORMAL);
        assert_eq!(screen.cell(0, 78).map(|c| c.0), Some('A'));
        assert_eq!(screen.cell(0, 79).map(|c| c.0), Some('B'));

        screen.clear();
        screen.write_str(0, 79, "AB", Attr::NORMAL);
        assert_eq!(screen.cell(0, 79).map(|c| c.0), Some('A'));
        assert!(screen.row_text(0).trim_end().ends_with('A'));
    }

    #[test]
    fn test_out_of_bounds_writes_are_dropped() {
        let (mut screen, _) = screen(5, 10);
        let before = screen.row_text(0);
        screen.write_str(-1, 0, "x", Attr::NORMAL);
        screen.write_str(5, 0, "x", Attr::NORMAL);
        screen.write_str(0, 10, "x", Attr::NORMAL);
        screen.write_char(0, -1, 'x', Attr::NORMAL);
        screen.write_char(2, 10, 'x', Attr::NORMAL);
        for row in 0..5 {
            assert_eq!(screen.row_text(row), before);
        }
    }

    #[test]
    fn test_negative_column_skips_leading_chars() {
        let (mut screen, _) = screen(3, 10);
        screen.write_str(1, -2, "abcd", Attr::NORMAL);
        assert_eq!(&screen.row_text(1)[..3], "cd ");
    }

    #[test]
    fn test_control_chars_stored_literally() {
        let (mut screen, _) = screen(3, 10);
        screen.write_str(0, 0, "a\nb", Attr::NORMAL);
        assert_eq!(screen.cell(0, 1).map(|c| c.0), Some('\n'));
        assert_eq!(screen.cell(0, 2).map(|c| c.0), Some('b'));
    }

    #[test]
    fn test_attribute_runs_are_coalesced() {
        let (mut screen, _) = screen(1, 6);
        let red = Attr::color(Color::Red) | AttrFlags::BOLD;
        screen.write_str(0, 0, "aaa", red);
        let mut frame = String::new();
        screen.encode_frame(&mut frame);

        let mut red_sgr = String::new();
        red.write_sgr(&mut red_sgr);
        assert_eq!(frame.matches(&red_sgr).count(), 1);
        assert!(frame.starts_with("\x1b[1;1H"));
        assert!(frame.ends_with("aaa\x1b[0m   \x1b[0m"));
    }

    #[test]
    fn test_rows_are_separated_and_reset() {
        let (mut screen, _) = screen(2, 2);
        screen.write_str(1, 0, "hi", Attr::NORMAL);
        let mut frame = String::new();
        screen.encode_frame(&mut frame);
        assert_eq!(frame, "\x1b[1;1H\x1b[0m  \x1b[0m\r\n\x1b[0mhi\x1b[0m");
    }

    #[test]
    fn test_wide_chars_render_as_space() {
        let (mut screen, _) = screen(1, 3);
        screen.write_str(0, 0, "漢a", Attr::NORMAL);
        let mut frame = String::new();
        screen.encode_frame(&mut frame);
        assert!(frame.contains(" a "));
    }

    #[test]
    fn test_flush_is_idempotent() {
        let (mut screen, buf) = screen(4, 8);
        screen.write_str(1, 1, "frame", Attr::color(Color::Cyan));
        screen.flush();
        let first = buf.take();
        screen.flush();
        let second = buf.take();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_resize_reallocates_grid() {
        let (mut screen, size) = resizable(10, 20);
        screen.write_str(0, 0, "keep", Attr::NORMAL);
        assert!(!screen.resize_refresh());
        assert_eq!(screen.row_text(0).trim_end(), "keep");

        size.set((30, 12));
        assert_eq!(screen.query_size(), (12, 30));
        assert_eq!(screen.row_text(0), " ".repeat(30));
        screen.write_char(11, 29, 'z', Attr::NORMAL);
        assert_eq!(screen.cell(11, 29).map(|c| c.0), Some('z'));
    }

    #[test]
    fn test_failed_size_query_keeps_last_size() {
        let mut calls = 0;
        let probe = move || {
            calls += 1;
            if calls == 1 {
                Ok((40, 10))
            } else {
                Err(io::Error::new(io::ErrorKind::Other, "no tty"))
            }
        };
        let mut screen = Screen::new(Box::new(io::sink()), Box::new(probe));
        assert_eq!(screen.query_size(), (10, 40));
        assert_eq!(screen.query_size(), (10, 40));
    }

    #[test]
    fn test_get_key_reads_queue() {
        let (tx, keys) = KeySource::detached();
        let (screen, _) = screen(5, 5);
        let mut screen = screen.with_keys(keys);
        screen.set_timeout(5);
        tx.send(Key::Up).unwrap();
        assert_eq!(screen.get_key(), Some(Key::Up));
        assert_eq!(screen.get_key(), None);
    }

    #[test]
    fn test_get_key_zero_timeout_does_not_wait() {
        let (tx, keys) = KeySource::detached();
        let (screen, _) = screen(5, 5);
        let mut screen = screen.with_keys(keys);
        screen.set_timeout(0);
        tx.send(Key::Left).unwrap();
        tx.send(Key::Right).unwrap();
        assert_eq!(screen.get_key(), Some(Key::Left));
        assert_eq!(screen.get_key(), Some(Key::Right));

        // Even with the sender gone there is no sleep
        drop(tx);
        let start = std::time::Instant::now();
        assert_eq!(screen.get_key(), None);
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_centered_col() {
        assert_eq!(centered_col(20, "abcd"), 8);
        assert_eq!(centered_col(3, "toolong"), -2);
    }
}
