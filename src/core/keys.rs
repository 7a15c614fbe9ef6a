//! Canonical key codes and raw input decoding
//!
//! Every physical key maps to exactly one [`Key`], whichever backend read it.
//! The integer codes follow the curses numbering so they stay stable across
//! platforms and in logs.
//!
//! - [`KeyDecoder`] turns a POSIX raw byte stream into keys
//! - [`decode_console_key`] resolves Windows console key records

use tracing::trace;

pub const KEY_DOWN: i32 = 258;
pub const KEY_UP: i32 = 259;
pub const KEY_LEFT: i32 = 260;
pub const KEY_RIGHT: i32 = 261;
pub const KEY_BACKSPACE: i32 = 263;
pub const KEY_NPAGE: i32 = 338;
pub const KEY_PPAGE: i32 = 339;
pub const KEY_ENTER: i32 = 10;
pub const KEY_ESCAPE: i32 = 27;
pub const KEY_INTERRUPT: i32 = 3;
/// "No key within the poll interval"
pub const KEY_NONE: i32 = -1;

const ESC: u8 = 0x1B;

/// A normalized key event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Backspace,
    Enter,
    Escape,
    /// Ctrl+C
    Interrupt,
    /// Printable ASCII (0x20..=0x7E)
    Char(u8),
}

impl Key {
    /// Canonical integer code
    pub fn code(self) -> i32 {
        match self {
            Key::Up => KEY_UP,
            Key::Down => KEY_DOWN,
            Key::Left => KEY_LEFT,
            Key::Right => KEY_RIGHT,
            Key::PageUp => KEY_PPAGE,
            Key::PageDown => KEY_NPAGE,
            Key::Backspace => KEY_BACKSPACE,
            Key::Enter => KEY_ENTER,
            Key::Escape => KEY_ESCAPE,
            Key::Interrupt => KEY_INTERRUPT,
            Key::Char(b) => b as i32,
        }
    }

    /// Resolve an integer code, accepting the alternate Enter and Backspace
    /// codes different terminals and keypads produce.
    #[allow(dead_code)]
    pub fn from_code(code: i32) -> Option<Key> {
        let key = match code {
            KEY_UP => Key::Up,
            KEY_DOWN => Key::Down,
            KEY_LEFT => Key::Left,
            KEY_RIGHT => Key::Right,
            KEY_PPAGE => Key::PageUp,
            KEY_NPAGE => Key::PageDown,
            // 343 is curses KEY_ENTER, 459 is PADENTER on PDCurses
            KEY_ENTER | 13 | 343 | 459 => Key::Enter,
            KEY_BACKSPACE | 8 | 127 => Key::Backspace,
            KEY_ESCAPE => Key::Escape,
            KEY_INTERRUPT => Key::Interrupt,
            0x20..=0x7E => Key::Char(code as u8),
            _ => return None,
        };
        Some(key)
    }

    /// Code for an optional key, with [`KEY_NONE`] for no key
    #[allow(dead_code)]
    pub fn code_of(key: Option<Key>) -> i32 {
        key.map_or(KEY_NONE, Key::code)
    }
}

/// Escape sequences recognized on POSIX terminals
const SEQUENCES: &[(&[u8], Key)] = &[
    (b"\x1b[A", Key::Up),
    (b"\x1b[B", Key::Down),
    (b"\x1b[C", Key::Right),
    (b"\x1b[D", Key::Left),
    // Application cursor mode
    (b"\x1bOA", Key::Up),
    (b"\x1bOB", Key::Down),
    (b"\x1bOC", Key::Right),
    (b"\x1bOD", Key::Left),
    (b"\x1b[5~", Key::PageUp),
    (b"\x1b[6~", Key::PageDown),
    // Keypad Enter in application keypad mode
    (b"\x1bOM", Key::Enter),
];

/// Incremental decoder for raw terminal bytes.
///
/// Known escape sequences are matched greedily. An escape that matches no
/// sequence is reduced to a bare [`Key::Escape`] and the following bytes are
/// examined again. A prefix of a known sequence at the end of the input is
/// held back until more bytes arrive or [`KeyDecoder::flush`] is called.
#[derive(Debug, Default)]
#[cfg_attr(windows, allow(dead_code))]
pub struct KeyDecoder {
    pending: Vec<u8>,
}

#[cfg_attr(windows, allow(dead_code))]
impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed freshly read bytes, appending decoded keys to `out`
    pub fn feed(&mut self, bytes: &[u8], out: &mut Vec<Key>) {
        self.pending.extend_from_slice(bytes);
        self.drain(out, false);
    }

    /// Resolve any held-back partial sequence (call when a read times out)
    pub fn flush(&mut self, out: &mut Vec<Key>) {
        self.drain(out, true);
    }

    /// Whether a partial escape sequence is waiting for more bytes
    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn drain(&mut self, out: &mut Vec<Key>, force: bool) {
        let mut i = 0;
        while i < self.pending.len() {
            let rest = &self.pending[i..];
            if rest[0] == ESC {
                if let Some((seq, key)) = SEQUENCES.iter().find(|(seq, _)| rest.starts_with(seq)) {
                    out.push(*key);
                    i += seq.len();
                    continue;
                }
                if !force && SEQUENCES.iter().any(|(seq, _)| seq.starts_with(rest)) {
                    // Incomplete sequence, wait for the rest
                    break;
                }
                out.push(Key::Escape);
                i += 1;
                continue;
            }

            match decode_byte(rest[0]) {
                Some(key) => out.push(key),
                None => trace!(byte = rest[0], "dropping unhandled input byte"),
            }
            i += 1;
        }
        self.pending.drain(..i);
    }
}

/// Single-byte interpretation outside escape sequences
fn decode_byte(byte: u8) -> Option<Key> {
    match byte {
        b'\n' | b'\r' => Some(Key::Enter),
        0x08 | 0x7F => Some(Key::Backspace),
        0x03 => Some(Key::Interrupt),
        0x20..=0x7E => Some(Key::Char(byte)),
        // Other control bytes and UTF-8 lead/continuation bytes
        _ => None,
    }
}

/// Resolve a Windows console key-down record.
///
/// `unicode_char` is the translated character (0 for special keys) and
/// `scan_code` the hardware scan code, which for special keys matches the
/// second byte of the classic `\x00`/`\xe0` prefixed console sequences.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn decode_console_key(unicode_char: u16, scan_code: u16) -> Option<Key> {
    if unicode_char == 0 || unicode_char == 0xE0 {
        return match scan_code as u8 {
            b'K' => Some(Key::Left),
            b'M' => Some(Key::Right),
            b'H' => Some(Key::Up),
            b'P' => Some(Key::Down),
            b'I' => Some(Key::PageUp),
            b'Q' => Some(Key::PageDown),
            _ => None,
        };
    }
    match unicode_char {
        0x0D | 0x0A => Some(Key::Enter),
        0x08 | 0x7F => Some(Key::Backspace),
        0x1B => Some(Key::Escape),
        0x03 => Some(Key::Interrupt),
        0x20..=0x7E => Some(Key::Char(unicode_char as u8)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<Key> {
        let mut decoder = KeyDecoder::new();
        let mut out = Vec::new();
        decoder.feed(bytes, &mut out);
        decoder.flush(&mut out);
        out
    }

    #[test]
    fn test_arrow_and_page_keys() {
        assert_eq!(
            decode_all(b"\x1b[A\x1b[B\x1b[C\x1b[D\x1b[5~\x1b[6~"),
            vec![Key::Up, Key::Down, Key::Right, Key::Left, Key::PageUp, Key::PageDown]
        );
        assert_eq!(decode_all(b"\x1bOA\x1bOD"), vec![Key::Up, Key::Left]);
    }

    #[test]
    fn test_enter_variants_are_one_key() {
        assert_eq!(decode_all(b"\r\n\x1bOM"), vec![Key::Enter, Key::Enter, Key::Enter]);
        for code in [10, 13, 343, 459] {
            assert_eq!(Key::from_code(code), Some(Key::Enter));
        }
        assert_eq!(Key::Enter.code(), KEY_ENTER);
    }

    #[test]
    fn test_backspace_variants() {
        assert_eq!(decode_all(&[0x08, 0x7F]), vec![Key::Backspace, Key::Backspace]);
        assert_eq!(Key::from_code(127), Some(Key::Backspace));
        assert_eq!(Key::Backspace.code(), KEY_BACKSPACE);
    }

    #[test]
    fn test_unknown_escape_reduces_to_esc() {
        // ESC [ Z (shift-tab) is not known: ESC, then '[' and 'Z' as printables
        assert_eq!(
            decode_all(b"\x1b[Zq"),
            vec![Key::Escape, Key::Char(b'['), Key::Char(b'Z'), Key::Char(b'q')]
        );
    }

    #[test]
    fn test_partial_sequence_held_until_more_bytes() {
        let mut decoder = KeyDecoder::new();
        let mut out = Vec::new();
        decoder.feed(b"a\x1b[", &mut out);
        assert_eq!(out, vec![Key::Char(b'a')]);
        assert!(decoder.has_pending());
        decoder.feed(b"D", &mut out);
        assert_eq!(out, vec![Key::Char(b'a'), Key::Left]);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_lone_escape_resolved_on_flush() {
        let mut decoder = KeyDecoder::new();
        let mut out = Vec::new();
        decoder.feed(b"\x1b", &mut out);
        assert!(out.is_empty());
        decoder.flush(&mut out);
        assert_eq!(out, vec![Key::Escape]);
    }

    #[test]
    fn test_unicode_and_controls_dropped() {
        assert_eq!(decode_all("é\tx".as_bytes()), vec![Key::Char(b'x')]);
        assert_eq!(decode_all(&[0x03]), vec![Key::Interrupt]);
    }

    #[test]
    fn test_console_keys() {
        assert_eq!(decode_console_key(0, b'K' as u16), Some(Key::Left));
        assert_eq!(decode_console_key(0xE0, b'Q' as u16), Some(Key::PageDown));
        assert_eq!(decode_console_key(0, 0x3B), None);
        assert_eq!(decode_console_key(0x0D, 0x1C), Some(Key::Enter));
        assert_eq!(decode_console_key(b'w' as u16, 0x11), Some(Key::Char(b'w')));
    }

    #[test]
    fn test_codes_roundtrip() {
        for key in [Key::Up, Key::PageDown, Key::Escape, Key::Char(b'a'), Key::Interrupt] {
            assert_eq!(Key::from_code(key.code()), Some(key));
        }
        assert_eq!(Key::code_of(None), KEY_NONE);
        assert_eq!(Key::from_code(KEY_NONE), None);
    }
}
