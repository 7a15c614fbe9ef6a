//! Glyph table with an ASCII fallback
//!
//! Older Windows consoles render box-drawing and circle characters as
//! question marks, so those get plain ASCII unless a modern terminal is
//! detected.

use std::env;

/// Environment variable that forces ASCII glyphs
pub const FORCE_ASCII_ENV: &str = "CLI_ARCADE_FORCE_ASCII";

/// Variables set by terminals known to render Unicode glyphs on Windows
const MODERN_TERMINAL_VARS: &[&str] = &[
    "WT_SESSION",
    "WT_PROFILE_ID",
    "TERM_PROGRAM",
    "ANSICON",
    "ConEmuPID",
    "TERM",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyphs {
    pub unicode: bool,
}

impl Glyphs {
    pub const UNICODE: Glyphs = Glyphs { unicode: true };
    pub const ASCII: Glyphs = Glyphs { unicode: false };

    /// Pick glyphs for the current terminal
    pub fn detect(force_ascii: bool) -> Self {
        let unicode = !force_ascii && supports_unicode(|name| env::var(name).ok(), cfg!(windows));
        Glyphs { unicode }
    }

    pub fn vbar(self) -> char {
        if self.unicode { '│' } else { '|' }
    }

    pub fn block(self) -> char {
        if self.unicode { '█' } else { '#' }
    }

    pub fn circle_filled(self) -> char {
        if self.unicode { '◉' } else { 'O' }
    }

    /// Scrollbar thumb
    pub fn thumb(self) -> char {
        self.block()
    }
}

impl Default for Glyphs {
    fn default() -> Self {
        Self::UNICODE
    }
}

/// Whether `value` is one of the truthy spellings accepted for flags
pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Decide on Unicode glyphs from environment lookups.
fn supports_unicode(var: impl Fn(&str) -> Option<String>, windows: bool) -> bool {
    if var(FORCE_ASCII_ENV).is_some_and(|v| is_truthy(&v)) {
        return false;
    }

    if windows {
        let term = var("TERM").unwrap_or_default().to_lowercase();
        let modern = MODERN_TERMINAL_VARS.iter().any(|name| var(name).is_some())
            || term.contains("xterm")
            || term.contains("vt");
        if !modern {
            return false;
        }
    }

    // An explicit ASCII locale means the terminal cannot show the glyphs
    for name in ["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Some(locale) = var(name).filter(|v| !v.is_empty()) {
            let locale = locale.to_lowercase();
            return !(locale == "c" || locale == "posix" || locale.contains("ascii"));
        }
    }
    true
}
