//! Packed cell attributes
//!
//! A cell attribute is a single `u32`:
//!
//! ```text
//!  bits 0..8    reserved (always zero)
//!  bits 8..16   color index 0..=7
//!  bits 16..    style flags (bold, dim, reverse)
//! ```
//!
//! Attributes compose with `|`, so `Attr::color(Color::Red) | AttrFlags::BOLD`
//! is red bold text.

use std::ops::BitOr;

use bitflags::bitflags;
use crossterm::style::{self, Attribute, SetAttribute, SetForegroundColor};
use crossterm::Command;

const COLOR_SHIFT: u32 = 8;
const COLOR_MASK: u32 = 0x07;

bitflags! {
    /// Style flags, stored above the color byte
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u32 {
        const BOLD    = 1 << 16;
        const DIM     = 1 << 17;
        const REVERSE = 1 << 18;
    }
}

/// The eight named terminal colors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    #[default]
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];

    /// Color for an index, wrapping into 0..=7
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index as u32 & COLOR_MASK) as usize]
    }

    /// Convert to crossterm color
    pub fn to_crossterm(self) -> style::Color {
        match self {
            Color::Black => style::Color::Black,
            Color::Red => style::Color::DarkRed,
            Color::Green => style::Color::DarkGreen,
            Color::Yellow => style::Color::DarkYellow,
            Color::Blue => style::Color::DarkBlue,
            Color::Magenta => style::Color::DarkMagenta,
            Color::Cyan => style::Color::DarkCyan,
            Color::White => style::Color::Grey,
        }
    }
}

/// Packed (color, bold, dim, reverse) attribute
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Attr(u32);

impl Attr {
    /// Plain text in the terminal's default color
    pub const NORMAL: Attr = Attr(0);

    /// Attribute selecting `color` with no style flags
    pub const fn color(color: Color) -> Self {
        Attr((color as u32) << COLOR_SHIFT)
    }

    /// Rebuild an attribute from raw bits.
    ///
    /// Reserved bits and unknown flag bits are dropped and the color index is
    /// wrapped into 0..=7, so any `u32` yields a valid attribute.
    #[allow(dead_code)]
    pub fn from_bits(bits: u32) -> Self {
        let color = (bits >> COLOR_SHIFT) & COLOR_MASK;
        let flags = AttrFlags::from_bits_truncate(bits);
        Attr((color << COLOR_SHIFT) | flags.bits())
    }

    #[allow(dead_code)]
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn fg(self) -> Color {
        Color::from_index(((self.0 >> COLOR_SHIFT) & COLOR_MASK) as u8)
    }

    pub fn flags(self) -> AttrFlags {
        AttrFlags::from_bits_truncate(self.0)
    }

    /// Split into (color, bold, dim, reverse)
    #[allow(dead_code)]
    pub fn decode(self) -> (Color, bool, bool, bool) {
        let flags = self.flags();
        (
            self.fg(),
            flags.contains(AttrFlags::BOLD),
            flags.contains(AttrFlags::DIM),
            flags.contains(AttrFlags::REVERSE),
        )
    }

    /// Inverse of [`Attr::decode`]
    #[allow(dead_code)]
    pub fn encode(color: Color, bold: bool, dim: bool, reverse: bool) -> Self {
        let mut flags = AttrFlags::empty();
        flags.set(AttrFlags::BOLD, bold);
        flags.set(AttrFlags::DIM, dim);
        flags.set(AttrFlags::REVERSE, reverse);
        Attr::color(color) | flags
    }

    /// Append the SGR sequence that switches the terminal to this attribute.
    ///
    /// Always starts from a reset. The color is only emitted for a non-zero
    /// attribute, so `Attr::NORMAL` keeps the terminal's default foreground.
    pub fn write_sgr(self, out: &mut String) {
        let flags = self.flags();
        let _ = SetAttribute(Attribute::Reset).write_ansi(out);
        if flags.contains(AttrFlags::BOLD) {
            let _ = SetAttribute(Attribute::Bold).write_ansi(out);
        }
        if flags.contains(AttrFlags::DIM) {
            let _ = SetAttribute(Attribute::Dim).write_ansi(out);
        }
        if flags.contains(AttrFlags::REVERSE) {
            let _ = SetAttribute(Attribute::Reverse).write_ansi(out);
        }
        if self.0 != 0 {
            let _ = SetForegroundColor(self.fg().to_crossterm()).write_ansi(out);
        }
    }

    /// SGR reset sequence
    pub fn write_reset(out: &mut String) {
        let _ = SetAttribute(Attribute::Reset).write_ansi(out);
    }
}

impl BitOr<AttrFlags> for Attr {
    type Output = Attr;

    fn bitor(self, rhs: AttrFlags) -> Attr {
        Attr(self.0 | rhs.bits())
    }
}

/// Flags promoted to a full attribute, e.g. `Attr::from(AttrFlags::REVERSE)`
impl From<AttrFlags> for Attr {
    fn from(flags: AttrFlags) -> Self {
        Attr(flags.bits())
    }
}

impl From<Color> for Attr {
    fn from(color: Color) -> Self {
        Attr::color(color)
    }
}
