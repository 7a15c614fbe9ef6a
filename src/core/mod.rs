//! Core terminal layer.
//!
//! This module contains everything between the games and the real terminal:
//!
//! - **attr**: Packed color + style attribute
//! - **keys**: Canonical key codes and raw input decoding
//! - **input**: Background key reader (termios on POSIX, console API on Windows)
//! - **screen**: Virtual screen with coalesced ANSI output
//! - **session**: Alternate-screen session bracketing a screen consumer
//!
//! # Architecture
//!
//! ```text
//! session::run
//! ├── TerminalGuard (alternate screen, cursor)
//! └── Screen
//!     ├── cells + attrs grid
//!     └── KeySource
//!         └── reader thread → KeyDecoder → queue
//! ```

pub mod attr;
pub mod input;
pub mod keys;
pub mod screen;
pub mod session;

pub use attr::{Attr, AttrFlags, Color};
pub use keys::Key;
pub use screen::Screen;
pub use session::{MinSize, SessionError};
