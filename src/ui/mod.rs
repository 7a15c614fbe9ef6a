//! Menus and shared drawing helpers.
//!
//! - **menu**: Launcher menu listing every registered game
//! - **start**: Per-game intro screen and player name prompt
//! - **glyphs**: Unicode glyphs with an ASCII fallback

pub mod glyphs;
pub mod menu;
pub mod start;

pub use glyphs::Glyphs;
pub use menu::launcher_menu;
