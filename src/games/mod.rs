//! Bundled games.
//!
//! Each game implements [`Game`](crate::game::Game); the shared loop in
//! [`crate::game::runner`] does the rest.
//!
//! | Game | Tick | Minimum size |
//! |------|------|--------------|
//! | Byte Bouncer | 0.12s | 70x20 |
//! | Escape Sequence | 0.06s | 70x20 |
//! | Prompt Hopper | 0.03s | 100x30 |
//! | Star Ship | 0.12s | - |
//! | Terminal Tumble | 0.5s | 100x30 |

pub mod byte_bouncer;
pub mod escape_sequence;
pub mod prompt_hopper;
pub mod star_ship;
pub mod terminal_tumble;

use crate::core::Key;
use crate::game::{thousands, GameState};

/// Arrow keys and their WASD twins
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub fn from_key(key: Key) -> Option<Dir> {
        match key {
            Key::Up | Key::Char(b'w') => Some(Dir::Up),
            Key::Down | Key::Char(b's') => Some(Dir::Down),
            Key::Left | Key::Char(b'a') => Some(Dir::Left),
            Key::Right | Key::Char(b'd') => Some(Dir::Right),
            _ => None,
        }
    }

    /// (dy, dx) step
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (-1, 0),
            Dir::Down => (1, 0),
            Dir::Left => (0, -1),
            Dir::Right => (0, 1),
        }
    }
}

/// `"<label>: 1,234 (player)"` plus a marker once the record was beaten
pub(crate) fn record_line(state: &GameState, metric: &str, label: &str, marker: &str) -> String {
    let (value, player) = state
        .scores
        .record(metric)
        .map(|r| (r.value, r.player.as_str()))
        .unwrap_or((0, "Player"));
    let mut line = format!("{}: {} ({})", label, thousands(value), player);
    if state.scores.is_new_high(metric) {
        line.push_str(" ***");
        line.push_str(marker);
    }
    line
}

/// `"<label>: 1,234"` for the current value of a metric
pub(crate) fn score_line(state: &GameState, metric: &str, label: &str) -> String {
    format!("{}: {}", label, thousands(state.scores.get(metric)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::game::{Game, GameState, PlayContext};
    use crate::ui::Glyphs;

    /// Deterministic state for a `rows x cols` terminal
    pub fn state<G: Game>(rows: i32, cols: i32) -> GameState {
        let ctx = PlayContext {
            glyphs: Glyphs::ASCII,
            ..PlayContext::default()
        };
        GameState::new(&G::INFO, (rows, cols), &ctx).with_seed(7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasd_matches_arrows() {
        assert_eq!(Dir::from_key(Key::Char(b'w')), Dir::from_key(Key::Up));
        assert_eq!(Dir::from_key(Key::Char(b'd')), Some(Dir::Right));
        assert_eq!(Dir::from_key(Key::Char(b'W')), None);
        assert_eq!(Dir::Left.delta(), (0, -1));
    }
}
