//! Game loop contract.
//!
//! Every game and the shared loop meet here:
//!
//! - **Game**: the per-game capability set (draw, step, movement, minimum size)
//! - **runner**: `GameSession`, the fixed-tick update/render loop
//! - **scores**: live metrics and "new high" tracking
//! - **highscores**: per-game JSON persistence
//! - **clock**: wall clock and a manual clock for tests
//!
//! # Loop
//!
//! ```text
//! key ─► quit? ─► pause/movement ─► step (once per tick) ─► draw ─► flush
//!                                                         └─► highscores
//! ```

pub mod clock;
pub mod highscores;
pub mod runner;
pub mod scores;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::core::{Color, Key, MinSize, Screen};
use crate::ui::glyphs::Glyphs;

pub use clock::{Clock, SystemClock};
pub use highscores::HighScores;
pub use runner::play;
pub use scores::{MetricSpec, Scoreboard};

/// Static description of a game
#[derive(Clone, Copy, Debug)]
pub struct GameInfo {
    /// Directory name used for highscores
    pub slug: &'static str,
    /// Title art drawn at the top of every frame
    pub title: &'static [&'static str],
    pub accent: Color,
    /// Initial simulation interval
    pub tick: Duration,
    pub metrics: &'static [MetricSpec],
    pub min_size: Option<MinSize>,
}

/// Settings shared by every game session
#[derive(Clone, Debug)]
pub struct PlayContext {
    /// Name used when the prompt is left empty
    pub default_player: String,
    pub glyphs: Glyphs,
    /// Highscore root, `None` disables persistence
    pub data_dir: Option<PathBuf>,
    /// Key wait used by menus
    pub poll_timeout_ms: u64,
    /// Pause between loop iterations
    pub idle_sleep: Duration,
}

impl Default for PlayContext {
    fn default() -> Self {
        Self {
            default_player: "Player".to_string(),
            glyphs: Glyphs::default(),
            data_dir: None,
            poll_timeout_ms: 50,
            idle_sleep: Duration::from_millis(10),
        }
    }
}

/// Loop-owned state of one running game
pub struct GameState {
    pub tick: Duration,
    /// Simulation has ended; rendering and quit continue
    pub over: bool,
    pub paused: bool,
    /// Playfield width, `max(20, cols - 2)`
    pub width: i32,
    /// Playfield height, `max(6, rows - 1)`
    pub height: i32,
    pub player: String,
    pub scores: Scoreboard,
    pub glyphs: Glyphs,
    pub rng: SmallRng,
}

impl GameState {
    /// Fresh state for a `(rows, cols)` terminal
    pub fn new(info: &GameInfo, (rows, cols): (i32, i32), ctx: &PlayContext) -> Self {
        let scores = match &ctx.data_dir {
            Some(dir) => {
                let store = HighScores::new(dir, info.slug, Scoreboard::default_records(info.metrics));
                Scoreboard::with_store(info.metrics, store)
            }
            None => Scoreboard::new(info.metrics),
        };
        Self {
            tick: info.tick,
            over: false,
            paused: false,
            width: (cols - 2).max(20),
            height: (rows - 1).max(6),
            player: ctx.default_player.clone(),
            scores,
            glyphs: ctx.glyphs,
            rng: SmallRng::seed_from_u64(rand::random()),
        }
    }

    /// Replace the random source, for reproducible games
    #[cfg(test)]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }
}

/// A game driven by [`GameSession`]
pub trait Game: Sized {
    const INFO: GameInfo;

    /// Set up a new round; `state` already carries the playfield size
    fn new(state: &mut GameState) -> Self;

    /// Render below the title; called every iteration
    fn draw(&self, screen: &mut Screen, state: &GameState);

    /// Advance the simulation by one tick
    fn step(&mut self, state: &mut GameState, now: Instant);

    /// React to a key while running
    fn movement(&mut self, state: &mut GameState, key: Key);

    /// Terminal size the game needs, checked before its session starts
    fn min_size() -> Option<MinSize> {
        Self::INFO.min_size
    }

    /// A metric beat its record for the first time this round
    fn on_new_high(&mut self, _metric: &'static str, _state: &mut GameState) {}
}

/// Trim `s` to at most `max` characters
pub fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// `1234567` as `1,234,567`
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(-1234567), "-1,234,567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 3), "hel");
        assert_eq!(truncate("hi", 10), "hi");
        assert_eq!(truncate("héllo", 2), "hé");
    }

    #[test]
    fn test_playfield_size() {
        let info = GameInfo {
            slug: "t",
            title: &[],
            accent: Color::Green,
            tick: Duration::from_millis(100),
            metrics: &[],
            min_size: None,
        };
        let ctx = PlayContext::default();
        let state = GameState::new(&info, (24, 80), &ctx);
        assert_eq!((state.width, state.height), (78, 23));
        let tiny = GameState::new(&info, (3, 10), &ctx);
        assert_eq!((tiny.width, tiny.height), (20, 6));
        assert_eq!(tiny.player, "Player");
    }
}
