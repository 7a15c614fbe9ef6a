//! Prompt Hopper: scroll through a level made of shell prompts
//!
//! Levels are JSON documents embedded in the binary:
//!
//! ```json
//! {
//!   "start": [x, dy],
//!   "ground": ["segment", 4, "segment"],
//!   "platforms": [{ "position": [x, up], "prompt": "$ ls" }]
//! }
//! ```
//!
//! Ground strings are laid end to end on the ground line; integers are gaps.
//! A platform prompt sits `up` rows above the ground. The level is shifted
//! so `start.x` lines up with the player in the middle of the screen.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::warn;

use super::score_line;
use crate::core::{Attr, AttrFlags, Color, Key, MinSize, Screen};
use crate::game::{truncate, Game, GameInfo, GameState, MetricSpec};

const TITLE: &[&str] = &[
    r" ______                          _     _   _                              ",
    r" | ___ \                        | |   | | | |                             ",
    r" | |_/ / __ ___  _ __ ___  _ __ | |_  | |_| | ___  _ __  _ __   ___ _ __  ",
    r" |  __/ '__/ _ \| '_ ` _ \| '_ \| __| |  _  |/ _ \| '_ \| '_ \ / _ \ '__| ",
    r" | |  | | | (_) | | | | | | |_) | |_  | | | | (_) | |_) | |_) |  __/ |    ",
    r" \_|  |_|  \___/|_| |_| |_| .__/ \__| \_| |_/\___/| .__/| .__/ \___|_|    ",
    r"                          | |                     | |   | |               ",
    r"                          |_|                     |_|   |_|               ",
];

const LEVELS: &[&str] = &[include_str!("levels/0.json")];

/// Columns the map scrolls per key press
const SCROLL: i32 = 2;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Level {
    start: Vec<i32>,
    ground: Vec<GroundEntry>,
    platforms: Vec<Platform>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GroundEntry {
    Segment(String),
    Gap(i32),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Platform {
    position: Vec<i32>,
    prompt: Option<String>,
}

impl Level {
    fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn load(index: usize) -> Self {
        let Some(json) = LEVELS.get(index) else {
            warn!(index, "no such level");
            return Self::default();
        };
        Self::parse(json).unwrap_or_else(|e| {
            warn!(index, error = %e, "bad level data");
            Self::default()
        })
    }
}

/// A piece of level text in map coordinates
#[derive(Clone, Debug, PartialEq, Eq)]
struct Text {
    x: i32,
    y: i32,
    text: String,
}

pub struct PromptHopper {
    level: usize,
    texts: Vec<Text>,
    x_offset: i32,
}

impl PromptHopper {
    fn build(level: usize, data: &Level, state: &GameState) -> Self {
        let ground_y = (state.height - 3).max(0);
        let mut texts = Vec::new();

        let mut cursor = 0;
        for entry in &data.ground {
            match entry {
                GroundEntry::Segment(seg) => {
                    texts.push(Text {
                        x: cursor,
                        y: ground_y,
                        text: seg.clone(),
                    });
                    cursor += seg.chars().count() as i32;
                }
                GroundEntry::Gap(gap) => cursor += gap,
            }
        }

        for platform in &data.platforms {
            let Some(prompt) = &platform.prompt else {
                continue;
            };
            let x = platform.position.first().copied().unwrap_or(0);
            let up = platform.position.get(1).copied().unwrap_or(0);
            texts.push(Text {
                x,
                y: ground_y - up,
                text: prompt.clone(),
            });
        }

        let start_x = data.start.first().copied().unwrap_or(0);
        let y_offset = data.start.get(1).copied().unwrap_or(0);
        for text in &mut texts {
            text.y += y_offset;
        }

        Self {
            level,
            texts,
            x_offset: (state.width / 2).max(0) - start_x,
        }
    }

    fn player_pos(state: &GameState) -> (i32, i32) {
        ((state.height - 5).max(0), (state.width / 2).max(0))
    }
}

impl Game for PromptHopper {
    const INFO: GameInfo = GameInfo {
        slug: "prompt_hopper",
        title: TITLE,
        accent: Color::Magenta,
        tick: Duration::from_millis(30),
        metrics: &[MetricSpec::new("score", 0, 0)],
        min_size: Some(MinSize::new(100, 30)),
    };

    fn new(state: &mut GameState) -> Self {
        let level = 0;
        Self::build(level, &Level::load(level), state)
    }

    fn draw(&self, screen: &mut Screen, state: &GameState) {
        let info_y = TITLE.len() as i32 - 2;
        screen.write_str(info_y + 1, 2, &score_line(state, "score", "Score"), Color::Green);
        screen.write_str(info_y + 2, 2, &format!("Level: {}", self.level), Color::Green);
        screen.write_str(info_y + 3, 2, &format!("Player: {}", state.player), Attr::NORMAL);

        let prompt = Attr::color(Color::Magenta) | AttrFlags::BOLD;
        for text in &self.texts {
            let sx = text.x + self.x_offset;
            let sy = text.y;
            if sy < 0 || sy >= state.height || sx >= state.width {
                continue;
            }
            let room = (state.width - sx).max(0) as usize;
            screen.write_str(sy, sx, truncate(&text.text, room), prompt);
        }

        let (py, px) = Self::player_pos(state);
        screen.write_char(py, px, 'o', Attr::color(Color::White) | AttrFlags::BOLD);
    }

    // The map only moves on input
    fn step(&mut self, _state: &mut GameState, _now: Instant) {}

    fn movement(&mut self, _state: &mut GameState, key: Key) {
        match key {
            Key::Left | Key::Char(b'a') => self.x_offset += SCROLL,
            Key::Right | Key::Char(b'd') => self.x_offset -= SCROLL,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_support::state;

    const SAMPLE: &str = r#"{
        "start": [4, 1],
        "ground": ["abc", 2, "de"],
        "platforms": [
            { "position": [3, 4], "prompt": "$ ls" },
            { "position": [9, 2] }
        ]
    }"#;

    #[test]
    fn test_embedded_level_parses() {
        let level = Level::parse(LEVELS[0]).unwrap();
        assert!(!level.ground.is_empty());
        assert!(!level.platforms.is_empty());
        assert_eq!(level.start.len(), 2);
    }

    #[test]
    fn test_layout_from_level() {
        // 30x100 terminal: width 98, height 29, ground on row 26
        let state = state::<PromptHopper>(30, 100);
        let game = PromptHopper::build(0, &Level::parse(SAMPLE).unwrap(), &state);

        let expected = vec![
            Text { x: 0, y: 27, text: "abc".into() },
            Text { x: 5, y: 27, text: "de".into() },
            Text { x: 3, y: 23, text: "$ ls".into() },
        ];
        assert_eq!(game.texts, expected);
        assert_eq!(game.x_offset, 49 - 4);
    }

    #[test]
    fn test_missing_fields_default() {
        let level = Level::parse("{}").unwrap();
        let state = state::<PromptHopper>(30, 100);
        let game = PromptHopper::build(0, &level, &state);
        assert!(game.texts.is_empty());
        assert_eq!(game.x_offset, 49);
        assert!(Level::parse("[1, 2]").is_err());
    }

    #[test]
    fn test_scrolling() {
        let mut state = state::<PromptHopper>(30, 100);
        let mut game = PromptHopper::build(0, &Level::parse(SAMPLE).unwrap(), &state);
        game.movement(&mut state, Key::Left);
        assert_eq!(game.x_offset, 47);
        game.movement(&mut state, Key::Char(b'd'));
        game.movement(&mut state, Key::Right);
        assert_eq!(game.x_offset, 43);
        game.movement(&mut state, Key::Up);
        assert_eq!(game.x_offset, 43);
    }

    #[test]
    fn test_draw_places_text_and_player() {
        let state = state::<PromptHopper>(30, 100);
        let game = PromptHopper::build(0, &Level::parse(SAMPLE).unwrap(), &state);
        let (mut screen, _) = crate::core::screen::test_support::screen(30, 100);
        game.draw(&mut screen, &state);

        assert_eq!(&screen.row_text(27)[45..48], "abc");
        assert_eq!(&screen.row_text(23)[48..52], "$ ls");
        assert_eq!(screen.cell(24, 49).map(|c| c.0), Some('o'));
    }
}
