//! Escape Sequence: steer a block around the screen

use std::time::{Duration, Instant};

use super::{score_line, Dir};
use crate::core::{Attr, AttrFlags, Color, Key, MinSize, Screen};
use crate::game::{Game, GameInfo, GameState, MetricSpec};

const TITLE: &[&str] = &[
    " ██████  ▄▄▄▄  ▄▄▄▄  ▄▄▄  ▄▄▄▄  ▄▄▄▄▄   ▄█████ ▄▄▄▄▄  ▄▄▄  ▄▄ ▄▄ ▄▄▄▄▄ ▄▄  ▄▄  ▄▄▄▄ ▄▄▄▄▄ ",
    " ██▄▄   ███▄▄ ██▀▀▀ ██▀██ ██▄█▀ ██▄▄    ▀▀▀▄▄▄ ██▄▄  ██▀██ ██ ██ ██▄▄  ███▄██ ██▀▀▀ ██▄▄  ",
    " ██▄▄▄▄ ▄▄██▀ ▀████ ██▀██ ██    ██▄▄▄   █████▀ ██▄▄▄ ▀███▀ ▀███▀ ██▄▄▄ ██ ▀██ ▀████ ██▄▄▄ ",
    "                                                       ▀▀                                 ",
];

pub struct EscapeSequence {
    x: i32,
    y: i32,
}

impl Game for EscapeSequence {
    const INFO: GameInfo = GameInfo {
        slug: "escape_sequence",
        title: TITLE,
        accent: Color::Cyan,
        tick: Duration::from_millis(60),
        metrics: &[MetricSpec::new("score", 0, 0)],
        min_size: Some(MinSize::new(70, 20)),
    };

    fn new(state: &mut GameState) -> Self {
        Self {
            x: state.width / 2,
            y: state.height / 2,
        }
    }

    fn draw(&self, screen: &mut Screen, state: &GameState) {
        let info_y = TITLE.len() as i32;
        screen.write_str(info_y + 1, 2, &format!("Player: {}", state.player), Attr::NORMAL);
        screen.write_str(info_y + 2, 2, &score_line(state, "score", "Score"), Color::Green);
        screen.write_char(
            self.y,
            self.x,
            state.glyphs.block(),
            Attr::color(Color::Yellow) | AttrFlags::BOLD,
        );
    }

    // The block only moves on input
    fn step(&mut self, _state: &mut GameState, _now: Instant) {}

    fn movement(&mut self, state: &mut GameState, key: Key) {
        let Some(dir) = Dir::from_key(key) else {
            return;
        };
        match dir {
            Dir::Left => self.x = (self.x - 2).max(0),
            Dir::Right => self.x = (self.x + 2).min(state.width - 1),
            Dir::Up => self.y = (self.y - 1).max(0),
            Dir::Down => self.y = (self.y + 1).min(state.height - 1),
        }
        state.scores.add("score", 1);
    }
}
