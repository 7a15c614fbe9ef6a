//! Byte Bouncer: keep the balls in play with a paddle
//!
//! Every fifth bounce raises the level and adds a ball. Catching a ball on
//! the paddle's outer edge sends it back the way it came for double points.
//! Missing the first ball ends the game; extra balls are just lost.

use std::time::{Duration, Instant};

use rand::Rng;

use super::{record_line, score_line, Dir};
use crate::core::{Attr, AttrFlags, Color, Key, MinSize, Screen};
use crate::game::{Game, GameInfo, GameState, MetricSpec};

const TITLE: &[&str] = &[
    r"  ____  _  _  ____  ____    ____   __   _  _  __ _   ___  ____  ____  ",
    r" (  _ \( \/ )(_  _)(  __)  (  _ \ /  \ / )( \(  ( \ / __)(  __)(  _ \ ",
    r"  ) _ ( )  /   )(   ) _)    ) _ ((  O )) \/ (/    /( (__  ) _)  )   / ",
    r" (____/(__/   (__) (____)  (____/ \__/ \____/\_)__) \___)(____)(__\_) ",
];

const PADDLE_WIDTH: i32 = 30;
const BOUNCES_PER_LEVEL: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Ball {
    x: i32,
    y: i32,
    vx: i32,
    vy: i32,
}

/// What happened when a ball reached the paddle row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Catch {
    Paddle,
    Edge,
    Miss,
}

pub struct ByteBouncer {
    balls: Vec<Ball>,
    paddle_x: i32,
    bounces: u32,
}

fn random_dir(state: &mut GameState) -> i32 {
    if state.rng.random_bool(0.5) {
        1
    } else {
        -1
    }
}

impl ByteBouncer {
    fn catch(&self, ball: &Ball) -> Catch {
        let left = self.paddle_x;
        let right = self.paddle_x + PADDLE_WIDTH;
        if (left..right).contains(&ball.x) {
            Catch::Paddle
        } else if (ball.x == left - 1 && ball.vx > 0) || (ball.x == right && ball.vx < 0) {
            Catch::Edge
        } else {
            Catch::Miss
        }
    }

    fn spawn_ball(state: &mut GameState) -> Ball {
        let x = state.rng.random_range(2..=(state.width - 3).max(2));
        let y = state.rng.random_range(2..=(state.height - state.height / 3).max(2));
        Ball {
            x,
            y,
            vx: random_dir(state),
            vy: -1,
        }
    }

    /// Score a bounce and level up every few of them
    fn bounced(&mut self, state: &mut GameState, edge: bool) {
        let level = state.scores.get("level");
        let mut points = 10 * level * self.balls.len() as i64;
        if edge {
            points *= 2;
        }
        state.scores.add("score", points);
        self.bounces += 1;
        if self.bounces % BOUNCES_PER_LEVEL == 0 {
            state.scores.add("level", 1);
            let ball = Self::spawn_ball(state);
            self.balls.push(ball);
        }
    }
}

impl Game for ByteBouncer {
    const INFO: GameInfo = GameInfo {
        slug: "byte_bouncer",
        title: TITLE,
        accent: Color::Green,
        tick: Duration::from_millis(120),
        metrics: &[MetricSpec::new("score", 0, 0), MetricSpec::new("level", 1, 1)],
        min_size: Some(MinSize::new(70, 20)),
    };

    fn new(state: &mut GameState) -> Self {
        let ball = Ball {
            x: state.width / 2,
            y: state.height / 2,
            vx: random_dir(state),
            vy: -1,
        };
        Self {
            balls: vec![ball],
            paddle_x: state.width / 2 - PADDLE_WIDTH / 2,
            bounces: 0,
        }
    }

    fn draw(&self, screen: &mut Screen, state: &GameState) {
        let info_y = TITLE.len() as i32;
        let x = 2;
        screen.write_str(info_y + 1, x, &record_line(state, "score", "High Score", "NEW High Score!"), Color::Green);
        screen.write_str(info_y + 2, x, &record_line(state, "level", "High Level", "NEW High Level!"), Color::Blue);
        screen.write_str(info_y + 4, x, &format!("Player: {}", state.player), Attr::NORMAL);
        screen.write_str(info_y + 5, x, &score_line(state, "score", "Score"), Color::Green);
        screen.write_str(info_y + 6, x, &score_line(state, "level", "Level"), Color::Blue);
        screen.write_str(info_y + 8, x, "← | a     : Left", Attr::NORMAL);
        screen.write_str(info_y + 9, x, "→ | d     : Right", Attr::NORMAL);
        screen.write_str(info_y + 10, x, "Backspace : Pause", Attr::NORMAL);
        screen.write_str(info_y + 11, x, "ESC       : Quit", Attr::NORMAL);

        let glyphs = state.glyphs;
        for (i, ball) in self.balls.iter().enumerate() {
            let color = if i == 0 { Color::Magenta } else { Color::Yellow };
            screen.write_char(ball.y, 1 + ball.x, glyphs.circle_filled(), Attr::color(color) | AttrFlags::BOLD);
        }

        // Floor under the playfield and wall on its right
        for fx in 0..=state.width {
            screen.write_char(state.height + 1, 1 + fx, glyphs.block(), Color::Green);
        }
        for wy in 0..=state.height {
            screen.write_char(wy, 1 + state.width, glyphs.block(), Color::Green);
        }

        let paddle = Attr::color(Color::Green) | AttrFlags::BOLD;
        for i in 0..PADDLE_WIDTH {
            let x = (self.paddle_x + i).clamp(0, state.width - 1);
            screen.write_char(state.height, x + 1, '=', paddle);
        }
    }

    fn step(&mut self, state: &mut GameState, _now: Instant) {
        let mut lost = Vec::new();
        let mut i = 0;
        while i < self.balls.len() {
            let mut ball = self.balls[i];
            ball.x += ball.vx;
            ball.y += ball.vy;

            if ball.x < 0 {
                ball.x = 0;
                ball.vx = -ball.vx;
            } else if ball.x >= state.width {
                ball.x = state.width - 1;
                ball.vx = -ball.vx;
            }
            if ball.y < 0 {
                ball.y = 0;
                ball.vy = -ball.vy;
            }

            if ball.y >= state.height {
                match self.catch(&ball) {
                    Catch::Paddle => {
                        ball.y = state.height - 1;
                        ball.vy = -ball.vy;
                        ball.vx = match ball.vx.signum() {
                            0 => random_dir(state),
                            s => s,
                        };
                        self.balls[i] = ball;
                        self.bounced(state, false);
                    }
                    Catch::Edge => {
                        ball.y = state.height - 1;
                        ball.vy = -ball.vy;
                        ball.vx = -ball.vx;
                        self.balls[i] = ball;
                        self.bounced(state, true);
                    }
                    Catch::Miss => {
                        ball.y = state.height + 1;
                        self.balls[i] = ball;
                        if i == 0 {
                            state.over = true;
                            return;
                        }
                        lost.push(i);
                    }
                }
            } else {
                self.balls[i] = ball;
            }
            i += 1;
        }

        for i in lost.into_iter().rev() {
            self.balls.remove(i);
        }
    }

    fn movement(&mut self, state: &mut GameState, key: Key) {
        let max_x = (state.width - PADDLE_WIDTH).max(0);
        match Dir::from_key(key) {
            Some(Dir::Left) => self.paddle_x = (self.paddle_x - 2).clamp(0, max_x),
            Some(Dir::Right) => self.paddle_x = (self.paddle_x + 2).clamp(0, max_x),
            _ => {}
        }
    }
}
