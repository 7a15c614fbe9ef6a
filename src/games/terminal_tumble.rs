//! Terminal Tumble: falling blocks
//!
//! The well is 20 columns wide with a permanent wall in column 0. Cleared
//! lines score `100 * lines * e^(level / 10)`, with multipliers for two,
//! three and four lines at once. A hard drop adds a slam bonus that grows
//! with the distance fallen. Every ten lines raise the level and shorten
//! the tick.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::core::{Attr, AttrFlags, Color, Key, MinSize, Screen};
use crate::game::{thousands, Game, GameInfo, GameState, MetricSpec};

const TITLE: &[&str] = &[
    r"___________                  .__              .__    ___________           ___.   .__          ",
    r"\__    ___/__________  _____ |__| ____ _____  |  |   \__    ___/_ __  _____\_ |__ |  |   ____  ",
    r"  |    |_/ __ \_  __ \/     \|  |/    \\__  \ |  |     |    | |  |  \/     \| __ \|  | _/ __ \ ",
    r"  |    |\  ___/|  | \/  Y Y  \  |   |  \/ __ \|  |__   |    | |  |  /  Y Y  \ \_\ \  |_\  ___/ ",
    r"  |____| \___  >__|  |__|_|  /__|___|  (____  /____/   |____| |____/|__|_|  /___  /____/\___  >",
    r"             \/            \/        \/     \/                            \/    \/          \/ ",
];

const BOARD_COLS: usize = 20;
const SPAWN_X: i32 = 9;
const ROOF_OPENING: usize = 6;
const MIN_TICK: Duration = Duration::from_millis(50);
const TICK_STEP_SECS: f64 = 0.04;
const INFO_X: i32 = 43;
const RECORDS_X: i32 = 55;
const RULE: &str = "====================================================";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

type Blocks = [(i32, i32); 4];

impl Shape {
    const ALL: [Shape; 7] = [Shape::I, Shape::O, Shape::T, Shape::S, Shape::Z, Shape::J, Shape::L];

    /// Rotation states as (x, y) offsets
    fn rotations(self) -> &'static [Blocks] {
        match self {
            Shape::I => &[[(0, 1), (1, 1), (2, 1), (3, 1)], [(2, 0), (2, 1), (2, 2), (2, 3)]],
            Shape::O => &[[(0, 0), (1, 0), (0, 1), (1, 1)]],
            Shape::T => &[
                [(1, 0), (0, 1), (1, 1), (2, 1)],
                [(1, 0), (1, 1), (2, 1), (1, 2)],
                [(0, 1), (1, 1), (2, 1), (1, 2)],
                [(1, 0), (0, 1), (1, 1), (1, 2)],
            ],
            Shape::S => &[[(1, 0), (2, 0), (0, 1), (1, 1)], [(1, 0), (1, 1), (2, 1), (2, 2)]],
            Shape::Z => &[[(0, 0), (1, 0), (1, 1), (2, 1)], [(2, 0), (1, 1), (2, 1), (1, 2)]],
            Shape::J => &[
                [(0, 0), (0, 1), (1, 1), (2, 1)],
                [(1, 0), (2, 0), (1, 1), (1, 2)],
                [(0, 1), (1, 1), (2, 1), (2, 2)],
                [(1, 0), (1, 1), (0, 2), (1, 2)],
            ],
            Shape::L => &[
                [(2, 0), (0, 1), (1, 1), (2, 1)],
                [(1, 0), (1, 1), (1, 2), (2, 2)],
                [(0, 1), (1, 1), (2, 1), (0, 2)],
                [(0, 0), (1, 0), (1, 1), (1, 2)],
            ],
        }
    }

    fn attr(self) -> Attr {
        match self {
            Shape::I => Attr::color(Color::White),
            Shape::O => Attr::color(Color::Blue),
            Shape::T => Attr::color(Color::Cyan),
            Shape::S => Attr::color(Color::Green),
            Shape::Z => Attr::color(Color::Red),
            Shape::J => Attr::color(Color::Magenta) | AttrFlags::DIM,
            Shape::L => Attr::color(Color::Yellow),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tile {
    Empty,
    Wall,
    Block(Shape),
}

type Board = Vec<[Tile; BOARD_COLS]>;

fn empty_row() -> [Tile; BOARD_COLS] {
    let mut row = [Tile::Empty; BOARD_COLS];
    row[0] = Tile::Wall;
    row
}

#[derive(Clone, Copy, Debug)]
struct Piece {
    shape: Shape,
    rot: usize,
    x: i32,
    y: i32,
}

impl Piece {
    fn spawn(shape: Shape) -> Self {
        Self {
            shape,
            rot: 0,
            x: SPAWN_X,
            y: 0,
        }
    }

    fn blocks(&self) -> Blocks {
        self.shape.rotations()[self.rot]
    }

    fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.blocks().into_iter().map(move |(bx, by)| (self.x + bx, self.y + by))
    }

    fn collides(&self, board: &Board, dx: i32, dy: i32) -> bool {
        self.cells().any(|(x, y)| {
            let (x, y) = (x + dx, y + dy);
            if x < 0 || y < 0 || x >= BOARD_COLS as i32 || y >= board.len() as i32 {
                return true;
            }
            board[y as usize][x as usize] != Tile::Empty
        })
    }

    fn shift(&mut self, dx: i32, dy: i32, board: &Board) -> bool {
        if self.collides(board, dx, dy) {
            return false;
        }
        self.x += dx;
        self.y += dy;
        true
    }

    /// Rotate in place, undone if the new orientation does not fit
    fn rotate(&mut self, board: &Board) {
        let old = self.rot;
        self.rot = (self.rot + 1) % self.shape.rotations().len();
        if self.collides(board, 0, 0) {
            self.rot = old;
        }
    }
}

pub struct TerminalTumble {
    board: Board,
    current: Piece,
    next: Piece,
    /// Newest last; capped at `height - 22` entries
    messages: VecDeque<(String, Color)>,
    message_cap: usize,
}

fn random_piece(state: &mut GameState) -> Piece {
    let idx = state.rng.random_range(0..Shape::ALL.len());
    Piece::spawn(Shape::ALL[idx])
}

/// `100 * cleared * e^(level / 10)` truncated
fn base_points(cleared: usize, level: i64) -> f64 {
    100.0 * cleared as f64 * (level as f64 / 10.0).exp()
}

impl TerminalTumble {
    fn rows(&self) -> usize {
        self.board.len()
    }

    fn push_message(&mut self, text: String, color: Color) {
        if self.message_cap == 0 {
            return;
        }
        while self.messages.len() >= self.message_cap {
            self.messages.pop_front();
        }
        self.messages.push_back((text, color));
    }

    /// Drop full rows, refill from the top and score them
    fn clear_lines(&mut self, state: &mut GameState) -> usize {
        let rows = self.rows();
        self.board.retain(|row| row.iter().any(|t| *t == Tile::Empty));
        let cleared = rows - self.board.len();
        for _ in 0..cleared {
            self.board.insert(0, empty_row());
        }
        if cleared == 0 {
            return 0;
        }

        state.scores.add("lines", cleared as i64);
        let level = 1 + state.scores.get("lines") / 10;
        state.scores.set("level", level);
        let secs = state.tick.as_secs_f64() - (level - 1) as f64 * TICK_STEP_SECS;
        state.tick = Duration::from_secs_f64(secs.max(MIN_TICK.as_secs_f64()));

        let mut points = base_points(cleared, level) as i64;
        let (label, color) = match cleared {
            2 => {
                points = (points as f64 * 1.5) as i64;
                ("Double!", Color::Cyan)
            }
            3 => {
                points *= 2;
                ("Triple!", Color::Blue)
            }
            4 => {
                points *= 3;
                ("Full Stack!", Color::Green)
            }
            _ => ("", Color::White),
        };
        state.scores.add("score", points);
        self.push_message(format!("+{} {}", points, label), color);
        cleared
    }

    /// Write the current piece into the board and bring in the next one
    fn lock_piece(&mut self, state: &mut GameState) -> usize {
        let rows = self.rows() as i32;
        let tile = Tile::Block(self.current.shape);
        for (x, y) in self.current.cells() {
            if (0..rows).contains(&y) && (0..BOARD_COLS as i32).contains(&x) {
                self.board[y as usize][x as usize] = tile;
            }
        }
        let cleared = self.clear_lines(state);
        self.current = self.next;
        self.next = random_piece(state);
        if self.current.collides(&self.board, 0, 0) {
            state.over = true;
        }
        cleared
    }

    fn hard_drop(&mut self, state: &mut GameState) {
        let mut slam = 0.1;
        while self.current.shift(0, 1, &self.board) {
            slam *= 1.0 + state.scores.get("level") as f64 / 10.0;
        }
        let cleared = self.lock_piece(state);
        if cleared == 0 {
            return;
        }
        let level = state.scores.get("level");
        let mut bonus = (base_points(cleared, level) * cleared as f64 * slam) as i64;
        if cleared == 4 {
            bonus *= 2;
        }
        if bonus > 0 {
            state.scores.add("score", bonus);
            self.push_message(format!("+{} Slam Bonus!", bonus), Color::Magenta);
        }
    }

    fn draw_tile(screen: &mut Screen, y: i32, x: i32, tile: Tile) {
        match tile {
            Tile::Wall => screen.write_str(y, x * 2, " |", Attr::NORMAL),
            Tile::Block(shape) => screen.write_str(y, x * 2, "[]", shape.attr()),
            Tile::Empty => {}
        }
    }

    fn draw_info(&self, screen: &mut Screen, state: &GameState) {
        let mut y = TITLE.len() as i32;

        for (bx, by) in self.next.blocks() {
            screen.write_str(y + by, INFO_X + bx * 2, "[]", self.next.shape.attr());
        }
        let records = [
            ("score", "High Score", Color::Green),
            ("lines", "High Lines", Color::Blue),
            ("level", "High Level", Color::Magenta),
        ];
        for (i, (metric, label, color)) in records.into_iter().enumerate() {
            let (value, player) = state
                .scores
                .record(metric)
                .map(|r| (r.value, r.player.as_str()))
                .unwrap_or((0, "Player"));
            let line = format!("{}: {} ({})", label, thousands(value), player);
            screen.write_str(y + i as i32, RECORDS_X, &line, color);
        }

        y += 4;
        screen.write_str(y, INFO_X, &format!("Player: {}", state.player), AttrFlags::BOLD);
        screen.write_str(y + 1, INFO_X, RULE, Attr::NORMAL);
        let current = [("score", "Score", Color::Green), ("lines", "Lines", Color::Blue), ("level", "Level", Color::Magenta)];
        for (i, (metric, label, color)) in current.into_iter().enumerate() {
            let line = format!("{}: {}", label, thousands(state.scores.get(metric)));
            screen.write_str(y + 2 + i as i32, INFO_X, &line, color);
        }
        screen.write_str(y + 5, INFO_X, RULE, Attr::NORMAL);

        // Newest message on top
        y += 6;
        for (i, (text, color)) in self.messages.iter().rev().enumerate() {
            screen.write_str(y + i as i32, INFO_X, text, *color);
        }
        y += self.message_cap as i32;

        screen.write_str(y - 1, INFO_X, RULE, Attr::NORMAL);
        let help = [
            "←     | a     : Left",
            "→     | d     : Right",
            "↑     | w     : Rotate",
            "↓     | s     : Down (soft drop)",
            "SPACE | ENTER : Slam (hard drop)",
            "BACKSPACE     : Pause/Resume",
            "ESC           : Quit",
        ];
        for (i, line) in help.iter().enumerate() {
            screen.write_str(y + i as i32, INFO_X, line, Attr::NORMAL);
        }
    }
}

impl Game for TerminalTumble {
    const INFO: GameInfo = GameInfo {
        slug: "terminal_tumble",
        title: TITLE,
        accent: Color::Red,
        tick: Duration::from_millis(500),
        metrics: &[
            MetricSpec::new("score", 0, 0),
            MetricSpec::new("lines", 0, 0),
            MetricSpec::new("level", 1, 1),
        ],
        min_size: Some(MinSize::new(100, 30)),
    };

    fn new(state: &mut GameState) -> Self {
        let rows = (state.height - 6).max(1) as usize;
        let current = random_piece(state);
        let next = random_piece(state);
        Self {
            board: vec![empty_row(); rows],
            current,
            next,
            messages: VecDeque::new(),
            message_cap: (state.height - 22).max(0) as usize,
        }
    }

    fn draw(&self, screen: &mut Screen, state: &GameState) {
        let top = TITLE.len() as i32;

        // Roof with an opening over the spawn point
        let open_start = (BOARD_COLS - ROOF_OPENING) / 2;
        for x in 0..BOARD_COLS {
            let text = if (open_start..open_start + ROOF_OPENING).contains(&x) { "  " } else { "==" };
            screen.write_str(top - 1, x as i32 * 2 + 1, text, Attr::NORMAL);
        }

        for (y, row) in self.board.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                Self::draw_tile(screen, top + y as i32, x as i32, *tile);
            }
            screen.write_char(top + y as i32, BOARD_COLS as i32 * 2, '|', Attr::NORMAL);
        }
        let rows = self.rows() as i32;
        for (x, y) in self.current.cells() {
            if (0..rows).contains(&y) && (0..BOARD_COLS as i32).contains(&x) {
                Self::draw_tile(screen, top + y, x, Tile::Block(self.current.shape));
            }
        }
        for x in 0..BOARD_COLS as i32 {
            screen.write_str(top + rows, x * 2 + 1, "==", Attr::NORMAL);
        }

        self.draw_info(screen, state);
    }

    fn step(&mut self, state: &mut GameState, _now: Instant) {
        if !self.current.shift(0, 1, &self.board) {
            self.lock_piece(state);
        }
    }

    fn movement(&mut self, state: &mut GameState, key: Key) {
        match key {
            Key::Left | Key::Char(b'a') => {
                self.current.shift(-1, 0, &self.board);
            }
            Key::Right | Key::Char(b'd') => {
                self.current.shift(1, 0, &self.board);
            }
            Key::Down | Key::Char(b's') => {
                self.current.shift(0, 1, &self.board);
            }
            Key::Up | Key::Char(b'w') => self.current.rotate(&self.board),
            Key::Enter | Key::Char(b' ') => self.hard_drop(state),
            _ => {}
        }
    }

    fn on_new_high(&mut self, metric: &'static str, _state: &mut GameState) {
        let mut name = String::with_capacity(metric.len());
        let mut chars = metric.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
        self.push_message(format!("New High {}!", name), Color::Yellow);
    }
}
