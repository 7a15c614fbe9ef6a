//! Star Ship: a snake that collects stars
//!
//! Yellow stars are worth 10 and grow the ship. A magenta special star shows
//! up every 8 to 18 seconds for a short while; catching it pays 50 per star
//! on the field and drops two more stars.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::Rng;

use super::{record_line, score_line, Dir};
use crate::core::{Attr, AttrFlags, Color, Key, Screen};
use crate::game::{Game, GameInfo, GameState, MetricSpec};

const TITLE: &[&str] = &[
    r"    ______             ______   _     ",
    r"   / __/ /____ _____  / __/ /  (_)__  ",
    r"  _\ \/ __/ _ `/ __/ _\ \/ _ \/ / _ \ ",
    r" /___/\__/\_,_/_/   /___/_//_/_/ .__/ ",
    r"                            /_/       ",
];

type Cell = (i32, i32);

/// Seconds of special-star lifetime per playfield row and column
const SPECIAL_SECS_PER_CELL: f64 = 0.035;
const STAR_ATTEMPTS: u32 = 5000;
const SPECIAL_ATTEMPTS: u32 = 2000;

pub struct StarShip {
    /// Head first
    ship: VecDeque<Cell>,
    dir: Dir,
    stars: Vec<Cell>,
    special: Option<Cell>,
    special_expire: Option<Instant>,
    /// Scheduled on the first step
    next_special_at: Option<Instant>,
}

fn special_delay(state: &mut GameState) -> Duration {
    Duration::from_secs_f64(state.rng.random_range(8.0..18.0))
}

impl StarShip {
    fn occupied(&self, cell: Cell) -> bool {
        self.ship.contains(&cell) || self.stars.contains(&cell) || self.special == Some(cell)
    }

    fn random_cell(state: &mut GameState) -> Cell {
        let y = state.rng.random_range(0..state.height.max(1));
        let x = state.rng.random_range(0..state.width.max(1));
        (y, x)
    }

    fn place_stars(&mut self, state: &mut GameState, count: usize) {
        let mut placed = 0;
        let mut attempts = 0;
        while placed < count && attempts < STAR_ATTEMPTS {
            attempts += 1;
            let cell = Self::random_cell(state);
            if self.occupied(cell) {
                continue;
            }
            self.stars.push(cell);
            placed += 1;
        }
        state.scores.set("stars", self.stars.len() as i64);
    }

    fn place_special(&mut self, state: &mut GameState, now: Instant) {
        self.special = None;
        self.special_expire = None;
        for _ in 0..SPECIAL_ATTEMPTS {
            let cell = Self::random_cell(state);
            if self.occupied(cell) {
                continue;
            }
            let lifetime = (state.width + state.height) as f64 * SPECIAL_SECS_PER_CELL;
            self.special = Some(cell);
            self.special_expire = Some(now + Duration::from_secs_f64(lifetime));
            return;
        }
    }

    fn update_special(&mut self, state: &mut GameState, now: Instant) {
        let next = *self.next_special_at.get_or_insert_with(|| now + special_delay(state));
        if self.special.is_none() && now >= next {
            self.place_special(state, now);
        }
        if self.special_expire.is_some_and(|expire| now >= expire) {
            self.special = None;
            self.special_expire = None;
            self.next_special_at = Some(now + special_delay(state));
        }
    }
}

impl Game for StarShip {
    const INFO: GameInfo = GameInfo {
        slug: "star_ship",
        title: TITLE,
        accent: Color::Green,
        tick: Duration::from_millis(120),
        metrics: &[
            MetricSpec::new("score", 0, 0),
            MetricSpec::new("stars", 0, 1),
            MetricSpec::new("length", 0, 3),
        ],
        min_size: None,
    };

    fn new(state: &mut GameState) -> Self {
        let (cy, cx) = (state.height / 2, state.width / 2);
        let mut game = Self {
            ship: (0..3).map(|i| (cy, cx - i)).collect(),
            dir: Dir::Right,
            stars: Vec::new(),
            special: None,
            special_expire: None,
            next_special_at: None,
        };
        game.place_stars(state, 1);
        game
    }

    fn draw(&self, screen: &mut Screen, state: &GameState) {
        let info_y = TITLE.len() as i32;
        let x = 2;
        screen.write_str(info_y, x, &record_line(state, "score", "High Score", "NEW High Score!"), Color::Green);
        screen.write_str(info_y + 1, x, &record_line(state, "length", "Longest Ship", "NEW Longest Ship!"), Color::Blue);
        screen.write_str(info_y + 2, x, &record_line(state, "stars", "Most Stars", "NEW Most Stars!"), Color::Blue);
        screen.write_str(info_y + 4, x, &format!("Player: {}", state.player), Attr::NORMAL);
        screen.write_str(info_y + 5, x, &score_line(state, "score", "Score"), Color::Green);
        screen.write_str(info_y + 6, x, &score_line(state, "length", "Ship Length"), Color::Blue);
        screen.write_str(info_y + 7, x, &score_line(state, "stars", "Stars"), Color::Blue);
        let help = [
            "↑ | w     : Up",
            "← | a     : Left",
            "↓ | s     : Down",
            "→ | d     : Right",
            "Backspace : Pause",
            "ESC       : Quit",
        ];
        for (i, line) in help.iter().enumerate() {
            screen.write_str(info_y + 9 + i as i32, x, line, Attr::NORMAL);
        }

        let glyph = state.glyphs.circle_filled();
        for &(y, x) in &self.stars {
            screen.write_char(y, x, '*', Attr::color(Color::Yellow) | AttrFlags::BOLD);
        }
        if let Some((y, x)) = self.special {
            screen.write_char(y, x, glyph, Attr::color(Color::Magenta) | AttrFlags::BOLD);
        }
        for (i, &(y, x)) in self.ship.iter().enumerate() {
            let attr = if i == 0 {
                Attr::color(Color::Green) | AttrFlags::BOLD
            } else {
                Attr::color(Color::Blue)
            };
            screen.write_char(y, x, glyph, attr);
        }
    }

    fn step(&mut self, state: &mut GameState, now: Instant) {
        self.update_special(state, now);

        let Some(&(hy, hx)) = self.ship.front() else {
            return;
        };
        let (dy, dx) = self.dir.delta();
        let head = (hy + dy, hx + dx);
        if head.0 < 0 || head.0 >= state.height || head.1 < 0 || head.1 >= state.width {
            state.over = true;
            return;
        }
        if self.ship.contains(&head) {
            state.over = true;
            return;
        }
        self.ship.push_front(head);

        if let Some(idx) = self.stars.iter().position(|&s| s == head) {
            self.stars.remove(idx);
            state.scores.add("score", 10);
            self.place_stars(state, 1);
        } else if self.special == Some(head) {
            state.scores.add("score", 50 * self.stars.len() as i64);
            self.special = None;
            self.place_stars(state, 2);
            self.place_special(state, now);
        } else {
            self.ship.pop_back();
        }
        state.scores.set("length", self.ship.len() as i64);
    }

    fn movement(&mut self, _state: &mut GameState, key: Key) {
        let Some(dir) = Dir::from_key(key) else {
            return;
        };
        let (dy, dx) = dir.delta();
        let (cy, cx) = self.dir.delta();
        // No reversing into the ship
        if (dy, dx) != (-cy, -cx) {
            self.dir = dir;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_support::state;

    fn bare(state: &mut GameState) -> StarShip {
        let mut game = StarShip::new(state);
        game.stars.clear();
        game
    }

    #[test]
    fn test_initial_ship() {
        let mut state = state::<StarShip>(24, 80);
        let game = StarShip::new(&mut state);
        assert_eq!(game.ship, VecDeque::from(vec![(11, 39), (11, 38), (11, 37)]));
        assert_eq!(game.stars.len(), 1);
        assert_eq!(state.scores.get("stars"), 1);
    }

    #[test]
    fn test_moves_without_growing() {
        let mut state = state::<StarShip>(24, 80);
        let mut game = bare(&mut state);
        game.step(&mut state, Instant::now());
        assert_eq!(game.ship.front(), Some(&(11, 40)));
        assert_eq!(game.ship.len(), 3);
        assert_eq!(state.scores.get("length"), 3);
    }

    #[test]
    fn test_eating_star_grows_and_scores() {
        let mut state = state::<StarShip>(24, 80);
        let mut game = bare(&mut state);
        game.stars.push((11, 40));
        game.step(&mut state, Instant::now());
        assert_eq!(game.ship.len(), 4);
        assert_eq!(state.scores.get("score"), 10);
        assert_eq!(game.stars.len(), 1, "a replacement star is placed");
        assert!(!game.stars.contains(&(11, 40)));
    }

    #[test]
    fn test_special_star_bonus() {
        let mut state = state::<StarShip>(24, 80);
        let mut game = bare(&mut state);
        game.stars = vec![(0, 0), (0, 1), (0, 2)];
        game.special = Some((11, 40));
        let now = Instant::now();
        game.next_special_at = Some(now + Duration::from_secs(100));
        game.special_expire = Some(now + Duration::from_secs(5));
        game.step(&mut state, now);

        assert_eq!(state.scores.get("score"), 150);
        assert_eq!(game.stars.len(), 5);
        assert_eq!(game.ship.len(), 4);
        assert!(game.special.is_some(), "a new special replaces the eaten one");
        assert_ne!(game.special, Some((11, 40)));
    }

    #[test]
    fn test_special_spawns_and_expires() {
        let mut state = state::<StarShip>(24, 80);
        let mut game = bare(&mut state);
        let start = Instant::now();
        game.step(&mut state, start);
        assert!(game.special.is_none());
        let due = game.next_special_at.unwrap();
        assert!(due >= start + Duration::from_secs(8));

        game.update_special(&mut state, due);
        assert!(game.special.is_some());
        // 78 + 23 cells at 35ms each
        let expire = game.special_expire.unwrap();
        assert_eq!(expire, due + Duration::from_secs_f64(101.0 * 0.035));

        game.update_special(&mut state, expire);
        assert!(game.special.is_none());
        assert!(game.next_special_at.unwrap() > expire);
    }

    #[test]
    fn test_wall_and_self_collision() {
        let mut wall = state::<StarShip>(24, 80);
        let mut game = bare(&mut wall);
        game.ship = VecDeque::from(vec![(0, 5), (1, 5), (2, 5)]);
        game.dir = Dir::Up;
        game.step(&mut wall, Instant::now());
        assert!(wall.over);

        let mut tangled = state::<StarShip>(24, 80);
        let mut game = bare(&mut tangled);
        game.ship = VecDeque::from(vec![(5, 5), (5, 6), (6, 6), (6, 5), (6, 4)]);
        game.dir = Dir::Down;
        game.step(&mut tangled, Instant::now());
        assert!(tangled.over);
    }

    #[test]
    fn test_no_reverse() {
        let mut state = state::<StarShip>(24, 80);
        let mut game = bare(&mut state);
        game.movement(&mut state, Key::Left);
        assert_eq!(game.dir, Dir::Right);
        game.movement(&mut state, Key::Char(b'w'));
        assert_eq!(game.dir, Dir::Up);
    }
}
