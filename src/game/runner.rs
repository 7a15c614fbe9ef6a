//! Fixed-tick game loop
//!
//! One iteration polls a key, handles quit and pause, advances the
//! simulation at most once, renders the whole frame and checks highscores.
//! Simulation rate is set by the game's tick; render rate by the loop.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{Clock, Game, GameState, PlayContext, SystemClock};
use crate::core::screen::centered_col;
use crate::core::{Attr, AttrFlags, Color, Key, Screen, SessionError};
use crate::ui::start;

/// Outcome of one loop iteration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A game plus the state the shared loop owns
pub struct GameSession<G: Game> {
    game: G,
    state: GameState,
    /// Time of the last simulation step (or of the last pause/over frame)
    last_step: Instant,
    idle_sleep: Duration,
}

impl<G: Game> GameSession<G> {
    pub fn new(game: G, state: GameState, start: Instant) -> Self {
        Self {
            game,
            state,
            last_step: start,
            idle_sleep: Duration::from_millis(10),
        }
    }

    pub fn with_idle_sleep(mut self, idle_sleep: Duration) -> Self {
        self.idle_sleep = idle_sleep;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[cfg(test)]
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[cfg(test)]
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Loop until the player quits. Ctrl+C ends the loop with
    /// [`SessionError::Interrupted`].
    pub fn run(&mut self, screen: &mut Screen, clock: &dyn Clock) -> Result<(), SessionError> {
        screen.set_timeout(0);
        loop {
            let key = screen.get_key();
            let now = clock.now();
            if self.iterate(key, now, screen)? == Flow::Quit {
                debug!(game = G::INFO.slug, "quit");
                return Ok(());
            }
            clock.sleep(self.idle_sleep);
        }
    }

    /// One loop iteration with an already polled key
    pub fn iterate(&mut self, key: Option<Key>, now: Instant, screen: &mut Screen) -> Result<Flow, SessionError> {
        if let Some(key) = key {
            match key {
                Key::Escape => return Ok(Flow::Quit),
                Key::Interrupt => return Err(SessionError::Interrupted),
                _ => {}
            }
            if !self.state.over {
                if key == Key::Backspace {
                    self.state.paused = !self.state.paused;
                } else if !self.state.paused {
                    self.game.movement(&mut self.state, key);
                }
            }
        }

        if self.state.paused || self.state.over {
            // No catching up on time spent stopped
            self.last_step = now;
        } else if now.saturating_duration_since(self.last_step) >= self.state.tick {
            self.game.step(&mut self.state, now);
            let tick = self.state.tick.max(Duration::from_millis(1));
            self.last_step += tick;
            // At most one tick of backlog after a stall
            if let Some(floor) = now.checked_sub(tick) {
                self.last_step = self.last_step.max(floor);
            }
        }

        self.render(screen);

        for metric in self.state.scores.update_high_scores(&self.state.player) {
            self.game.on_new_high(metric, &mut self.state);
        }
        Ok(Flow::Continue)
    }

    fn render(&mut self, screen: &mut Screen) {
        screen.clear();
        let title_attr = Attr::color(G::INFO.accent) | AttrFlags::BOLD;
        for (row, line) in G::INFO.title.iter().enumerate() {
            screen.write_str(row as i32, 0, line, title_attr);
        }

        self.game.draw(screen, &self.state);

        let status = if self.state.over {
            Some("GAME OVER")
        } else if self.state.paused {
            Some("PAUSED")
        } else {
            None
        };
        if let Some(msg) = status {
            let row = (self.state.height / 2).clamp(0, self.state.height);
            let col = centered_col(self.state.width, msg).max(0);
            screen.write_str(row, col, msg, Attr::color(Color::Red) | AttrFlags::BOLD);
        }
        screen.flush();
    }
}

/// Run a game inside an already started screen session: intro menu, name
/// prompt, loop, and again until the player declines at the intro.
pub fn play<G: Game>(screen: &mut Screen, ctx: &PlayContext) -> Result<(), SessionError> {
    let clock = SystemClock;
    loop {
        let mut state = GameState::new(&G::INFO, screen.query_size(), ctx);
        let game = G::new(&mut state);

        let Some(player) = start::intro(screen, &G::INFO, ctx)? else {
            return Ok(());
        };
        info!(game = G::INFO.slug, player = %player, "game started");
        state.player = player;

        let mut session = GameSession::new(game, state, clock.now()).with_idle_sleep(ctx.idle_sleep);
        session.run(screen, &clock)?;
        info!(
            game = G::INFO.slug,
            score = session.state().scores.get("score"),
            "game ended"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::KeySource;
    use crate::core::screen::test_support::screen;
    use crate::game::clock::ManualClock;
    use crate::game::{GameInfo, MetricSpec};

    const TICK: Duration = Duration::from_millis(100);

    /// Counts calls; ends itself after `limit` steps
    struct Counter {
        steps: u32,
        moves: Vec<Key>,
        limit: Option<u32>,
        highs: Vec<&'static str>,
    }

    impl Game for Counter {
        const INFO: GameInfo = GameInfo {
            slug: "counter",
            title: &["COUNTER"],
            accent: Color::Cyan,
            tick: TICK,
            metrics: &[MetricSpec::new("score", 0, 0)],
            min_size: None,
        };

        fn new(_state: &mut GameState) -> Self {
            Counter {
                steps: 0,
                moves: Vec::new(),
                limit: None,
                highs: Vec::new(),
            }
        }

        fn draw(&self, screen: &mut Screen, _state: &GameState) {
            screen.write_str(2, 0, &format!("steps {}", self.steps), Attr::NORMAL);
        }

        fn step(&mut self, state: &mut GameState, _now: Instant) {
            self.steps += 1;
            state.scores.add("score", 1);
            if Some(self.steps) == self.limit {
                state.over = true;
            }
        }

        fn movement(&mut self, _state: &mut GameState, key: Key) {
            self.moves.push(key);
        }

        fn on_new_high(&mut self, metric: &'static str, _state: &mut GameState) {
            self.highs.push(metric);
        }
    }

    fn session(clock: &ManualClock) -> GameSession<Counter> {
        let mut state = GameState::new(&Counter::INFO, (24, 80), &PlayContext::default()).with_seed(1);
        let game = Counter::new(&mut state);
        GameSession::new(game, state, clock.now())
    }

    fn drive(s: &mut GameSession<Counter>, clock: &ManualClock, screen: &mut Screen, total: Duration) {
        let end = clock.elapsed() + total;
        while clock.elapsed() < end {
            clock.advance(Duration::from_millis(10));
            s.iterate(None, clock.now(), screen).unwrap();
        }
    }

    #[test]
    fn test_steps_follow_elapsed_ticks() {
        let clock = ManualClock::new();
        let (mut screen, _) = screen(24, 80);
        let mut s = session(&clock);
        drive(&mut s, &clock, &mut screen, Duration::from_millis(1000));
        assert_eq!(s.game().steps, 10);
        drive(&mut s, &clock, &mut screen, Duration::from_millis(250));
        assert_eq!(s.game().steps, 12);
    }

    #[test]
    fn test_stall_does_not_fast_forward() {
        let clock = ManualClock::new();
        let (mut screen, _) = screen(24, 80);
        let mut s = session(&clock);
        clock.advance(Duration::from_secs(5));
        s.iterate(None, clock.now(), &mut screen).unwrap();
        assert_eq!(s.game().steps, 1);
        for _ in 0..10 {
            s.iterate(None, clock.now(), &mut screen).unwrap();
        }
        assert_eq!(s.game().steps, 2, "one tick of backlog at most");

        // Back to one step per tick afterwards
        drive(&mut s, &clock, &mut screen, Duration::from_millis(500));
        assert_eq!(s.game().steps, 7);
    }

    #[test]
    fn test_no_steps_while_paused() {
        let clock = ManualClock::new();
        let (mut screen, _) = screen(24, 80);
        let mut s = session(&clock);
        s.iterate(Some(Key::Backspace), clock.now(), &mut screen).unwrap();
        assert!(s.state().paused);
        drive(&mut s, &clock, &mut screen, Duration::from_secs(5));
        assert_eq!(s.game().steps, 0);
        assert!(screen.row_text(s.state().height / 2).contains("PAUSED"));

        s.iterate(Some(Key::Left), clock.now(), &mut screen).unwrap();
        assert!(s.game().moves.is_empty(), "movement ignored while paused");

        s.iterate(Some(Key::Backspace), clock.now(), &mut screen).unwrap();
        drive(&mut s, &clock, &mut screen, Duration::from_millis(100));
        assert_eq!(s.game().steps, 1);
    }

    #[test]
    fn test_over_is_terminal() {
        let clock = ManualClock::new();
        let (mut screen, _) = screen(24, 80);
        let mut s = session(&clock);
        s.game.limit = Some(2);
        drive(&mut s, &clock, &mut screen, Duration::from_millis(500));
        assert_eq!(s.game().steps, 2);
        assert!(s.state().over);

        assert_eq!(s.iterate(Some(Key::Backspace), clock.now(), &mut screen).unwrap(), Flow::Continue);
        assert!(!s.state().paused, "pause cannot toggle once over");
        assert!(screen.row_text(s.state().height / 2).contains("GAME OVER"));

        drive(&mut s, &clock, &mut screen, Duration::from_secs(2));
        assert_eq!(s.game().steps, 2);
        assert_eq!(s.iterate(Some(Key::Escape), clock.now(), &mut screen).unwrap(), Flow::Quit);
    }

    #[test]
    fn test_game_over_beats_paused() {
        let clock = ManualClock::new();
        let (mut screen, _) = screen(24, 80);
        let mut s = session(&clock);
        s.state_mut().paused = true;
        s.state_mut().over = true;
        s.iterate(None, clock.now(), &mut screen).unwrap();
        let row = screen.row_text(s.state().height / 2);
        assert!(row.contains("GAME OVER"));
        assert!(!row.contains("PAUSED"));
    }

    #[test]
    fn test_movement_and_interrupt() {
        let clock = ManualClock::new();
        let (mut screen, _) = screen(24, 80);
        let mut s = session(&clock);
        s.iterate(Some(Key::Up), clock.now(), &mut screen).unwrap();
        s.iterate(Some(Key::Char(b'a')), clock.now(), &mut screen).unwrap();
        assert_eq!(s.game().moves, vec![Key::Up, Key::Char(b'a')]);
        assert!(matches!(
            s.iterate(Some(Key::Interrupt), clock.now(), &mut screen),
            Err(SessionError::Interrupted)
        ));
    }

    #[test]
    fn test_frame_has_title_and_new_high_hook_fires_once() {
        let clock = ManualClock::new();
        let (mut screen, _) = screen(24, 80);
        let mut s = session(&clock);
        drive(&mut s, &clock, &mut screen, Duration::from_millis(300));
        assert_eq!(screen.row_text(0).trim_end(), "COUNTER");
        assert_eq!(screen.row_text(2).trim_end(), "steps 3");
        assert_eq!(s.game().highs, vec!["score"]);
        assert!(s.state().scores.is_new_high("score"));
    }

    #[test]
    fn test_run_until_escape() {
        let clock = ManualClock::new();
        let (tx, keys) = KeySource::detached();
        let (screen, _) = screen(24, 80);
        let mut screen = screen.with_keys(keys);
        let mut s = session(&clock);
        for key in [Key::Right, Key::Right, Key::Escape] {
            tx.send(key).unwrap();
        }
        s.run(&mut screen, &clock).unwrap();
        assert_eq!(s.game().moves, vec![Key::Right, Key::Right]);
        assert_eq!(clock.elapsed(), Duration::from_millis(20));
    }
}
