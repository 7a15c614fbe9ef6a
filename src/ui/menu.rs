//! Launcher menu
//!
//! A scrolling list of games with reverse-video selection and a scrollbar
//! when the list does not fit.

use crate::core::{Attr, AttrFlags, Color, Key, Screen, SessionError};
use crate::game::PlayContext;

pub const TITLE: [&str; 5] = [
    r"     ________    ____   ___    ____  _________    ____  ______ ",
    r"    / ____/ /   /  _/  /   |  / __ \/ ____/   |  / __ \/ ____/ ",
    r"   / /   / /    / /   / /| | / /_/ / /   / /| | / / / / __/    ",
    r"  / /___/ /____/ /   / ___ |/ _, _/ /___/ ___ |/ /_/ / /___    ",
    r"  \____/_____/___/  /_/  |_/_/ |_|\____/_/  |_/_____/_____/    ",
];

const TITLE_COLORS: [Color; 5] = [Color::Magenta, Color::Magenta, Color::Cyan, Color::Cyan, Color::Green];

const HELP: &str = "Use Up/Down, PageUp/PageDown, Enter to start, ESC to quit";

/// What a key did to the menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    None,
    Select(usize),
    Quit,
}

/// Selection and scroll position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MenuState {
    pub selected: usize,
    pub top: usize,
}

impl MenuState {
    /// Keep `top` inside the list for `visible` rows
    pub fn clamp_top(&mut self, total: usize, visible: usize) {
        self.top = self.top.min(total.saturating_sub(visible));
    }

    pub fn handle(&mut self, key: Key, total: usize, visible: usize) -> MenuAction {
        let last = total.saturating_sub(1);
        match key {
            Key::Up => self.selected = self.selected.saturating_sub(1),
            Key::Down => self.selected = (self.selected + 1).min(last),
            Key::PageUp => self.selected = self.selected.saturating_sub(visible),
            Key::PageDown => self.selected = (self.selected + visible).min(last),
            Key::Enter if total > 0 => return MenuAction::Select(self.selected),
            Key::Escape => return MenuAction::Quit,
            _ => {}
        }

        if self.selected < self.top {
            self.top = self.selected;
        } else if self.selected >= self.top + visible {
            self.top = self.selected + 1 - visible;
        }
        MenuAction::None
    }
}

/// Thumb (offset, height) of a scrollbar `track` rows tall
pub fn scrollbar(total: usize, visible: usize, top: usize, track: usize) -> (usize, usize) {
    let total = total.max(1);
    let thumb = ((track * visible) / total).max(1).min(track);
    let range = total.saturating_sub(visible).max(1);
    let pos = (track - thumb) * top.min(range) / range;
    (pos, thumb)
}

fn draw(screen: &mut Screen, names: &[&str], state: &mut MenuState, ctx: &PlayContext) -> usize {
    screen.clear();
    let (rows, cols) = screen.size();

    for (i, line) in TITLE.iter().enumerate() {
        screen.write_str(i as i32, 0, line, TITLE_COLORS[i]);
    }
    let title_h = TITLE.len() as i32;
    screen.write_str(title_h + 1, 2, HELP, Color::White);

    let start = title_h + 3;
    let visible = (rows - start - 2).max(1) as usize;
    state.clamp_top(names.len(), visible);

    let max_name = (cols - 4).max(0) as usize;
    for (row, (i, name)) in names.iter().enumerate().skip(state.top).take(visible).enumerate() {
        let mut attr = Attr::color(Color::Cyan);
        if i == state.selected {
            attr = attr | AttrFlags::REVERSE;
        }
        let name = crate::game::truncate(name, max_name);
        screen.write_str(start + row as i32, 2, name, attr);
    }

    if names.len() > visible {
        let (pos, thumb) = scrollbar(names.len(), visible, state.top, visible);
        let col = cols - 2;
        for y in 0..visible {
            screen.write_char(start + y as i32, col, ctx.glyphs.vbar(), Attr::NORMAL);
        }
        for y in pos..pos + thumb {
            screen.write_char(start + y as i32, col, ctx.glyphs.thumb(), Attr::NORMAL);
        }
    }

    screen.flush();
    visible
}

/// Run the launcher menu. Returns the chosen index, or `None` on Escape.
pub fn launcher_menu(screen: &mut Screen, names: &[&str], ctx: &PlayContext) -> Result<Option<usize>, SessionError> {
    screen.set_timeout(ctx.poll_timeout_ms);
    let mut state = MenuState::default();
    loop {
        let visible = draw(screen, names, &mut state, ctx);
        let Some(key) = screen.get_key() else {
            continue;
        };
        if key == Key::Interrupt {
            return Err(SessionError::Interrupted);
        }
        match state.handle(key, names.len(), visible) {
            MenuAction::None => {}
            MenuAction::Select(i) => return Ok(Some(i)),
            MenuAction::Quit => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::KeySource;
    use crate::core::screen::test_support::screen;
    use crate::ui::glyphs::Glyphs;

    #[test]
    fn test_navigation_clamps() {
        let mut state = MenuState::default();
        assert_eq!(state.handle(Key::Up, 5, 3), MenuAction::None);
        assert_eq!(state.selected, 0);
        state.handle(Key::PageDown, 5, 3);
        assert_eq!(state.selected, 3);
        assert_eq!(state.top, 1);
        state.handle(Key::PageDown, 5, 3);
        assert_eq!(state.selected, 4);
        assert_eq!(state.top, 2);
        state.handle(Key::PageUp, 5, 3);
        assert_eq!((state.selected, state.top), (1, 1));
        assert_eq!(state.handle(Key::Enter, 5, 3), MenuAction::Select(1));
        assert_eq!(state.handle(Key::Escape, 5, 3), MenuAction::Quit);
    }

    #[test]
    fn test_empty_list_cannot_select() {
        let mut state = MenuState::default();
        assert_eq!(state.handle(Key::Enter, 0, 3), MenuAction::None);
    }

    #[test]
    fn test_scrollbar_geometry() {
        assert_eq!(scrollbar(10, 5, 0, 5), (0, 2));
        assert_eq!(scrollbar(10, 5, 5, 5), (3, 2));
        assert_eq!(scrollbar(100, 5, 0, 5), (0, 1));
    }

    #[test]
    fn test_menu_renders_and_selects() {
        let (tx, keys) = KeySource::detached();
        for key in [Key::Down, Key::Down, Key::Enter] {
            tx.send(key).unwrap();
        }
        let (screen, _) = screen(20, 70);
        let mut screen = screen.with_keys(keys);
        let ctx = PlayContext {
            poll_timeout_ms: 1,
            ..PlayContext::default()
        };
        let names = ["Alpha", "Beta", "Gamma"];
        assert_eq!(launcher_menu(&mut screen, &names, &ctx).unwrap(), Some(2));

        assert!(screen.row_text(6).contains(HELP));
        assert!(screen.row_text(8).contains("Alpha"));
        let (_, attr) = screen.cell(10, 2).unwrap();
        assert!(attr.flags().contains(AttrFlags::REVERSE), "Gamma is highlighted");
    }

    #[test]
    fn test_scrollbar_drawn_when_list_overflows() {
        let (tx, keys) = KeySource::detached();
        tx.send(Key::Escape).unwrap();
        let (screen, _) = screen(12, 40);
        let mut screen = screen.with_keys(keys);
        let ctx = PlayContext {
            glyphs: Glyphs::ASCII,
            poll_timeout_ms: 1,
            ..PlayContext::default()
        };
        let names = ["a", "b", "c", "d", "e", "f"];
        assert_eq!(launcher_menu(&mut screen, &names, &ctx).unwrap(), None);
        // 12 rows leave 2 visible entries starting at row 8
        assert_eq!(screen.cell(8, 38).map(|c| c.0), Some('#'));
        assert_eq!(screen.cell(9, 38).map(|c| c.0), Some('|'));
    }
}
