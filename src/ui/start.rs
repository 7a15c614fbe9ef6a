//! Per-game intro screen and player name prompt

use tracing::debug;

use crate::core::{Attr, AttrFlags, Key, Screen, SessionError};
use crate::game::{GameInfo, PlayContext};

/// Longest accepted player name
pub const MAX_NAME_LEN: usize = 50;

const INSTRUCTIONS: [&str; 2] = ["Press ENTER to Start Game", "Press ESC to Quit"];

/// Result of feeding one key to the prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptOutcome {
    Editing,
    Done(String),
    Cancelled,
}

/// Line editor for the player name
#[derive(Debug, Default)]
pub struct NamePrompt {
    name: String,
    max_len: usize,
}

impl NamePrompt {
    pub fn new(max_len: usize) -> Self {
        Self {
            name: String::new(),
            max_len,
        }
    }

    #[cfg(test)]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> String {
        format!("Enter name (max {}): {}", self.max_len, self.name)
    }

    /// Apply a key. An empty confirmed name becomes `default`.
    pub fn handle(&mut self, key: Key, default: &str) -> PromptOutcome {
        match key {
            Key::Enter => {
                let name = self.name.trim();
                let name = if name.is_empty() { default } else { name };
                PromptOutcome::Done(name.to_string())
            }
            Key::Escape => PromptOutcome::Cancelled,
            Key::Backspace => {
                self.name.pop();
                PromptOutcome::Editing
            }
            Key::Char(b) if self.name.len() < self.max_len => {
                self.name.push(b as char);
                PromptOutcome::Editing
            }
            _ => PromptOutcome::Editing,
        }
    }
}

fn title_width(info: &GameInfo) -> i32 {
    info.title
        .iter()
        .map(|line| line.chars().count() as i32)
        .max()
        .unwrap_or(0)
}

fn draw_title(screen: &mut Screen, info: &GameInfo) {
    let attr = Attr::color(info.accent) | AttrFlags::BOLD;
    for (row, line) in info.title.iter().enumerate() {
        screen.write_str(row as i32, 0, line, attr);
    }
}

/// Show the game's intro. Returns the chosen player name, or `None` if the
/// player backed out.
pub fn intro(screen: &mut Screen, info: &GameInfo, ctx: &PlayContext) -> Result<Option<String>, SessionError> {
    screen.set_timeout(ctx.poll_timeout_ms);
    let title_h = info.title.len() as i32;
    let width = title_width(info);

    loop {
        screen.clear();
        draw_title(screen, info);
        for (i, line) in INSTRUCTIONS.iter().enumerate() {
            let col = ((width - line.len() as i32) / 2).max(0);
            screen.write_str(title_h + 1 + i as i32, col, line, Attr::NORMAL);
        }
        screen.flush();

        match screen.get_key() {
            Some(Key::Enter) => return prompt_name(screen, info, ctx),
            Some(Key::Escape) => return Ok(None),
            Some(Key::Interrupt) => return Err(SessionError::Interrupted),
            _ => {}
        }
    }
}

fn prompt_name(screen: &mut Screen, info: &GameInfo, ctx: &PlayContext) -> Result<Option<String>, SessionError> {
    let title_h = info.title.len() as i32;
    let mut prompt = NamePrompt::new(MAX_NAME_LEN);
    let prefix_len = prompt.label().len() as i32 + MAX_NAME_LEN as i32;
    let col = ((title_width(info) - prefix_len) / 2).max(0);

    loop {
        screen.clear();
        draw_title(screen, info);
        screen.write_str(title_h + 3, col, &prompt.label(), Attr::NORMAL);
        screen.flush();

        let Some(key) = screen.get_key() else {
            continue;
        };
        if key == Key::Interrupt {
            return Err(SessionError::Interrupted);
        }
        match prompt.handle(key, &ctx.default_player) {
            PromptOutcome::Editing => {}
            PromptOutcome::Done(name) => {
                debug!(name = %name, "player name entered");
                return Ok(Some(name));
            }
            PromptOutcome::Cancelled => return Ok(None),
        }
    }
}
