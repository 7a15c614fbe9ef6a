//! Built-in game list and lookup by index or name.

use crate::core::{MinSize, Screen, SessionError};
use crate::game::{play, Game, PlayContext};
use crate::games::{
    byte_bouncer::ByteBouncer, escape_sequence::EscapeSequence, prompt_hopper::PromptHopper,
    star_ship::StarShip, terminal_tumble::TerminalTumble,
};

/// Start a game's session on an already entered screen
pub type LaunchFn = fn(&mut Screen, &PlayContext) -> Result<(), SessionError>;

/// One registered game
#[derive(Clone, Copy, Debug)]
pub struct GameEntry {
    /// Display name, e.g. "Byte Bouncer"
    pub name: &'static str,
    /// Directory name for highscores, e.g. `byte_bouncer`
    pub slug: &'static str,
    pub min_size: Option<MinSize>,
    pub description: &'static str,
    pub launch: LaunchFn,
}

impl GameEntry {
    fn of<G: Game>(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            slug: G::INFO.slug,
            min_size: G::min_size(),
            description,
            launch: play::<G>,
        }
    }
}

pub struct GameRegistry {
    entries: Vec<GameEntry>,
}

impl GameRegistry {
    /// Every bundled game, sorted by name
    pub fn builtin() -> Self {
        let mut entries = vec![
            GameEntry::of::<ByteBouncer>("Byte Bouncer", "Keep every ball in play with the paddle."),
            GameEntry::of::<EscapeSequence>("Escape Sequence", "Steer a block around the screen."),
            GameEntry::of::<PromptHopper>("Prompt Hopper", "Scroll through a level built from shell prompts."),
            GameEntry::of::<StarShip>("Star Ship", "Collect stars and grow your ship without crashing."),
            GameEntry::of::<TerminalTumble>("Terminal Tumble", "Stack falling blocks and clear lines."),
        ];
        entries.sort_by_key(|e| e.name);
        Self { entries }
    }

    pub fn entries(&self) -> &[GameEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn get(&self, index: usize) -> Option<&GameEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Exact name match (case-insensitive), then first substring match
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        let lowered = name.to_lowercase();
        self.entries
            .iter()
            .position(|e| e.name.to_lowercase() == lowered)
            .or_else(|| self.entries.iter().position(|e| e.name.to_lowercase().contains(&lowered)))
    }

    /// Resolve a CLI token: a zero-based index or a name
    pub fn resolve(&self, token: &str) -> Result<usize, LookupError> {
        if let Ok(index) = token.parse::<i64>() {
            return match usize::try_from(index) {
                Ok(i) if i < self.len() => Ok(i),
                _ => Err(LookupError::OutOfRange(index)),
            };
        }
        self.find_by_name(token)
            .ok_or_else(|| LookupError::NotFound(token.to_string()))
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("Index out of range: {0}")]
    OutOfRange(i64),

    #[error("Game not found: {0}")]
    NotFound(String),
}
