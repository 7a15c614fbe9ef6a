//! Launcher flow and the non-interactive commands.
//!
//! The launcher alternates between two screen sessions: the game menu, then
//! the chosen game. Size checks happen on the normal screen in between so
//! their messages stay visible.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::core::session::{self, ensure_min_size};
use crate::core::{MinSize, SessionError};
use crate::game::{HighScores, PlayContext};
use crate::registry::{GameEntry, GameRegistry};
use crate::ui::launcher_menu;

pub const ARCADE_NAME: &str = "CLI Arcade";
pub const MENU_MIN_SIZE: MinSize = MinSize::new(70, 20);

/// Menu, game, menu, ... until the player quits the menu
pub fn run_menu(registry: &GameRegistry, ctx: &PlayContext) -> anyhow::Result<()> {
    if !ensure_min_size(ARCADE_NAME, MENU_MIN_SIZE) {
        return Ok(());
    }
    let names = registry.names();
    loop {
        let choice = session::run(|screen| Ok(launcher_menu(screen, &names, ctx)?))?;
        let Some(index) = choice else {
            info!("menu closed");
            return Ok(());
        };
        let Some(entry) = registry.get(index) else {
            continue;
        };
        if !run_game(entry, ctx)? {
            return Ok(());
        }
    }
}

/// Run one game in its own session.
///
/// Returns false when the terminal is too small for it. Errors other than
/// Ctrl+C are reported and swallowed.
pub fn run_game(entry: &GameEntry, ctx: &PlayContext) -> anyhow::Result<bool> {
    if let Some(min) = entry.min_size {
        if !ensure_min_size(entry.name, min) {
            return Ok(false);
        }
    }
    info!(game = entry.slug, description = entry.description, "launching");
    let launch = entry.launch;
    match session::run(|screen| Ok(launch(screen, ctx)?)) {
        Ok(()) => Ok(true),
        Err(e) if SessionError::is_interrupt(&e) => Err(e),
        Err(e) => {
            error!(game = entry.slug, "game failed: {:#}", e);
            println!("  [ERROR] Error running game {}: {}", entry.name, e);
            Ok(true)
        }
    }
}

/// `  [i] Name` per game
pub fn list(registry: &GameRegistry, out: &mut impl Write) -> io::Result<()> {
    for (i, entry) in registry.entries().iter().enumerate() {
        writeln!(out, "  [{}] {}", i, entry.name)?;
    }
    Ok(())
}

/// Same list, indented under a lookup failure message
pub fn list_indented(registry: &GameRegistry, out: &mut impl Write) -> io::Result<()> {
    for (i, entry) in registry.entries().iter().enumerate() {
        writeln!(out, "    [{}] {}", i, entry.name)?;
    }
    Ok(())
}

/// Highscore files that exist for the given games
fn existing_files<'a>(data_dir: &Path, entries: impl Iterator<Item = &'a GameEntry>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = entries
        .map(|e| HighScores::path_for(data_dir, e.slug))
        .filter(|p| p.exists())
        .collect();
    files.sort();
    files.dedup();
    files
}

fn confirm(question: &str, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "  [ACTION] {} [y/N]: ", question)?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_lowercase().starts_with('y'))
}

/// Delete highscore files for one game (`Some(index)`) or all of them,
/// asking first unless `yes`
pub fn reset(
    registry: &GameRegistry,
    data_dir: &Path,
    game: Option<usize>,
    yes: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    let (files, question) = match game.and_then(|i| registry.get(i).map(|e| (i, e))) {
        Some((index, entry)) => {
            let files = existing_files(data_dir, std::iter::once(entry));
            if files.is_empty() {
                writeln!(out, "  [INFO] No highscore files found for '{}' ({}).", entry.name, data_dir.display())?;
                return Ok(());
            }
            writeln!(out, "  [INFO] Found {} highscore file(s) for '{}':", files.len(), entry.name)?;
            for f in &files {
                writeln!(out, "    [{}] {}", index, f.display())?;
            }
            (files, format!("Delete these files for '{}'?", entry.name))
        }
        None => {
            let files = existing_files(data_dir, registry.entries().iter());
            if files.is_empty() {
                writeln!(out, "  [INFO] No highscore files found for any game.")?;
                return Ok(());
            }
            writeln!(out, "  [INFO] Found {} highscore file(s):", files.len())?;
            for (i, f) in files.iter().enumerate() {
                writeln!(out, "    [{}] {}", i, f.display())?;
            }
            (files, "Delete all these highscore files?".to_string())
        }
    };

    if !yes && !confirm(&question, input, out)? {
        writeln!(out, "  [CANCELED]")?;
        return Ok(());
    }
    for f in &files {
        match fs::remove_file(f) {
            Ok(()) => {
                info!("deleted {}", f.display());
                writeln!(out, "  [DELETED] {}", f.display())?;
            }
            Err(e) => writeln!(out, "  [ERROR] Failed to delete {}: {}", f.display(), e)?,
        }
    }
    Ok(())
}
