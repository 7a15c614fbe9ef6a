//! Configuration loading for cli-arcade.
//!
//! The configuration file is located at `~/.cli-arcade/config.toml`. Every
//! field is optional:
//!
//! ```toml
//! # Name pre-filled when the name prompt is left empty
//! player = "Player"
//!
//! # ASCII glyphs instead of box drawing and circles
//! force_ascii = false
//!
//! # trace, debug, info, warn, error (CLI_ARCADE_LOG overrides)
//! log_level = "info"
//!
//! # Highscore root (default: ~/.cli-arcade)
//! data_dir = "/home/me/.local/share/cli-arcade"
//!
//! # Key wait in menus and idle sleep of the game loop
//! poll_timeout_ms = 50
//! idle_sleep_ms = 10
//! ```
//!
//! A missing file means the defaults. A malformed one is reported and the
//! defaults are used instead. Setting
//! `CLI_ARCADE_FORCE_ASCII=1` forces ASCII glyphs regardless of the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::game::PlayContext;
use crate::ui::Glyphs;

const APP_DIR: &str = ".cli-arcade";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default player name
    pub player: String,
    pub force_ascii: bool,
    pub log_level: String,
    /// Highscore directory override
    pub data_dir: Option<PathBuf>,
    pub poll_timeout_ms: u64,
    pub idle_sleep_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player: "Player".to_string(),
            force_ascii: false,
            log_level: "info".to_string(),
            data_dir: None,
            poll_timeout_ms: 50,
            idle_sleep_ms: 10,
        }
    }
}

impl Config {
    /// Load configuration from `~/.cli-arcade/config.toml`, or the defaults
    /// when there is no such file
    pub fn load() -> Result<Self, ConfigError> {
        match Self::get_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        app_dir().map(|dir| dir.join("config.toml"))
    }

    /// Highscore root: the configured directory or `~/.cli-arcade`
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(app_dir)
    }

    /// Settings handed to every game session
    pub fn play_context(&self) -> PlayContext {
        PlayContext {
            default_player: self.player.clone(),
            glyphs: Glyphs::detect(self.force_ascii),
            data_dir: self.data_dir(),
            poll_timeout_ms: self.poll_timeout_ms,
            idle_sleep: Duration::from_millis(self.idle_sleep_ms),
        }
    }
}

/// `~/.cli-arcade`
pub fn app_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(APP_DIR))
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_file() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file() {
        let config = Config::parse("player = \"Ada\"\nidle_sleep_ms = 5\n").unwrap();
        assert_eq!(config.player, "Ada");
        assert_eq!(config.idle_sleep_ms, 5);
        assert_eq!(config.poll_timeout_ms, 50);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "player = [").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with(&format!("malformed {}", path.display())));

        let missing = dir.path().join("nope.toml");
        assert!(matches!(Config::load_from(&missing), Err(ConfigError::Read { .. })));

        fs::write(&path, "force_ascii = true\ndata_dir = \"/tmp/scores\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert!(config.force_ascii);
        assert_eq!(config.data_dir(), Some(PathBuf::from("/tmp/scores")));
    }

    #[test]
    fn test_play_context() {
        let config = Config {
            player: "Ada".into(),
            force_ascii: true,
            data_dir: Some(PathBuf::from("/tmp/x")),
            idle_sleep_ms: 3,
            ..Config::default()
        };
        let ctx = config.play_context();
        assert_eq!(ctx.default_player, "Ada");
        assert_eq!(ctx.glyphs, Glyphs::ASCII);
        assert_eq!(ctx.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(ctx.idle_sleep, Duration::from_millis(3));
    }
}
