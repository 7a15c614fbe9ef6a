//! Per-game highscore persistence
//!
//! One JSON object per game, mapping metric name to `{player, value}`:
//!
//! ```text
//! <data_dir>/games/<slug>/highscores.json
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const FILE_NAME: &str = "highscores.json";

#[derive(Error, Debug)]
pub enum HighScoreError {
    #[error("Failed to access highscores: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to encode highscores: {0}")]
    Json(#[from] serde_json::Error),
}

/// Best value of one metric and who set it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub player: String,
    pub value: i64,
}

impl Record {
    pub fn new(player: impl Into<String>, value: i64) -> Self {
        Self {
            player: player.into(),
            value,
        }
    }
}

pub type Records = BTreeMap<String, Record>;

/// Highscore file of a single game
#[derive(Clone, Debug)]
pub struct HighScores {
    path: PathBuf,
    defaults: Records,
}

impl HighScores {
    pub fn new(data_dir: &Path, slug: &str, defaults: Records) -> Self {
        Self {
            path: Self::path_for(data_dir, slug),
            defaults,
        }
    }

    /// Location of a game's highscore file
    pub fn path_for(data_dir: &Path, slug: &str) -> PathBuf {
        data_dir.join("games").join(slug).join(FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored records, filling in defaults for anything missing or
    /// malformed. An unreadable file yields the defaults.
    pub fn load(&self) -> Records {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.defaults.clone(),
            Err(e) => {
                warn!("failed to read {}: {}", self.path.display(), e);
                return self.defaults.clone();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => self.merge(map),
            Ok(_) => {
                warn!("ignoring {}: not a JSON object", self.path.display());
                self.defaults.clone()
            }
            Err(e) => {
                warn!("ignoring {}: {}", self.path.display(), e);
                self.defaults.clone()
            }
        }
    }

    fn merge(&self, map: serde_json::Map<String, Value>) -> Records {
        let mut records = Records::new();
        for (name, entry) in &map {
            let default = self.defaults.get(name);
            let Value::Object(fields) = entry else {
                if let Some(default) = default {
                    records.insert(name.clone(), default.clone());
                }
                continue;
            };

            let player = fields
                .get("player")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| default.map(|d| d.player.clone()))
                .unwrap_or_else(|| "Player".to_string());
            let value = fields
                .get("value")
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
                .or_else(|| default.map(|d| d.value))
                .unwrap_or(0);
            records.insert(name.clone(), Record { player, value });
        }

        for (name, default) in &self.defaults {
            records.entry(name.clone()).or_insert_with(|| default.clone());
        }
        records
    }

    /// Write records to a temporary file and move it into place, falling back
    /// to writing the file directly if the rename fails.
    pub fn save(&self, records: &Records) -> Result<(), HighScoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(records)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let replaced = fs::write(&tmp, &json).and_then(|_| fs::rename(&tmp, &self.path));
        if let Err(e) = replaced {
            debug!("atomic highscore write failed ({}), writing directly", e);
            let _ = fs::remove_file(&tmp);
            fs::write(&self.path, &json)?;
        }
        Ok(())
    }
}
