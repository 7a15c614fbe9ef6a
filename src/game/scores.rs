//! Live score metrics and their highscores

use tracing::{info, warn};

use super::highscores::{HighScores, Record, Records};

/// A score metric a game tracks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricSpec {
    pub name: &'static str,
    /// Value at the start of a game
    pub initial: i64,
    /// Highscore value when nothing is stored yet
    pub record: i64,
}

impl MetricSpec {
    pub const fn new(name: &'static str, initial: i64, record: i64) -> Self {
        Self { name, initial, record }
    }
}

#[derive(Clone, Debug)]
struct Metric {
    name: &'static str,
    value: i64,
    new_high: bool,
}

/// Current values, loaded records and "new high" flags of one game
#[derive(Debug)]
pub struct Scoreboard {
    metrics: Vec<Metric>,
    records: Records,
    store: Option<HighScores>,
}

impl Scoreboard {
    /// Default records for a set of metrics
    pub fn default_records(specs: &[MetricSpec]) -> Records {
        specs
            .iter()
            .map(|m| (m.name.to_string(), Record::new("Player", m.record)))
            .collect()
    }

    /// Scoreboard without persistence
    pub fn new(specs: &[MetricSpec]) -> Self {
        Self {
            metrics: specs
                .iter()
                .map(|m| Metric {
                    name: m.name,
                    value: m.initial,
                    new_high: false,
                })
                .collect(),
            records: Self::default_records(specs),
            store: None,
        }
    }

    /// Scoreboard backed by a highscore file
    pub fn with_store(specs: &[MetricSpec], store: HighScores) -> Self {
        let mut board = Self::new(specs);
        board.records = store.load();
        board.store = Some(store);
        board
    }

    fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    fn metric_mut(&mut self, name: &str) -> Option<&mut Metric> {
        self.metrics.iter_mut().find(|m| m.name == name)
    }

    /// Current value, 0 for an unknown metric
    pub fn get(&self, name: &str) -> i64 {
        self.metric(name).map_or(0, |m| m.value)
    }

    pub fn set(&mut self, name: &str, value: i64) {
        match self.metric_mut(name) {
            Some(m) => m.value = value,
            None => warn!(metric = name, "set on unknown metric"),
        }
    }

    pub fn add(&mut self, name: &str, delta: i64) {
        let value = self.get(name).saturating_add(delta);
        self.set(name, value);
    }

    /// Stored best for a metric
    pub fn record(&self, name: &str) -> Option<&Record> {
        self.records.get(name)
    }

    /// Whether the metric beat its record during this game
    pub fn is_new_high(&self, name: &str) -> bool {
        self.metric(name).is_some_and(|m| m.new_high)
    }

    /// Raise every record the current values beat, crediting `player`, and
    /// persist if anything changed.
    ///
    /// Returns the metrics flagged as new highs for the first time by this
    /// call.
    pub fn update_high_scores(&mut self, player: &str) -> Vec<&'static str> {
        let mut improved = false;
        let mut newly_flagged = Vec::new();

        for metric in &mut self.metrics {
            let record = self
                .records
                .entry(metric.name.to_string())
                .or_insert_with(|| Record::new("Player", 0));
            if metric.value > record.value {
                record.value = metric.value;
                record.player = player.to_string();
                improved = true;
                if !metric.new_high {
                    metric.new_high = true;
                    newly_flagged.push(metric.name);
                }
            }
        }

        if improved {
            if let Some(store) = &self.store {
                if let Err(e) = store.save(&self.records) {
                    warn!("failed to save highscores to {}: {}", store.path().display(), e);
                }
            }
        }
        for name in &newly_flagged {
            info!(metric = *name, player, "new highscore");
        }
        newly_flagged
    }
}
