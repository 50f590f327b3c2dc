//! High score and leaderboard
//!
//! The single best score is kept as its own record; the top 10 runs are kept
//! as a JSON list. A revived run resubmits under the same key and replaces
//! its earlier entry.

use serde::{Deserialize, Serialize};

use crate::persistence::{Storage, keys, load_json, load_scalar, save_json, save_scalar};

/// Maximum number of leaderboard entries to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    pub distance: u64,
    /// Peak multiplier reached
    pub multiplier: u32,
    pub vehicle: String,
    /// Unix timestamp (ms) when the run started; identifies the run
    pub timestamp: f64,
}

impl HighScoreEntry {
    fn same_run(&self, other: &HighScoreEntry) -> bool {
        self.timestamp == other.timestamp && self.vehicle == other.vehicle
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    pub best: u64,
    /// Sorted by score, descending
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(storage: &dyn Storage) -> Self {
        let mut entries: Vec<HighScoreEntry> =
            load_json(storage, keys::LEADERBOARD).unwrap_or_default();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_HIGH_SCORES);
        let best = load_scalar(storage, keys::HIGH_SCORE)
            .unwrap_or(0)
            .max(entries.first().map(|e| e.score).unwrap_or(0));
        log::info!("Loaded high score {} and {} leaderboard entries", best, entries.len());
        Self { best, entries }
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        save_scalar(storage, keys::HIGH_SCORE, self.best);
        save_json(storage, keys::LEADERBOARD, &self.entries);
    }

    /// Raise the best score. Returns true if `score` beat it.
    pub fn update_best(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Submit a finished run. Returns the 1-indexed rank it holds afterwards.
    pub fn submit(&mut self, entry: HighScoreEntry) -> Option<usize> {
        // A revived run replaces its own earlier entry
        if let Some(i) = self.entries.iter().position(|e| e.same_run(&entry)) {
            if self.entries[i].score > entry.score {
                return Some(i + 1);
            }
            self.entries.remove(i);
        }
        if !self.qualifies(entry.score) {
            return None;
        }

        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
