//! Daily missions
//!
//! Three missions are issued per calendar day. Coin missions are judged on a
//! single run and reset their progress every evaluation; score and multiplier
//! missions keep the best attempt. Completed missions are frozen until claimed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionKind {
    CollectCoins,
    ScorePoints,
    ReachMultiplier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MissionKind,
    pub description: String,
    pub target: u64,
    pub progress: u64,
    pub completed: bool,
    pub claimed: bool,
    /// Gems paid out on claim
    pub reward: u64,
}

/// What a finished run achieved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub credits: u64,
    pub score: u64,
    pub multiplier: u32,
}

impl Mission {
    fn new(id: String, kind: MissionKind, description: &str, target: u64, reward: u64) -> Self {
        Self {
            id,
            kind,
            description: description.to_string(),
            target,
            progress: 0,
            completed: false,
            claimed: false,
            reward,
        }
    }

    /// Fold a run into this mission. Returns true if anything changed.
    pub fn record(&mut self, run: &RunTotals) -> bool {
        if self.completed {
            return false;
        }
        let before = (self.progress, self.completed);

        match self.kind {
            // One run counts, so a weaker run can lower the displayed progress
            MissionKind::CollectCoins => {
                if run.credits >= self.target {
                    self.progress = self.target;
                    self.completed = true;
                } else {
                    self.progress = run.credits;
                }
            }
            MissionKind::ScorePoints => self.keep_best(run.score),
            MissionKind::ReachMultiplier => self.keep_best(run.multiplier as u64),
        }

        before != (self.progress, self.completed)
    }

    fn keep_best(&mut self, value: u64) {
        self.progress = self.progress.max(value);
        if value >= self.target {
            self.completed = true;
        }
    }

    pub fn is_claimable(&self) -> bool {
        self.completed && !self.claimed
    }

    /// Mark claimed and return the reward; `None` if not claimable
    pub fn claim(&mut self) -> Option<u64> {
        if !self.is_claimable() {
            return None;
        }
        self.claimed = true;
        Some(self.reward)
    }
}

/// Fresh mission batch; `stamp` makes the ids unique per generation
pub fn daily_missions(stamp: u64) -> Vec<Mission> {
    vec![
        Mission::new(
            format!("m_coins_{stamp}"),
            MissionKind::CollectCoins,
            "Collect 500 Credits in one run",
            500,
            10,
        ),
        Mission::new(
            format!("m_score_{stamp}"),
            MissionKind::ScorePoints,
            "Score 50,000 points in one run",
            50_000,
            15,
        ),
        Mission::new(
            format!("m_mult_{stamp}"),
            MissionKind::ReachMultiplier,
            "Reach 10x Multiplier",
            10,
            20,
        ),
    ]
}
