//! Per-run counters
//!
//! Lives for one run. Reset on run start and on return to the menu so nothing
//! leaks into the next run.

use std::collections::BTreeMap;

use serde::Serialize;

use super::state::PowerUpKind;
use crate::consts::START_SPEED;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSession {
    /// Increments with every run started in this process
    pub run_id: u64,
    /// Ticks spent driving (pauses and the crash animation excluded)
    pub ticks: u64,
    pub distance: f64,
    pub score: f64,
    /// 1..=20, never decreases within a run
    pub multiplier: u32,
    pub speed: f32,
    /// A revive has been spent on this run
    pub revived: bool,
    /// Collected this run
    pub credits: u64,
    pub gems: u64,
    /// Already transferred to the ledger this run
    pub banked_credits: u64,
    pub banked_gems: u64,
    /// Remaining ticks per active power-up
    pub power_ups: BTreeMap<PowerUpKind, u32>,
    pub fever_ticks: u32,
    /// Fever fires once per run
    pub fever_spent: bool,
}

impl Default for RunSession {
    fn default() -> Self {
        Self {
            run_id: 0,
            ticks: 0,
            distance: 0.0,
            score: 0.0,
            multiplier: 1,
            speed: START_SPEED,
            revived: false,
            credits: 0,
            gems: 0,
            banked_credits: 0,
            banked_gems: 0,
            power_ups: BTreeMap::new(),
            fever_ticks: 0,
            fever_spent: false,
        }
    }
}

impl RunSession {
    /// Zero every counter; multiplier back to 1, speed back to the start speed
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn power_up_ticks(&self, kind: PowerUpKind) -> u32 {
        self.power_ups.get(&kind).copied().unwrap_or(0)
    }

    /// Set a power-up timer, keeping whichever of old and new lasts longer
    pub fn refresh_power_up(&mut self, kind: PowerUpKind, ticks: u32) {
        if ticks == 0 {
            return;
        }
        let remaining = self.power_ups.entry(kind).or_insert(0);
        *remaining = (*remaining).max(ticks);
    }

    /// Count every timer down one tick, dropping the ones that run out
    pub fn tick_power_ups(&mut self) {
        self.power_ups.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });
        self.fever_ticks = self.fever_ticks.saturating_sub(1);
    }

    pub fn is_fever(&self) -> bool {
        self.fever_ticks > 0
    }

    /// Score as displayed and persisted
    pub fn whole_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }

    /// Collected but not yet banked
    pub fn unbanked(&self) -> (u64, u64) {
        (
            self.credits.saturating_sub(self.banked_credits),
            self.gems.saturating_sub(self.banked_gems),
        )
    }
}
