//! Banking run rewards into the economy
//!
//! Pickups only touch the run session. Balances move at game over, and only
//! by the difference between what was collected and what was already banked,
//! so a crash, revive, crash sequence never pays the same coin twice.

use serde::Serialize;

use crate::catalog::Currency;
use crate::consts::COIN_VALUE;
use crate::economy::Ledger;
use crate::highscores::{HighScoreEntry, HighScores};
use crate::missions::RunTotals;
use crate::sim::RunSession;

/// Credits for one coin at the current multiplier. Gems never scale.
pub fn coin_value(multiplier: u32, coin_mult: f32) -> u64 {
    (COIN_VALUE as f32 * multiplier as f32 * coin_mult).round() as u64
}

/// What a single banking pass moved into the ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BankReceipt {
    pub credits: u64,
    pub gems: u64,
}

/// Credit the unbanked part of the run. Safe to call any number of times.
pub fn bank_run(session: &mut RunSession, ledger: &mut Ledger) -> BankReceipt {
    let (credits, gems) = session.unbanked();
    ledger.credit(Currency::Credits, credits);
    ledger.credit(Currency::Gems, gems);
    session.banked_credits = session.credits;
    session.banked_gems = session.gems;
    BankReceipt { credits, gems }
}

pub fn run_totals(session: &RunSession) -> RunTotals {
    RunTotals {
        credits: session.credits,
        score: session.whole_score(),
        multiplier: session.multiplier,
    }
}

/// Everything that happened when a run ended
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Settlement {
    pub receipt: BankReceipt,
    pub new_high_score: bool,
    /// Leaderboard rank, 1-indexed
    pub rank: Option<usize>,
    pub missions_changed: bool,
}

/// Bank, update the high score and leaderboard, and advance missions
pub fn settle_game_over(
    session: &mut RunSession,
    vehicle: &str,
    started_at: f64,
    ledger: &mut Ledger,
    scores: &mut HighScores,
) -> Settlement {
    let receipt = bank_run(session, ledger);

    let score = session.whole_score();
    let new_high_score = scores.update_best(score);
    let rank = scores.submit(HighScoreEntry {
        score,
        distance: session.distance.max(0.0) as u64,
        multiplier: session.multiplier,
        vehicle: vehicle.to_string(),
        timestamp: started_at,
    });
    scores.save(ledger.storage_mut());

    let missions_changed = ledger.record_run(&run_totals(session));

    log::info!(
        "Run settled: score {}, banked {} credits and {} gems{}",
        score,
        receipt.credits,
        receipt.gems,
        if new_high_score { ", new high score" } else { "" }
    );

    Settlement {
        receipt,
        new_high_score,
        rank,
        missions_changed,
    }
}
