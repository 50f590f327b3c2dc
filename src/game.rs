//! Game orchestrator
//!
//! Owns the simulation, the ledger and the persisted records, turns player
//! intents into state transitions and settles runs when they end. UI layers
//! talk only to `Game`; every intent returns `Err` when it was rejected and
//! nothing changed.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::audio::{AudioSink, Cue, cues_for};
use crate::catalog::{self, Currency};
use crate::consts::REVIVE_COST;
use crate::economy::{Ledger, Stat};
use crate::error::{EconomyError, GameError, TransitionError};
use crate::highscores::HighScores;
use crate::missions::Mission;
use crate::persistence::Storage;
use crate::platform::{self, FrameClock};
use crate::rewards::{self, Settlement};
use crate::settings::{Language, Settings};
use crate::sim::{GameEvent, GamePhase, GameState, PowerUpKind, RunModifiers, TickInput, tick};

/// Read-only view for the presentation layer, refreshed every frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub high_score: u64,
    pub speed: f32,
    pub distance: f64,
    pub multiplier: u32,
    pub power_ups: BTreeMap<PowerUpKind, u32>,
    pub fever: bool,
    pub crashing: bool,
    /// Collected this run
    pub run_credits: u64,
    pub run_gems: u64,
    /// Persistent balances
    pub credits: u64,
    pub gems: u64,
    pub can_revive: bool,
    pub lane: usize,
    pub player_x: f32,
    pub bank_tilt: f32,
    pub vehicle: &'static str,
    pub missions: Vec<Mission>,
}

pub struct Game {
    ledger: Ledger,
    scores: HighScores,
    settings: Settings,
    state: GameState,
    /// Catalog index chosen in the garage
    selected: usize,
    /// Vehicle and start time of the current run
    run_vehicle: &'static str,
    run_started_at: f64,
    autopilot: bool,
    clock: FrameClock,
    cues: Vec<Cue>,
    last_settlement: Option<Settlement>,
}

/// Log a rejected intent and lift it into `GameError`
fn rejected<T, E: Into<GameError>>(action: &str, result: Result<T, E>) -> Result<T, GameError> {
    result.map_err(|e| {
        let e: GameError = e.into();
        log::debug!("{} rejected: {}", action, e);
        e
    })
}

impl Game {
    /// Load everything from `storage`, dated by the wall clock
    pub fn new(storage: Box<dyn Storage>, seed: u64) -> Self {
        let stamp = platform::now_millis() as u64;
        Self::with_date(storage, seed, &platform::today(), stamp)
    }

    /// Load with an explicit date and mission stamp
    pub fn with_date(storage: Box<dyn Storage>, seed: u64, today: &str, stamp: u64) -> Self {
        let ledger = Ledger::load(storage, today, stamp);
        let scores = HighScores::load(ledger.storage());
        let settings = Settings::load(ledger.storage());
        Self {
            ledger,
            scores,
            settings,
            state: GameState::new(seed),
            selected: 0,
            run_vehicle: catalog::starter().id,
            run_started_at: 0.0,
            autopilot: false,
            clock: FrameClock::new(),
            cues: Vec::new(),
            last_settlement: None,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.scores
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.game_phase()
    }

    pub fn selected_vehicle(&self) -> &'static catalog::VehicleProfile {
        catalog::by_index(self.selected).unwrap_or_else(catalog::starter)
    }

    /// Settlement of the most recent game over
    pub fn last_settlement(&self) -> Option<&Settlement> {
        self.last_settlement.as_ref()
    }

    /// Rotate the daily missions when the calendar day has moved on.
    /// Returns true if a fresh set was issued.
    pub fn new_day(&mut self, today: &str, stamp: u64) -> bool {
        self.ledger.refresh_missions(today, stamp)
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.autopilot = enabled;
    }

    fn modifiers_for(&self, vehicle: &str) -> RunModifiers {
        self.ledger
            .loadout(vehicle)
            .map(|l| RunModifiers::from_loadout(&l))
            .unwrap_or_default()
    }

    // === Run control ===

    /// Start a run with the selected vehicle, which must be owned
    pub fn start_run(&mut self) -> Result<(), GameError> {
        let vehicle = self.selected_vehicle().id;
        if !self.ledger.is_unlocked(vehicle) {
            return rejected("start", Err(TransitionError::VehicleLocked(vehicle.to_string())));
        }
        let modifiers = self.modifiers_for(vehicle);
        rejected("start", self.state.start(modifiers))?;
        self.begin(vehicle);
        Ok(())
    }

    /// Abandon the current run (pause menu) or go again (game over)
    pub fn restart(&mut self) -> Result<(), GameError> {
        let vehicle = self.run_vehicle;
        let modifiers = self.modifiers_for(vehicle);
        rejected("restart", self.state.restart(modifiers))?;
        self.begin(vehicle);
        Ok(())
    }

    fn begin(&mut self, vehicle: &'static str) {
        self.run_vehicle = vehicle;
        self.run_started_at = platform::now_millis();
        self.last_settlement = None;
        self.clock.reset();
        self.flush_events();
        log::info!("Run {} started with {}", self.state.session.run_id, vehicle);
    }

    pub fn pause(&mut self) -> Result<(), GameError> {
        rejected("pause", self.state.pause())?;
        self.flush_events();
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), GameError> {
        rejected("resume", self.state.resume())?;
        self.clock.reset();
        self.flush_events();
        Ok(())
    }

    /// Back to the menu. Anything collected but not banked is lost.
    pub fn quit_to_menu(&mut self) -> Result<(), GameError> {
        let (credits, gems) = self.state.session.unbanked();
        rejected("quit", self.state.quit())?;
        if credits > 0 || gems > 0 {
            log::info!("Run abandoned, forfeiting {} credits and {} gems", credits, gems);
        }
        self.flush_events();
        Ok(())
    }

    /// Pay `REVIVE_COST` credits to continue the run, once per run
    pub fn revive(&mut self) -> Result<(), GameError> {
        if self.state.game_phase() != GamePhase::GameOver {
            return rejected(
                "revive",
                Err(TransitionError::Invalid {
                    from: self.state.game_phase(),
                    action: "revive",
                }),
            );
        }
        if !self.state.can_revive() {
            return rejected("revive", Err(TransitionError::ReviveUnavailable));
        }
        rejected("revive", self.ledger.debit(Currency::Credits, REVIVE_COST))?;
        rejected("revive", self.state.revive())?;
        self.clock.reset();
        self.flush_events();
        log::info!("Run {} revived", self.state.session.run_id);
        Ok(())
    }

    /// Lane change intent: negative is left. Ignored unless driving.
    pub fn change_lane(&mut self, delta: i8) -> bool {
        self.state.change_lane(delta)
    }

    // === Garage ===

    /// Clamped to the catalog
    pub fn select_vehicle(&mut self, index: usize) {
        self.selected = index.min(catalog::VEHICLES.len() - 1);
        self.cues.push(Cue::UiClick);
    }

    /// Buy a vehicle in its catalog currency. `Ok(false)` if already owned.
    pub fn purchase_vehicle(&mut self, id: &str, cost: u64) -> Result<bool, GameError> {
        let profile = catalog::find(id).ok_or_else(|| EconomyError::UnknownVehicle(id.to_string()));
        let profile = rejected("purchase", profile)?;
        let bought = rejected(
            "purchase",
            self.ledger.unlock_vehicle(id, cost, profile.currency),
        )?;
        if bought {
            self.cues.push(Cue::PurchaseSuccess);
        }
        Ok(bought)
    }

    pub fn upgrade_stat(&mut self, vehicle: &str, stat: Stat) -> Result<u8, GameError> {
        let level = rejected("upgrade", self.ledger.upgrade_vehicle_stat(vehicle, stat))?;
        self.cues.push(Cue::PurchaseSuccess);
        Ok(level)
    }

    pub fn upgrade_power_up(&mut self, kind: PowerUpKind) -> Result<u8, GameError> {
        let level = rejected("upgrade", self.ledger.upgrade_power_up(kind))?;
        self.cues.push(Cue::PurchaseSuccess);
        Ok(level)
    }

    pub fn change_color(&mut self, vehicle: &str, color: &str) {
        self.ledger.set_vehicle_color(vehicle, color);
        self.cues.push(Cue::UiClick);
    }

    pub fn claim_mission(&mut self, id: &str) -> Result<u64, GameError> {
        let reward = rejected("claim", self.ledger.claim_mission(id))?;
        self.cues.push(Cue::PurchaseSuccess);
        Ok(reward)
    }

    pub fn buy_credits(&mut self, gem_cost: u64, amount: u64) -> Result<(), GameError> {
        rejected("exchange", self.ledger.buy_credits(gem_cost, amount))?;
        self.cues.push(Cue::PurchaseSuccess);
        Ok(())
    }

    // === Settings ===

    pub fn set_language(&mut self, language: Language) {
        self.settings.language = language;
        self.settings.save(self.ledger.storage_mut());
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.settings.set_music_volume(volume);
        self.settings.save(self.ledger.storage_mut());
    }

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.settings.set_sfx_volume(volume);
        self.settings.save(self.ledger.storage_mut());
    }

    // === Frame loop ===

    /// Run one fixed tick
    pub fn step(&mut self) {
        let input = TickInput {
            lane_shift: 0,
            autopilot: self.autopilot,
        };
        tick(&mut self.state, &input);
        self.flush_events();
    }

    /// Feed a frame's elapsed seconds; returns the ticks that ran
    pub fn advance(&mut self, dt: f32) -> u32 {
        let ticks = self.clock.advance(dt);
        for _ in 0..ticks {
            self.step();
        }
        ticks
    }

    /// Turn pending simulation events into cues, settling the run on game over
    fn flush_events(&mut self) {
        for event in self.state.drain_events() {
            self.cues.extend_from_slice(cues_for(&event));
            if event == GameEvent::GameOver {
                self.settle();
            }
        }
    }

    fn settle(&mut self) {
        let settlement = rewards::settle_game_over(
            &mut self.state.session,
            self.run_vehicle,
            self.run_started_at,
            &mut self.ledger,
            &mut self.scores,
        );
        self.last_settlement = Some(settlement);
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    /// Play every pending cue at its channel volume
    pub fn dispatch_cues(&mut self, sink: &mut dyn AudioSink) {
        for cue in self.drain_cues() {
            sink.play(cue, cue.volume(&self.settings));
        }
    }

    pub fn hud(&self) -> HudSnapshot {
        let session = &self.state.session;
        HudSnapshot {
            phase: self.state.game_phase(),
            score: session.whole_score(),
            high_score: self.scores.best,
            speed: session.speed,
            distance: session.distance,
            multiplier: session.multiplier,
            power_ups: session.power_ups.clone(),
            fever: session.is_fever(),
            crashing: self.state.is_crashing(),
            run_credits: session.credits,
            run_gems: session.gems,
            credits: self.ledger.credits(),
            gems: self.ledger.gems(),
            can_revive: self.state.can_revive()
                && self.ledger.can_afford(Currency::Credits, REVIVE_COST),
            lane: self.state.player.lane,
            player_x: self.state.player.x,
            bank_tilt: self.state.player.bank_tilt,
            vehicle: self.selected_vehicle().id,
            missions: self.ledger.missions().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::persistence::{MemoryStorage, keys};
    use crate::sim::EntityKind;
    use glam::Vec3;

    fn game() -> (Game, MemoryStorage) {
        let storage = MemoryStorage::new();
        let game = Game::with_date(Box::new(storage.clone()), 7, "2026-10-19", 1);
        (game, storage)
    }

    /// Put an entity just ahead of the player and run one tick
    fn hit(game: &mut Game, kind: EntityKind) {
        let x = game.state.player.x;
        game.state.spawn_at(kind, Vec3::new(x, 0.0, -1.0));
        game.step();
    }

    fn run_to_game_over(game: &mut Game) {
        for _ in 0..=CRASH_DELAY_TICKS {
            if game.phase() == GamePhase::GameOver {
                return;
            }
            game.step();
        }
        assert_eq!(game.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_three_coins_then_crash_banks_thirty() {
        let (mut game, _) = game();
        assert_eq!(game.ledger.credits(), 0);
        assert_eq!(game.ledger.gems(), STARTING_GEMS);
        game.start_run().unwrap();

        for _ in 0..3 {
            hit(&mut game, EntityKind::Coin);
        }
        assert_eq!(game.hud().run_credits, 30);
        assert_eq!(game.ledger.credits(), 0);

        hit(&mut game, EntityKind::Obstacle);
        assert!(game.hud().crashing);
        run_to_game_over(&mut game);

        assert_eq!(game.ledger.credits(), 30);
        let settlement = game.last_settlement().unwrap();
        assert_eq!(settlement.receipt.credits, 30);
        assert!(settlement.new_high_score);
        assert_eq!(game.hud().high_score, game.state.session.whole_score());
    }

    #[test]
    fn test_crash_revive_crash_banks_each_coin_once() {
        let (mut game, storage) = game();
        game.ledger.credit(Currency::Credits, 1000);
        game.start_run().unwrap();

        for _ in 0..5 {
            hit(&mut game, EntityKind::Coin);
        }
        hit(&mut game, EntityKind::Obstacle);
        run_to_game_over(&mut game);
        assert_eq!(game.ledger.credits(), 1050);
        assert!(game.hud().can_revive);

        game.revive().unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.ledger.credits(), 50);
        assert!(game.state.has_shield());
        game.state.session.power_ups.clear();

        for _ in 0..3 {
            hit(&mut game, EntityKind::Coin);
        }
        assert_eq!(game.state.session.credits, 80);
        hit(&mut game, EntityKind::Obstacle);
        run_to_game_over(&mut game);

        assert_eq!(game.last_settlement().unwrap().receipt.credits, 30);
        assert_eq!(game.ledger.credits(), 80);
        assert_eq!(storage.get(keys::CREDITS).as_deref(), Some("80"));
        // One leaderboard entry for the whole run
        assert_eq!(game.scores.entries.len(), 1);

        assert_eq!(
            game.revive(),
            Err(GameError::Transition(TransitionError::ReviveUnavailable))
        );
    }

    #[test]
    fn test_revive_needs_credits() {
        let (mut game, _) = game();
        game.start_run().unwrap();
        hit(&mut game, EntityKind::Obstacle);
        run_to_game_over(&mut game);
        assert!(!game.hud().can_revive);
        assert!(matches!(
            game.revive(),
            Err(GameError::Economy(EconomyError::InsufficientFunds { .. }))
        ));
        assert_eq!(game.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_revive_only_from_game_over() {
        let (mut game, _) = game();
        game.ledger.credit(Currency::Credits, 5000);
        assert!(game.revive().is_err());
        game.start_run().unwrap();
        assert!(game.revive().is_err());
        assert_eq!(game.ledger.credits(), 5000);
    }

    #[test]
    fn test_power_up_upgrade_cost_and_cap() {
        let (mut game, _) = game();
        assert_eq!(game.upgrade_power_up(PowerUpKind::Magnet), Ok(2));
        let before = game.ledger.gems();
        assert_eq!(game.upgrade_power_up(PowerUpKind::Magnet), Ok(3));
        assert_eq!(before - game.ledger.gems(), 10);
        game.upgrade_power_up(PowerUpKind::Magnet).unwrap();
        game.upgrade_power_up(PowerUpKind::Magnet).unwrap();
        assert_eq!(
            game.upgrade_power_up(PowerUpKind::Magnet),
            Err(GameError::Economy(EconomyError::MaxLevel { level: 5 }))
        );
    }

    #[test]
    fn test_locked_vehicle_cannot_start() {
        let (mut game, _) = game();
        game.select_vehicle(1);
        let id = game.selected_vehicle().id;
        assert_eq!(
            game.start_run(),
            Err(GameError::Transition(TransitionError::VehicleLocked(id.to_string())))
        );
        assert_eq!(game.phase(), GamePhase::Idle);

        game.ledger.credit(Currency::Credits, 1000);
        assert_eq!(game.purchase_vehicle(id, 1000), Ok(true));
        game.start_run().unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_selection_is_clamped() {
        let (mut game, _) = game();
        game.select_vehicle(usize::MAX);
        assert_eq!(game.selected, catalog::VEHICLES.len() - 1);
    }

    #[test]
    fn test_pause_freezes_the_run() {
        let (mut game, _) = game();
        game.start_run().unwrap();
        game.step();
        game.pause().unwrap();
        let frozen = game.hud();
        for _ in 0..30 {
            game.step();
        }
        assert_eq!(game.hud(), frozen);
        assert!(game.pause().is_err());
        game.resume().unwrap();
        game.step();
        assert!(game.hud().distance > frozen.distance);
    }

    #[test]
    fn test_quit_forfeits_unbanked_credits() {
        let (mut game, _) = game();
        game.start_run().unwrap();
        hit(&mut game, EntityKind::Coin);
        game.pause().unwrap();
        game.quit_to_menu().unwrap();
        assert_eq!(game.phase(), GamePhase::Idle);
        assert_eq!(game.ledger.credits(), 0);
        assert_eq!(game.hud().run_credits, 0);
        assert!(game.quit_to_menu().is_err());
    }

    #[test]
    fn test_restart_from_pause_starts_fresh() {
        let (mut game, _) = game();
        game.start_run().unwrap();
        hit(&mut game, EntityKind::Coin);
        assert!(game.restart().is_err());
        game.pause().unwrap();
        game.restart().unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.hud().run_credits, 0);
        assert_eq!(game.state.session.run_id, 2);
    }

    #[test]
    fn test_cues_follow_events() {
        let (mut game, _) = game();
        game.start_run().unwrap();
        hit(&mut game, EntityKind::Coin);
        let cues = game.drain_cues();
        assert!(cues.contains(&Cue::MusicStart));
        assert!(cues.contains(&Cue::CoinCollected));
        assert!(game.drain_cues().is_empty());

        let mut sink = crate::audio::LogSink::default();
        hit(&mut game, EntityKind::Obstacle);
        game.dispatch_cues(&mut sink);
        assert!(sink.played >= 1);
    }

    #[test]
    fn test_settings_persist() {
        let (mut game, storage) = game();
        game.set_language(Language::It);
        game.set_music_volume(2.0);
        game.set_sfx_volume(0.3);
        let reloaded = Game::with_date(Box::new(storage), 1, "2026-10-19", 1);
        assert_eq!(reloaded.settings().language, Language::It);
        assert_eq!(reloaded.settings().music_volume, 1.0);
        assert_eq!(reloaded.settings().sfx_volume, 0.3);
    }

    #[test]
    fn test_advance_runs_fixed_ticks() {
        let (mut game, _) = game();
        game.start_run().unwrap();
        assert_eq!(game.advance(SIM_DT * 3.5), 3);
        assert_eq!(game.state.session.ticks, 3);
    }

    #[test]
    fn test_new_day_rotates_missions_once() {
        let (mut game, _) = game();
        let before = game.hud().missions;
        assert!(!game.new_day("2026-10-19", 2));
        assert!(game.new_day("2026-10-20", 2));
        assert!(!game.new_day("2026-10-20", 3));
        assert_eq!(game.ledger().mission_date(), "2026-10-20");
        assert_ne!(game.hud().missions, before);
    }

    #[test]
    fn test_autopilot_survives_a_while() {
        let (mut game, _) = game();
        game.set_autopilot(true);
        game.start_run().unwrap();
        for _ in 0..3000 {
            game.step();
            assert!(
                !game.state.is_crashing(),
                "crashed at distance {:.0}",
                game.state.session.distance
            );
        }
        assert_eq!(game.phase(), GamePhase::Playing);
        assert!(game.drain_cues().iter().all(|cue| *cue != Cue::Crash));
    }
}
