//! Economy ledger
//!
//! The single owner of persistent progression: balances, unlocked vehicles,
//! per-vehicle tuning, global power-up levels and the daily missions. Every
//! mutator writes storage before touching memory, and a rejected operation
//! changes neither.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, Currency};
use crate::consts::*;
use crate::error::EconomyError;
use crate::missions::{Mission, RunTotals, daily_missions};
use crate::persistence::{Storage, keys, load_json, load_scalar, save_json, save_scalar};
use crate::sim::{Loadout, PowerUpKind};

/// Upgradable vehicle stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Speed,
    Handling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStats {
    pub speed: u8,
    pub handling: u8,
}

impl Default for VehicleStats {
    fn default() -> Self {
        Self {
            speed: 1,
            handling: 1,
        }
    }
}

impl VehicleStats {
    pub fn level(&self, stat: Stat) -> u8 {
        match stat {
            Stat::Speed => self.speed,
            Stat::Handling => self.handling,
        }
    }

    fn level_mut(&mut self, stat: Stat) -> &mut u8 {
        match stat {
            Stat::Speed => &mut self.speed,
            Stat::Handling => &mut self.handling,
        }
    }
}

/// Per-vehicle customisation, created on first upgrade or repaint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleTuning {
    pub id: String,
    pub color: String,
    pub stats: VehicleStats,
}

impl VehicleTuning {
    /// Catalog colour, level 1 everywhere
    pub fn stock(id: &str) -> Self {
        Self {
            id: id.to_string(),
            color: catalog::find(id)
                .map(|v| v.color)
                .unwrap_or("#ffffff")
                .to_string(),
            stats: VehicleStats::default(),
        }
    }
}

/// Global power-up levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpLevels {
    #[serde(rename = "SHIELD")]
    pub shield: u8,
    #[serde(rename = "MAGNET")]
    pub magnet: u8,
}

impl Default for PowerUpLevels {
    fn default() -> Self {
        Self {
            shield: 1,
            magnet: 1,
        }
    }
}

impl PowerUpLevels {
    pub fn get(&self, kind: PowerUpKind) -> u8 {
        match kind {
            PowerUpKind::Shield => self.shield,
            PowerUpKind::Magnet => self.magnet,
        }
    }

    fn get_mut(&mut self, kind: PowerUpKind) -> &mut u8 {
        match kind {
            PowerUpKind::Shield => &mut self.shield,
            PowerUpKind::Magnet => &mut self.magnet,
        }
    }

    fn clamped(self) -> Self {
        Self {
            shield: self.shield.clamp(1, MAX_UPGRADE_LEVEL),
            magnet: self.magnet.clamp(1, MAX_UPGRADE_LEVEL),
        }
    }
}

/// Parse `#rrggbb` into 0xRRGGBB
pub fn parse_color(color: &str) -> Option<u32> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

pub struct Ledger {
    storage: Box<dyn Storage>,
    credits: u64,
    gems: u64,
    /// Purchase order, starter first
    unlocked: Vec<String>,
    tunings: BTreeMap<String, VehicleTuning>,
    power_ups: PowerUpLevels,
    missions: Vec<Mission>,
    mission_date: String,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("credits", &self.credits)
            .field("gems", &self.gems)
            .field("unlocked", &self.unlocked)
            .field("power_ups", &self.power_ups)
            .field("mission_date", &self.mission_date)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Load from storage, repairing anything missing or corrupt.
    ///
    /// `today` keys the mission rotation; `stamp` makes new mission ids unique.
    pub fn load(storage: Box<dyn Storage>, today: &str, stamp: u64) -> Self {
        let mut ledger = Self {
            credits: load_scalar(storage.as_ref(), keys::CREDITS).unwrap_or(0),
            gems: load_scalar(storage.as_ref(), keys::GEMS).unwrap_or(0),
            unlocked: load_json(storage.as_ref(), keys::UNLOCKS).unwrap_or_default(),
            tunings: load_json(storage.as_ref(), keys::CONFIGS).unwrap_or_default(),
            power_ups: load_json::<PowerUpLevels>(storage.as_ref(), keys::POWER_UPS)
                .unwrap_or_default()
                .clamped(),
            missions: Vec::new(),
            mission_date: String::new(),
            storage,
        };

        // New or drained accounts get the starting grant
        if ledger.gems < STARTING_GEMS {
            ledger.store_balance(Currency::Gems, STARTING_GEMS);
        }

        let starter = catalog::starter().id;
        if !ledger.unlocked.iter().any(|id| id == starter) {
            let mut unlocked = ledger.unlocked.clone();
            unlocked.insert(0, starter.to_string());
            save_json(ledger.storage.as_mut(), keys::UNLOCKS, &unlocked);
            ledger.unlocked = unlocked;
        }

        let saved_date: Option<String> = ledger.storage.get(keys::MISSION_DATE);
        let saved_missions = match saved_date.as_deref() {
            Some(date) if date == today => load_json::<Vec<Mission>>(ledger.storage.as_ref(), keys::MISSIONS),
            _ => None,
        };
        match saved_missions {
            Some(missions) => {
                ledger.missions = missions;
                ledger.mission_date = today.to_string();
            }
            None => ledger.generate_daily_missions(today, stamp),
        }

        log::info!(
            "Ledger loaded: {} credits, {} gems, {} vehicles, {} missions for {}",
            ledger.credits,
            ledger.gems,
            ledger.unlocked.len(),
            ledger.missions.len(),
            ledger.mission_date
        );
        ledger
    }

    /// The backing store, shared with the other persisted records
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn Storage {
        self.storage.as_mut()
    }

    pub fn credits(&self) -> u64 {
        self.credits
    }

    pub fn gems(&self) -> u64 {
        self.gems
    }

    pub fn balance(&self, currency: Currency) -> u64 {
        match currency {
            Currency::Credits => self.credits,
            Currency::Gems => self.gems,
        }
    }

    pub fn can_afford(&self, currency: Currency, amount: u64) -> bool {
        self.balance(currency) >= amount
    }

    pub fn unlocked(&self) -> &[String] {
        &self.unlocked
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|u| u == id)
    }

    /// Stored tuning, or stock tuning if the vehicle was never customised
    pub fn tuning(&self, id: &str) -> VehicleTuning {
        self.tunings
            .get(id)
            .cloned()
            .unwrap_or_else(|| VehicleTuning::stock(id))
    }

    pub fn power_up_levels(&self) -> PowerUpLevels {
        self.power_ups
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    pub fn mission_date(&self) -> &str {
        &self.mission_date
    }

    /// Everything the simulation needs to know about driving `id`
    pub fn loadout(&self, id: &str) -> Option<Loadout> {
        let profile = catalog::find(id)?;
        let tuning = self.tuning(id);
        Some(Loadout {
            rarity: profile.rarity,
            speed_level: tuning.stats.speed,
            handling_level: tuning.stats.handling,
            shield_level: self.power_ups.shield,
            magnet_level: self.power_ups.magnet,
            tint: parse_color(&tuning.color)
                .or_else(|| parse_color(profile.color))
                .unwrap_or(0xffffff),
        })
    }

    fn store_balance(&mut self, currency: Currency, value: u64) {
        match currency {
            Currency::Credits => {
                save_scalar(self.storage.as_mut(), keys::CREDITS, value);
                self.credits = value;
            }
            Currency::Gems => {
                save_scalar(self.storage.as_mut(), keys::GEMS, value);
                self.gems = value;
            }
        }
    }

    fn check_funds(&self, currency: Currency, amount: u64) -> Result<(), EconomyError> {
        let available = self.balance(currency);
        if available < amount {
            return Err(EconomyError::InsufficientFunds {
                currency,
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// Always succeeds
    pub fn credit(&mut self, currency: Currency, amount: u64) {
        if amount == 0 {
            return;
        }
        let value = self.balance(currency).saturating_add(amount);
        self.store_balance(currency, value);
    }

    /// Fails without touching the balance if it would go negative
    pub fn debit(&mut self, currency: Currency, amount: u64) -> Result<(), EconomyError> {
        self.check_funds(currency, amount)?;
        let value = self.balance(currency) - amount;
        self.store_balance(currency, value);
        Ok(())
    }

    /// Pay for and unlock a vehicle. `Ok(false)` if it was already owned.
    pub fn unlock_vehicle(
        &mut self,
        id: &str,
        cost: u64,
        currency: Currency,
    ) -> Result<bool, EconomyError> {
        if self.is_unlocked(id) {
            return Ok(false);
        }
        if catalog::find(id).is_none() {
            return Err(EconomyError::UnknownVehicle(id.to_string()));
        }
        self.check_funds(currency, cost)?;

        let mut unlocked = self.unlocked.clone();
        unlocked.push(id.to_string());
        save_json(self.storage.as_mut(), keys::UNLOCKS, &unlocked);
        self.unlocked = unlocked;
        self.debit(currency, cost)?;

        log::info!("Unlocked {} for {} {:?}", id, cost, currency);
        Ok(true)
    }

    /// Raise a stat one level for `STAT_UPGRADE_COST x level` credits.
    /// Returns the new level.
    pub fn upgrade_vehicle_stat(&mut self, id: &str, stat: Stat) -> Result<u8, EconomyError> {
        if catalog::find(id).is_none() {
            return Err(EconomyError::UnknownVehicle(id.to_string()));
        }
        let mut tuning = self.tuning(id);
        let level = tuning.stats.level(stat);
        if level >= MAX_UPGRADE_LEVEL {
            return Err(EconomyError::MaxLevel { level });
        }
        let cost = STAT_UPGRADE_COST * level as u64;
        self.check_funds(Currency::Credits, cost)?;

        *tuning.stats.level_mut(stat) = level + 1;
        self.store_tuning(tuning);
        self.debit(Currency::Credits, cost)?;
        Ok(level + 1)
    }

    /// Raise a global power-up level for `5 x level` gems. Returns the new level.
    pub fn upgrade_power_up(&mut self, kind: PowerUpKind) -> Result<u8, EconomyError> {
        let level = self.power_ups.get(kind);
        if level >= MAX_UPGRADE_LEVEL {
            return Err(EconomyError::MaxLevel { level });
        }
        let cost = POWER_UP_UPGRADE_COST * level as u64;
        self.check_funds(Currency::Gems, cost)?;

        let mut levels = self.power_ups;
        *levels.get_mut(kind) = level + 1;
        save_json(self.storage.as_mut(), keys::POWER_UPS, &levels);
        self.power_ups = levels;
        self.debit(Currency::Gems, cost)?;
        Ok(level + 1)
    }

    /// Repaint a vehicle
    pub fn set_vehicle_color(&mut self, id: &str, color: &str) {
        let mut tuning = self.tuning(id);
        tuning.color = color.to_string();
        self.store_tuning(tuning);
    }

    fn store_tuning(&mut self, tuning: VehicleTuning) {
        let mut tunings = self.tunings.clone();
        tunings.insert(tuning.id.clone(), tuning);
        save_json(self.storage.as_mut(), keys::CONFIGS, &tunings);
        self.tunings = tunings;
    }

    /// Exchange gems for credits
    pub fn buy_credits(&mut self, gem_cost: u64, amount: u64) -> Result<(), EconomyError> {
        self.debit(Currency::Gems, gem_cost)?;
        self.credit(Currency::Credits, amount);
        Ok(())
    }

    /// Replace the mission set and stamp it with `today`
    pub fn generate_daily_missions(&mut self, today: &str, stamp: u64) {
        let missions = daily_missions(stamp);
        save_json(self.storage.as_mut(), keys::MISSIONS, &missions);
        self.storage.set(keys::MISSION_DATE, today);
        self.missions = missions;
        self.mission_date = today.to_string();
        log::info!("Generated daily missions for {}", today);
    }

    /// Rotate missions if the calendar day changed since they were issued
    pub fn refresh_missions(&mut self, today: &str, stamp: u64) -> bool {
        if self.mission_date == today {
            return false;
        }
        self.generate_daily_missions(today, stamp);
        true
    }

    /// Pay out a completed mission's gems. Returns the reward.
    pub fn claim_mission(&mut self, id: &str) -> Result<u64, EconomyError> {
        let mut missions = self.missions.clone();
        let mission = missions
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| EconomyError::UnknownMission(id.to_string()))?;
        let reward = mission
            .claim()
            .ok_or_else(|| EconomyError::MissionNotClaimable(id.to_string()))?;

        save_json(self.storage.as_mut(), keys::MISSIONS, &missions);
        self.missions = missions;
        self.credit(Currency::Gems, reward);
        log::info!("Claimed mission {} for {} gems", id, reward);
        Ok(reward)
    }

    /// Fold a finished run into mission progress. Returns true if any changed.
    pub fn record_run(&mut self, run: &RunTotals) -> bool {
        let mut missions = self.missions.clone();
        let changed = missions
            .iter_mut()
            .fold(false, |changed, m| m.record(run) || changed);
        if changed {
            save_json(self.storage.as_mut(), keys::MISSIONS, &missions);
            self.missions = missions;
        }
        changed
    }
}
