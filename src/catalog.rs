//! Vehicle catalog
//!
//! Static, immutable data. The simulation only cares about a vehicle's id,
//! rarity and tuning levels; meshes and descriptions belong to presentation.

use serde::{Deserialize, Serialize};

/// Rarity tier of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
    ];

    /// Gameplay perks granted by this tier
    pub fn bonus(self) -> RarityBonus {
        match self {
            Rarity::Common => RarityBonus::NONE,
            // +10% credits
            Rarity::Rare => RarityBonus {
                coin_mult: 1.1,
                ..RarityBonus::NONE
            },
            // +50% shield duration
            Rarity::Epic => RarityBonus {
                shield_mult: 1.5,
                ..RarityBonus::NONE
            },
            // +50% multiplier gain
            Rarity::Legendary => RarityBonus {
                mult_speed: 1.5,
                ..RarityBonus::NONE
            },
            // +50% multiplier gain, +2% gem chance per spawn
            Rarity::Mythic => RarityBonus {
                mult_speed: 1.5,
                gem_chance: 0.02,
                ..RarityBonus::NONE
            },
        }
    }
}

/// Multiplicative perks attached to a rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityBonus {
    /// Scales credits per coin
    pub coin_mult: f32,
    /// Scales shield power-up duration
    pub shield_mult: f32,
    /// Divides the distance needed per multiplier step
    pub mult_speed: f32,
    /// Added to the gem spawn probability
    pub gem_chance: f32,
}

impl RarityBonus {
    pub const NONE: RarityBonus = RarityBonus {
        coin_mult: 1.0,
        shield_mult: 1.0,
        mult_speed: 1.0,
        gem_chance: 0.0,
    };
}

impl Default for RarityBonus {
    fn default() -> Self {
        Self::NONE
    }
}

/// Currency a purchase is priced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Currency {
    Credits,
    Gems,
}

/// Body style, used by presentation to pick a model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleClass {
    Racer,
    Tank,
}

/// A purchasable vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleProfile {
    pub id: &'static str,
    pub name: &'static str,
    /// Default paint, `#rrggbb`
    pub color: &'static str,
    pub class: VehicleClass,
    pub rarity: Rarity,
    pub price: u64,
    pub currency: Currency,
}

const fn vehicle(
    id: &'static str,
    name: &'static str,
    color: &'static str,
    class: VehicleClass,
    rarity: Rarity,
    price: u64,
    currency: Currency,
) -> VehicleProfile {
    VehicleProfile {
        id,
        name,
        color,
        class,
        rarity,
        price,
        currency,
    }
}

use Currency::{Credits, Gems};
use Rarity::{Common, Epic, Legendary, Mythic, Rare};
use VehicleClass::{Racer, Tank};

/// Every vehicle, cheapest first. Index 0 is the free starter.
pub static VEHICLES: [VehicleProfile; 27] = [
    vehicle("c_mini", "MINI COOPER S", "#ffffff", Racer, Common, 0, Credits),
    vehicle("c_bmw_m3", "BMW M3 E46", "#0033aa", Racer, Common, 1000, Credits),
    vehicle("c_civic", "HONDA CIVIC EK9", "#ffff00", Racer, Common, 1800, Credits),
    vehicle("c_s2000", "HONDA S2000", "#cccccc", Racer, Rare, 3500, Credits),
    vehicle("c_silvia", "NISSAN SILVIA S15", "#00ccff", Racer, Rare, 4500, Credits),
    vehicle("c_evo", "MITSUBISHI EVO VI", "#ffffff", Racer, Rare, 6000, Credits),
    vehicle("c_impreza", "SUBARU IMPREZA 22B", "#0033ff", Racer, Rare, 9500, Credits),
    vehicle("c_ae86", "TOYOTA AE86", "#ffffff", Racer, Rare, 11000, Credits),
    vehicle("c_r32", "NISSAN SKYLINE R32", "#333333", Racer, Rare, 12500, Credits),
    vehicle("c_350z", "NISSAN 350Z", "#ff8800", Racer, Epic, 15000, Credits),
    vehicle("c_rx7", "MAZDA RX-7 FD", "#ffff00", Racer, Epic, 18000, Credits),
    vehicle("c_jeep_wrangler", "OFFROAD KING", "#445500", Tank, Epic, 20000, Credits),
    vehicle("c_police_interceptor", "INTERCEPTOR", "#000000", Racer, Epic, 22000, Credits),
    vehicle("c_nsx", "HONDA NSX NA1", "#cc0000", Racer, Epic, 25000, Credits),
    vehicle("c_viper", "DODGE VIPER GTS", "#0000cc", Racer, Epic, 28000, Credits),
    vehicle("c_gtr_r34", "NISSAN GTR R34", "#0000cc", Racer, Legendary, 35000, Credits),
    vehicle("c_peterbilt", "THE HAULER", "#aa0000", Tank, Legendary, 40000, Credits),
    vehicle("c_f40", "FERRARI F40", "#ff0000", Racer, Legendary, 60000, Credits),
    vehicle("c_p1", "MCLAREN P1", "#ff8800", Racer, Legendary, 80000, Credits),
    vehicle("c_porsche_gt3_touring", "PORSCHE 911 TOURING", "#333333", Racer, Legendary, 90000, Credits),
    vehicle("c_porsche_gt3_rs", "PORSCHE 911 GT3 RS", "#44cc44", Racer, Legendary, 100000, Credits),
    vehicle("c_f1", "MCLAREN F1", "#888888", Racer, Legendary, 120000, Credits),
    vehicle("c_porsche_gt3_mr", "PORSCHE 911 MR", "#ff0055", Racer, Legendary, 140000, Credits),
    vehicle("c_ferrari_499p", "FERRARI 499P", "#cc0000", Racer, Mythic, 100, Gems),
    vehicle("c_m1_abrams", "THE TANK", "#4b5320", Tank, Mythic, 150, Gems),
    vehicle("c_formula1", "FORMULA 1", "#ff0000", Racer, Mythic, 200, Gems),
    vehicle("c_fighter_jet", "FIGHTER JET", "#334455", Racer, Mythic, 500, Gems),
];

/// Paint shop colours
pub const NEON_PALETTE: [&str; 9] = [
    "#00f3ff", "#ff0055", "#9d00ff", "#00ff66", "#ffaa00", "#ffffff", "#ffff00", "#ff00ff",
    "#ffe135",
];

/// The vehicle every account owns
pub fn starter() -> &'static VehicleProfile {
    &VEHICLES[0]
}

/// Look up a vehicle by id
pub fn find(id: &str) -> Option<&'static VehicleProfile> {
    VEHICLES.iter().find(|v| v.id == id)
}

/// Look up a vehicle by catalog index
pub fn by_index(index: usize) -> Option<&'static VehicleProfile> {
    VEHICLES.get(index)
}
