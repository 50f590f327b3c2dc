//! Neon Velocity - A lane-based endless runner
//!
//! Core modules:
//! - `sim`: Deterministic run simulation (spawning, motion, collisions, pooling)
//! - `economy`: Persistent currencies, unlocks, upgrades and missions
//! - `rewards`: Banking of run pickups into the economy
//! - `game`: Orchestrator turning player intents into state transitions
//! - `persistence`: Key/value storage backends
//! - `platform`: Frame clock and browser/native differences

pub mod audio;
pub mod catalog;
pub mod economy;
pub mod error;
pub mod game;
pub mod highscores;
pub mod missions;
pub mod persistence;
pub mod platform;
pub mod rewards;
pub mod settings;
pub mod sim;

pub use economy::Ledger;
pub use error::{EconomyError, GameError, TransitionError};
pub use game::{Game, HudSnapshot};
pub use highscores::HighScores;
pub use settings::{Language, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per displayed frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum catch-up ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;
    /// Longest frame delta the clock will accept (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.25;

    /// Track layout
    pub const LANE_COUNT: usize = 3;
    pub const LANE_WIDTH: f32 = 6.0;

    /// World depth where entities appear and where they are recycled
    pub const SPAWN_Z: f32 = -300.0;
    pub const DESPAWN_Z: f32 = 30.0;
    /// Depth band past the spawn line inspected by the lane fairness check
    pub const FAIRNESS_WINDOW: f32 = 40.0;

    /// Player collision half-width (forward reach is carried by the entity)
    pub const PLAYER_HALF_WIDTH: f32 = 1.25;

    /// Speed curve (world units per tick)
    pub const START_SPEED: f32 = 0.8;
    pub const MAX_SPEED: f32 = 15.0;
    pub const ACCELERATION: f32 = 0.0005;

    /// Score gained per unit of speed each tick
    pub const SCORE_PER_SPEED: f64 = 10.0;
    /// Distance between multiplier steps (before rarity bonus)
    pub const MULTIPLIER_MILESTONE: f64 = 3000.0;
    pub const MAX_MULTIPLIER: u32 = 20;

    /// Spawn cadence: interval = max(MIN, BASE / (speed * SPEED_FACTOR))
    pub const BASE_SPAWN_INTERVAL: f32 = 35.0;
    pub const MIN_SPAWN_INTERVAL: u32 = 10;
    pub const SPAWN_SPEED_FACTOR: f32 = 0.5;

    /// Spawn classification thresholds on a uniform roll in [0, 1)
    pub const POWER_UP_ROLL: f32 = 0.96;
    pub const GEM_ROLL: f32 = 0.92;
    pub const OBSTACLE_ROLL: f32 = 0.25;
    /// Chance an obstacle spawn becomes a two-lane truck
    pub const TRUCK_CHANCE: f64 = 0.15;
    /// Trucks read heavier by moving slower than the road
    pub const TRUCK_SPEED_FACTOR: f32 = 0.9;

    /// Pickups
    pub const COIN_VALUE: u64 = 10;
    pub const POWER_UP_BASE_TICKS: u32 = 600;
    pub const POWER_UP_TICKS_PER_LEVEL: u32 = 200;
    pub const MAGNET_RADIUS: f32 = 60.0;
    pub const MAGNET_PULL: f32 = 0.15;

    /// Crash animation time before the run is over (1.5 s)
    pub const CRASH_DELAY_TICKS: u32 = 90;
    /// Invincibility granted once the multiplier hits its cap (10 s)
    pub const FEVER_TICKS: u32 = 600;

    /// Revive
    pub const REVIVE_COST: u64 = 1000;
    pub const REVIVE_SHIELD_TICKS: u32 = 180;
    pub const REVIVE_CLEAR_NEAR: f32 = -100.0;
    pub const REVIVE_CLEAR_FAR: f32 = 50.0;

    /// Economy
    pub const STARTING_GEMS: u64 = 2000;
    pub const MAX_UPGRADE_LEVEL: u8 = 5;
    pub const STAT_UPGRADE_COST: u64 = 400;
    pub const POWER_UP_UPGRADE_COST: u64 = 5;

    /// Particles
    pub const MAX_PARTICLES: usize = 256;
    pub const PARTICLE_GRAVITY: f32 = 0.02;
    pub const PARTICLE_DECAY: f32 = 0.02;
    /// Chance per crashing tick of a smoke puff
    pub const CRASH_SMOKE_CHANCE: f64 = 0.6;

    /// Steering: lerp rate per tick, plus a bonus per handling level above 1
    pub const STEER_RATE: f32 = 0.15;
    pub const STEER_RATE_PER_LEVEL: f32 = 0.02;
    pub const BANK_FACTOR: f32 = 0.15;
    pub const BANK_SMOOTHING: f32 = 0.1;
}

/// Lane index of the middle lane (the player's starting lane)
#[inline]
pub const fn center_lane() -> usize {
    consts::LANE_COUNT / 2
}

/// Lateral world position of a lane centre
#[inline]
pub fn lane_x(lane: usize) -> f32 {
    (lane as f32 - center_lane() as f32) * consts::LANE_WIDTH
}

/// Lateral world position halfway between `pair` and `pair + 1`
#[inline]
pub fn lane_pair_x(pair: usize) -> f32 {
    (pair as f32 + 0.5 - center_lane() as f32) * consts::LANE_WIDTH
}
