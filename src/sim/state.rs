//! Game state and core simulation types
//!
//! Everything a single run needs to advance lives here. Persistent progression
//! (balances, unlocks, tuning) is resolved into `RunModifiers` at run start and
//! never read again until the run ends.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::{EntityId, Pool};
use super::session::RunSession;
use super::spawn::Spawner;
use crate::catalog::Rarity;
use crate::consts::*;
use crate::error::TransitionError;
use crate::{center_lane, lane_x};

/// Externally visible phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    /// Menu, garage, no run in progress
    Idle,
    /// Run in progress (including the crash animation)
    Playing,
    /// Run frozen by the player
    Paused,
    /// Run ended, waiting for revive, restart or quit
    GameOver,
}

/// Internal run state machine
///
/// Crashing is a sub-state of playing: the outside world still sees
/// `GamePhase::Playing`, but input and spawning are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Playing,
    /// Crash animation running; the run ends when `remaining` hits zero
    Crashing { remaining: u32 },
    /// Paused; `crash_ticks` remembers an interrupted crash animation
    Paused { crash_ticks: Option<u32> },
    GameOver,
}

impl Phase {
    pub fn visible(self) -> GamePhase {
        match self {
            Phase::Idle => GamePhase::Idle,
            Phase::Playing | Phase::Crashing { .. } => GamePhase::Playing,
            Phase::Paused { .. } => GamePhase::Paused,
            Phase::GameOver => GamePhase::GameOver,
        }
    }
}

/// Timed power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerUpKind {
    Shield,
    Magnet,
}

/// Kinds of pooled world entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Obstacle,
    Truck,
    Coin,
    Gem,
    PowerUp,
    Particle,
}

impl EntityKind {
    pub const COUNT: usize = 6;
    pub const ALL: [EntityKind; Self::COUNT] = [
        EntityKind::Obstacle,
        EntityKind::Truck,
        EntityKind::Coin,
        EntityKind::Gem,
        EntityKind::PowerUp,
        EntityKind::Particle,
    ];

    /// Dense index for per-kind tables
    pub fn index(self) -> usize {
        match self {
            EntityKind::Obstacle => 0,
            EntityKind::Truck => 1,
            EntityKind::Coin => 2,
            EntityKind::Gem => 3,
            EntityKind::PowerUp => 4,
            EntityKind::Particle => 5,
        }
    }

    /// Collision extents as (half-width, forward reach)
    ///
    /// The forward reach is compared against the z distance to the player
    /// before the per-tick speed allowance is added.
    pub fn extents(self) -> (f32, f32) {
        match self {
            EntityKind::Obstacle => (1.0, 3.5),
            EntityKind::Truck => (4.0, 12.0),
            EntityKind::Coin | EntityKind::Gem => (1.25, 2.5),
            EntityKind::PowerUp => (1.75, 3.0),
            EntityKind::Particle => (0.0, 0.0),
        }
    }

    /// Resting height above the road
    pub fn height(self) -> f32 {
        match self {
            EntityKind::Obstacle | EntityKind::Truck | EntityKind::Particle => 0.0,
            EntityKind::Coin | EntityKind::Gem => 1.0,
            EntityKind::PowerUp => 1.5,
        }
    }

    /// Blocks the player (crash or shielded smash)
    pub fn is_obstacle(self) -> bool {
        matches!(self, EntityKind::Obstacle | EntityKind::Truck)
    }

    pub fn is_pickup(self) -> bool {
        matches!(self, EntityKind::Coin | EntityKind::Gem | EntityKind::PowerUp)
    }
}

/// A pooled world entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub pos: Vec3,
    /// Particle velocity (world objects move with the road instead)
    pub vel: Vec3,
    /// Particle life, 1.0 down to 0.0
    pub life: f32,
    /// Payload of a power-up pickup
    pub power_up: Option<PowerUpKind>,
    /// Particle colour, 0xRRGGBB
    pub tint: u32,
    pub active: bool,
}

impl Entity {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            life: 0.0,
            power_up: None,
            tint: 0,
            active: false,
        }
    }

    /// Clear transient fields before handing the entity back to its pool
    pub fn clear(&mut self) {
        self.vel = Vec3::ZERO;
        self.life = 0.0;
        self.power_up = None;
        self.tint = 0;
        self.active = false;
    }
}

/// The player's car
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Player {
    /// Selected lane (0 = leftmost)
    pub lane: usize,
    /// Current lateral position, eased toward the lane centre
    pub x: f32,
    /// Visual bank angle (radians, presentation only)
    pub bank_tilt: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            lane: center_lane(),
            x: lane_x(center_lane()),
            bank_tilt: 0.0,
        }
    }
}

impl Player {
    pub fn pos(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, 0.0)
    }

    /// Move one lane left (negative) or right (positive), clamped to the road
    pub fn shift_lane(&mut self, delta: i8) -> bool {
        let target = (self.lane as i32 + delta.signum() as i32).clamp(0, LANE_COUNT as i32 - 1);
        let changed = target as usize != self.lane;
        self.lane = target as usize;
        changed
    }

    /// Ease toward the selected lane and let the bank tilt follow the error
    pub fn steer(&mut self, rate: f32) {
        let error = lane_x(self.lane) - self.x;
        self.x += error * rate;
        let bank_target = -error * BANK_FACTOR;
        self.bank_tilt += (bank_target - self.bank_tilt) * BANK_SMOOTHING;
    }
}

/// What the player drives into a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub rarity: Rarity,
    pub speed_level: u8,
    pub handling_level: u8,
    pub shield_level: u8,
    pub magnet_level: u8,
    /// Paint, 0xRRGGBB (crash debris colour)
    pub tint: u32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            rarity: Rarity::Common,
            speed_level: 1,
            handling_level: 1,
            shield_level: 1,
            magnet_level: 1,
            tint: 0x00f3ff,
        }
    }
}

/// Per-run tuning derived from the loadout. Fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunModifiers {
    pub acceleration: f32,
    pub max_speed: f32,
    pub steer_rate: f32,
    /// Distance per multiplier step
    pub milestone: f64,
    pub coin_mult: f32,
    pub gem_chance: f32,
    pub shield_ticks: u32,
    pub magnet_ticks: u32,
    pub revive_shield_ticks: u32,
    pub tint: u32,
}

impl RunModifiers {
    pub fn from_loadout(loadout: &Loadout) -> Self {
        let bonus = loadout.rarity.bonus();
        let above = |level: u8| level.max(1) as f32 - 1.0;
        let duration =
            |level: u8| POWER_UP_BASE_TICKS + (level.max(1) as u32 - 1) * POWER_UP_TICKS_PER_LEVEL;

        Self {
            acceleration: ACCELERATION * (1.0 + above(loadout.speed_level) * 0.2),
            max_speed: MAX_SPEED * (1.0 + above(loadout.speed_level) * 0.1),
            steer_rate: STEER_RATE + above(loadout.handling_level) * STEER_RATE_PER_LEVEL,
            milestone: MULTIPLIER_MILESTONE / bonus.mult_speed as f64,
            coin_mult: bonus.coin_mult,
            gem_chance: bonus.gem_chance,
            shield_ticks: (duration(loadout.shield_level) as f32 * bonus.shield_mult).round() as u32,
            magnet_ticks: duration(loadout.magnet_level),
            revive_shield_ticks: (REVIVE_SHIELD_TICKS as f32 * bonus.shield_mult).round() as u32,
            tint: loadout.tint,
        }
    }

    pub fn power_up_ticks(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::Shield => self.shield_ticks,
            PowerUpKind::Magnet => self.magnet_ticks,
        }
    }
}

impl Default for RunModifiers {
    fn default() -> Self {
        Self::from_loadout(&Loadout::default())
    }
}

/// Something that happened during a tick, for audio/visual/economy consumers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GameEvent {
    RunStarted,
    CoinCollected { value: u64 },
    GemCollected,
    PowerUpCollected { kind: PowerUpKind, ticks: u32 },
    ObstacleSmashed,
    Crashed,
    MultiplierUp { multiplier: u32 },
    FeverStarted,
    GameOver,
    Revived,
    Paused,
    Resumed,
    RunAbandoned,
}

/// Complete state of the simulation
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed of the current RNG stream
    pub seed: u64,
    pub phase: Phase,
    pub session: RunSession,
    pub player: Player,
    pub pool: Pool,
    pub spawner: Spawner,
    pub modifiers: RunModifiers,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
    /// Scratch buffer for iterating active ids while mutating the pool
    pub(crate) scratch: Vec<EntityId>,
    runs_started: u64,
}

impl GameState {
    /// Create an idle game state with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            phase: Phase::Idle,
            session: RunSession::default(),
            player: Player::default(),
            pool: Pool::default(),
            spawner: Spawner::default(),
            modifiers: RunModifiers::default(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            scratch: Vec::new(),
            runs_started: 0,
        }
    }

    pub fn game_phase(&self) -> GamePhase {
        self.phase.visible()
    }

    pub fn is_crashing(&self) -> bool {
        matches!(
            self.phase,
            Phase::Crashing { .. }
                | Phase::Paused {
                    crash_ticks: Some(_)
                }
        )
    }

    /// Shield timer or fever
    pub fn has_shield(&self) -> bool {
        self.session.fever_ticks > 0 || self.session.power_up_ticks(PowerUpKind::Shield) > 0
    }

    pub fn has_magnet(&self) -> bool {
        self.session.power_up_ticks(PowerUpKind::Magnet) > 0
    }

    pub fn can_revive(&self) -> bool {
        self.phase == Phase::GameOver && !self.session.revived
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::Invalid {
            from: self.game_phase(),
            action,
        }
    }

    /// IDLE or GAME_OVER -> PLAYING with a fresh session
    pub fn start(&mut self, modifiers: RunModifiers) -> Result<(), TransitionError> {
        match self.phase {
            Phase::Idle | Phase::GameOver => {
                self.begin_run(modifiers);
                Ok(())
            }
            _ => Err(self.invalid("start")),
        }
    }

    /// Throw the current run away and begin a new one (pause menu or game over)
    pub fn restart(&mut self, modifiers: RunModifiers) -> Result<(), TransitionError> {
        match self.phase {
            Phase::Paused { .. } | Phase::GameOver => {
                self.begin_run(modifiers);
                Ok(())
            }
            _ => Err(self.invalid("restart")),
        }
    }

    fn begin_run(&mut self, modifiers: RunModifiers) {
        self.runs_started += 1;
        self.modifiers = modifiers;
        self.clear_world();
        self.session.run_id = self.runs_started;
        self.phase = Phase::Playing;
        self.events.push(GameEvent::RunStarted);
    }

    fn clear_world(&mut self) {
        self.session.reset();
        self.player = Player::default();
        self.pool.release_all();
        self.spawner.reset();
    }

    pub fn pause(&mut self) -> Result<(), TransitionError> {
        self.phase = match self.phase {
            Phase::Playing => Phase::Paused { crash_ticks: None },
            Phase::Crashing { remaining } => Phase::Paused {
                crash_ticks: Some(remaining),
            },
            _ => return Err(self.invalid("pause")),
        };
        self.events.push(GameEvent::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TransitionError> {
        self.phase = match self.phase {
            Phase::Paused { crash_ticks: None } => Phase::Playing,
            Phase::Paused {
                crash_ticks: Some(remaining),
            } => Phase::Crashing { remaining },
            _ => return Err(self.invalid("resume")),
        };
        self.events.push(GameEvent::Resumed);
        Ok(())
    }

    /// Back to the menu, discarding the run
    pub fn quit(&mut self) -> Result<(), TransitionError> {
        if self.phase == Phase::Idle {
            return Err(self.invalid("quit"));
        }
        self.clear_world();
        self.phase = Phase::Idle;
        self.events.push(GameEvent::RunAbandoned);
        Ok(())
    }

    /// GAME_OVER -> PLAYING, keeping run totals. Payment is the caller's job.
    pub fn revive(&mut self) -> Result<(), TransitionError> {
        if self.phase != Phase::GameOver {
            return Err(self.invalid("revive"));
        }
        if self.session.revived {
            return Err(TransitionError::ReviveUnavailable);
        }

        // Clear the wreck and anything about to hit the player
        let cleared = self.pool.release_where(|e| {
            e.kind.is_obstacle() && e.pos.z > REVIVE_CLEAR_NEAR && e.pos.z < REVIVE_CLEAR_FAR
        });
        log::debug!("Revive cleared {} obstacles", cleared);

        self.session.revived = true;
        self.session
            .refresh_power_up(PowerUpKind::Shield, self.modifiers.revive_shield_ticks);
        self.phase = Phase::Playing;
        self.events.push(GameEvent::Revived);
        Ok(())
    }

    /// Discrete lane change intent; ignored unless actively driving
    pub fn change_lane(&mut self, delta: i8) -> bool {
        self.phase == Phase::Playing && delta != 0 && self.player.shift_lane(delta)
    }

    /// Place an entity of `kind` at `pos`, reusing a pooled slot when possible
    pub fn spawn_at(&mut self, kind: EntityKind, pos: Vec3) -> EntityId {
        let id = self.pool.acquire(kind);
        if let Some(entity) = self.pool.get_mut(id) {
            entity.pos = pos;
        }
        id
    }

    /// Burst of particles around `origin`
    pub fn emit_particles(&mut self, origin: Vec3, count: usize, spread: f32, tint: u32) {
        let room = MAX_PARTICLES.saturating_sub(self.pool.active_count_of(EntityKind::Particle));
        for _ in 0..count.min(room) {
            let vel = Vec3::new(
                (self.rng.random::<f32>() - 0.5) * spread,
                (self.rng.random::<f32>() - 0.5) * spread,
                (self.rng.random::<f32>() - 0.5) * spread,
            );
            let id = self.pool.acquire(EntityKind::Particle);
            if let Some(p) = self.pool.get_mut(id) {
                p.pos = origin;
                p.vel = vel;
                p.life = 1.0;
                p.tint = tint;
            }
        }
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
