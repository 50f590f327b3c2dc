//! Deterministic simulation module
//!
//! All gameplay logic for a run lives here. This module must stay pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No storage or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod motion;
pub mod pool;
pub mod session;
pub mod spawn;
pub mod state;
pub mod tick;

pub use pool::{EntityId, Pool};
pub use session::RunSession;
pub use spawn::{LaneSet, Spawner};
pub use state::{
    Entity, EntityKind, GameEvent, GamePhase, GameState, Loadout, Phase, Player, PowerUpKind,
    RunModifiers,
};
pub use tick::{TickInput, tick};
