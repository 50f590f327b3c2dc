//! Error types for the game core.
//!
//! Nothing here is fatal. An `Err` from a ledger mutator or a control
//! transition means the request was rejected and no state changed.

use std::io;

use crate::catalog::Currency;
use crate::sim::GamePhase;

/// Top-level error returned by the `Game` orchestrator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Economy error: {0}")]
    Economy(#[from] EconomyError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),
}

/// Rejected ledger operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    #[error("Insufficient {currency:?}: need {needed}, have {available}")]
    InsufficientFunds {
        currency: Currency,
        needed: u64,
        available: u64,
    },

    #[error("Already at max level {level}")]
    MaxLevel { level: u8 },

    #[error("Unknown vehicle: {0}")]
    UnknownVehicle(String),

    #[error("Unknown mission: {0}")]
    UnknownMission(String),

    #[error("Mission not claimable: {0}")]
    MissionNotClaimable(String),
}

/// Rejected run state machine transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot {action} while {from:?}")]
    Invalid {
        from: GamePhase,
        action: &'static str,
    },

    #[error("Vehicle is locked: {0}")]
    VehicleLocked(String),

    #[error("Revive already used this run")]
    ReviveUnavailable,
}

/// Storage backend failures. Backends log these; they never reach gameplay.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
