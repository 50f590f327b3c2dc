//! Audio cues
//!
//! The core never plays sound itself. It turns game events and UI actions
//! into fire-and-forget cues which a platform sink renders.

use serde::Serialize;

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cue {
    /// Coin or gem picked up
    CoinCollected,
    /// Player hit an obstacle without a shield
    Crash,
    /// Shield or magnet picked up
    PowerUpCollected,
    /// Any accepted menu action
    UiClick,
    /// Vehicle, upgrade or credits bought
    PurchaseSuccess,
    MusicStart,
    MusicStop,
    EngineStart,
    EngineStop,
}

/// Which volume slider applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Music,
    Sfx,
}

impl Cue {
    pub fn channel(self) -> Channel {
        match self {
            Cue::MusicStart | Cue::MusicStop => Channel::Music,
            _ => Channel::Sfx,
        }
    }

    /// Playback volume under the current settings
    pub fn volume(self, settings: &Settings) -> f32 {
        match self.channel() {
            Channel::Music => settings.music_volume,
            Channel::Sfx => settings.sfx_volume,
        }
    }
}

/// Cues triggered by a simulation event
pub fn cues_for(event: &GameEvent) -> &'static [Cue] {
    match event {
        GameEvent::RunStarted | GameEvent::Revived | GameEvent::Resumed => {
            &[Cue::MusicStart, Cue::EngineStart]
        }
        GameEvent::CoinCollected { .. } | GameEvent::GemCollected => &[Cue::CoinCollected],
        GameEvent::PowerUpCollected { .. } => &[Cue::PowerUpCollected],
        GameEvent::Crashed => &[Cue::Crash, Cue::EngineStop],
        GameEvent::GameOver | GameEvent::RunAbandoned | GameEvent::Paused => {
            &[Cue::MusicStop, Cue::EngineStop]
        }
        GameEvent::ObstacleSmashed | GameEvent::MultiplierUp { .. } | GameEvent::FeverStarted => {
            &[]
        }
    }
}

/// Something that can render cues
pub trait AudioSink {
    fn play(&mut self, cue: Cue, volume: f32);
}

/// Sink for headless runs
#[derive(Debug, Default)]
pub struct LogSink {
    pub played: usize,
}

impl AudioSink for LogSink {
    fn play(&mut self, cue: Cue, volume: f32) {
        self.played += 1;
        log::trace!("Cue {:?} at volume {:.2}", cue, volume);
    }
}
