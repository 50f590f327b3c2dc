//! Player preferences
//!
//! Each setting is its own storage record so a corrupt value only resets
//! itself.

use serde::{Deserialize, Serialize};

use crate::persistence::{Storage, keys, load_scalar, save_scalar};

/// UI language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "IT")]
    It,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::It => "IT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "EN" => Some(Language::En),
            "IT" => Some(Language::It),
            _ => None,
        }
    }
}

pub const DEFAULT_VOLUME: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub language: Language,
    /// 0.0 - 1.0
    pub music_volume: f32,
    /// 0.0 - 1.0
    pub sfx_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: Language::En,
            music_volume: DEFAULT_VOLUME,
            sfx_volume: DEFAULT_VOLUME,
        }
    }
}

fn clamp_volume(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        DEFAULT_VOLUME
    }
}

impl Settings {
    pub fn load(storage: &dyn Storage) -> Self {
        let language = match storage.get(keys::LANGUAGE) {
            Some(raw) => Language::parse(&raw).unwrap_or_else(|| {
                log::warn!("Unknown language {:?}, using EN", raw);
                Language::En
            }),
            None => Language::En,
        };
        Self {
            language,
            music_volume: load_scalar(storage, keys::MUSIC_VOLUME)
                .map(clamp_volume)
                .unwrap_or(DEFAULT_VOLUME),
            sfx_volume: load_scalar(storage, keys::SFX_VOLUME)
                .map(clamp_volume)
                .unwrap_or(DEFAULT_VOLUME),
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        storage.set(keys::LANGUAGE, self.language.as_str());
        save_scalar(storage, keys::MUSIC_VOLUME, self.music_volume);
        save_scalar(storage, keys::SFX_VOLUME, self.sfx_volume);
    }

    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = clamp_volume(vol);
    }

    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = clamp_volume(vol);
    }
}
