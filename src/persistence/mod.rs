//! Key/value persistence
//!
//! Features:
//! - One logical record per key, scalars as decimal strings, collections as JSON
//! - Pluggable backends: in-memory, JSON file (native), LocalStorage (web)
//! - Corrupt records fall back to defaults with a warning, never an error

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::rc::Rc;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(not(target_arch = "wasm32"))]
pub mod file;
#[cfg(target_arch = "wasm32")]
pub mod local;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

/// Storage keys
pub mod keys {
    pub const HIGH_SCORE: &str = "neon-velocity-highscore";
    pub const LEADERBOARD: &str = "neon-velocity-leaderboard";
    pub const CREDITS: &str = "neon-velocity-credits";
    pub const GEMS: &str = "neon-velocity-gems";
    pub const UNLOCKS: &str = "neon-velocity-unlocks";
    pub const POWER_UPS: &str = "neon-velocity-powerups";
    pub const CONFIGS: &str = "neon-velocity-configs";
    pub const MISSIONS: &str = "neon-velocity-missions";
    pub const MISSION_DATE: &str = "neon-velocity-mission-date";
    pub const LANGUAGE: &str = "neon-velocity-lang";
    pub const MUSIC_VOLUME: &str = "neon-velocity-music-vol";
    pub const SFX_VOLUME: &str = "neon-velocity-sfx-vol";
}

/// Synchronous string store. Backends log their own failures.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-process store. Clones share the same backing map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    map: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.map.borrow_mut().remove(key);
    }
}

/// Load a JSON record. Missing gives `None`; corrupt gives `None` and a warning.
pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Corrupt record {}, using default: {}", key, e);
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(storage: &mut dyn Storage, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => storage.set(key, &json),
        Err(e) => log::warn!("Failed to encode {}: {}", key, e),
    }
}

/// Load a scalar stored as its decimal text
pub fn load_scalar<T: FromStr>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Corrupt record {} ({:?}), using default", key, raw);
            None
        }
    }
}

pub fn save_scalar<T: Display>(storage: &mut dyn Storage, key: &str, value: T) {
    storage.set(key, &value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_memory_clones_share_data() {
        let mut a = MemoryStorage::new();
        let b = a.clone();
        a.set("k", "v");
        assert_eq!(b.get("k").as_deref(), Some("v"));
        a.remove("k");
        assert!(b.is_empty());
    }

    #[test]
    fn test_json_round_trip_and_corruption() {
        let mut storage = MemoryStorage::new();
        let ids: BTreeSet<String> = ["c_mini".to_string()].into();
        save_json(&mut storage, keys::UNLOCKS, &ids);
        assert_eq!(load_json::<BTreeSet<String>>(&storage, keys::UNLOCKS), Some(ids));

        storage.set(keys::UNLOCKS, "{not json");
        assert_eq!(load_json::<BTreeSet<String>>(&storage, keys::UNLOCKS), None);
        assert_eq!(load_json::<BTreeSet<String>>(&storage, keys::CONFIGS), None);
    }

    #[test]
    fn test_scalars_are_decimal_text() {
        let mut storage = MemoryStorage::new();
        save_scalar(&mut storage, keys::CREDITS, 1250u64);
        assert_eq!(storage.get(keys::CREDITS).as_deref(), Some("1250"));
        assert_eq!(load_scalar::<u64>(&storage, keys::CREDITS), Some(1250));

        storage.set(keys::GEMS, "-4");
        assert_eq!(load_scalar::<u64>(&storage, keys::GEMS), None);
    }
}
