//! Native file backend
//!
//! All keys live in one JSON object. Every write goes to `<path>.tmp` first and
//! is then renamed over the save, so a crash mid-write leaves the old save.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::Storage;
use crate::error::StorageError;

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    map: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open a save file, starting empty if it is missing or unreadable
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let map = match Self::read(&path) {
            Ok(map) => {
                log::info!("Loaded {} records from {}", map.len(), path.display());
                map
            }
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No save at {}, starting fresh", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                log::warn!("Unreadable save {}, starting fresh: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self { path, map }
    }

    fn read(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.map)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn flush(&self) {
        if let Err(e) = self.write() {
            log::warn!("Failed to write {}: {}", self.path.display(), e);
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.map.remove(key).is_some() {
            self.flush();
        }
    }
}
