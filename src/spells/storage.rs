//! Persistence port for ability loadouts.
//!
//! The book never touches the filesystem itself; it serializes a
//! [`LoadoutSnapshot`] to RON and hands the text to a [`Storage`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use super::types::{SpellId, HOTBAR_SLOTS};

/// Key the ability book saves its loadout under.
pub const LOADOUT_KEY: &str = "spell_loadout";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize loadout: {0}")]
    Serialize(#[from] ron::Error),

    #[error("failed to parse stored loadout: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

/// Opaque key/value store.
pub trait Storage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// The persisted part of an ability book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadoutSnapshot {
    pub learned: Vec<SpellId>,
    pub hotbar: [Option<SpellId>; HOTBAR_SLOTS],
    #[serde(default)]
    pub active_slot: usize,
}

impl LoadoutSnapshot {
    pub fn to_ron(&self) -> Result<String, StorageError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn from_ron(contents: &str) -> Result<Self, StorageError> {
        Ok(ron::from_str(contents)?)
    }
}

/// In-process storage, mostly for tests and the headless runner.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.ron` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.ron", key)))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;
        fs::write(path, value)?;
        Ok(())
    }
}
