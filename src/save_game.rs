//! Single-slot save game.
//!
//! A save is the level the player was on and where their car was. It is
//! stored as one small JSON document and every save replaces the previous one.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use std::{fs, io, path::PathBuf};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("player not found, cannot save position")]
    PlayerNotFound,
    #[error("no active level to save")]
    NoActiveLevel,
    #[error("player position {0} cannot be saved")]
    InvalidPosition(Vec3),
    #[error("no save file found at {0}")]
    NoSaveFound(String),
    #[error("save at {location} is unusable: {reason}")]
    CorruptSave { location: String, reason: String },
    #[error("could not resume: no player could be placed in the level")]
    PlayerSpawnUnavailable,
    #[error("save slot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode save record: {0}")]
    Encode(String),
    #[cfg(target_arch = "wasm32")]
    #[error("browser storage unavailable: {0}")]
    Storage(String),
}

impl SaveError {
    /// Both of these mean "there is nothing to resume" for the caller.
    pub fn is_missing_save(&self) -> bool {
        matches!(self, SaveError::NoSaveFound(_) | SaveError::CorruptSave { .. })
    }
}

/// On-disk position. Kept separate from `Vec3` so the file always holds
/// `{"x":..,"y":..,"z":..}` instead of a bare array.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Position { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Position> for Vec3 {
    fn from(p: Position) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    #[serde(default)]
    pub level_name: String,
    #[serde(default)]
    pub player_position: Position,
}

/// Durable storage behind the save slot.
pub trait SaveSlot: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    fn read(&self) -> Result<Option<String>, SaveError>;
    fn write(&self, contents: &str) -> Result<(), SaveError>;
    /// Human readable location, used in logs.
    fn location(&self) -> String;
}

#[cfg(not(target_arch = "wasm32"))]
pub struct FileSlot {
    path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSlot { path: path.into() }
    }

    /// `<data dir>/<file_name>`, or the working directory if the platform
    /// has no per-user data location.
    pub fn in_data_dir(file_name: &str) -> Self {
        let dir = directories::ProjectDirs::from("com", "roadtrip", "Roadtrip")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        FileSlot::new(dir.join(file_name))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SaveSlot for FileSlot {
    fn read(&self) -> Result<Option<String>, SaveError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, contents: &str) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Write next to the slot, then swap it in.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, contents)?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(target_arch = "wasm32")]
pub struct LocalStorageSlot {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageSlot {
    pub fn new(key: &str) -> Self {
        LocalStorageSlot { key: key.to_string() }
    }

    fn storage(&self) -> Result<web_sys::Storage, SaveError> {
        web_sys::window()
            .and_then(|window| window.local_storage().ok())
            .flatten()
            .ok_or_else(|| SaveError::Storage(String::from("localStorage is not available")))
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveSlot for LocalStorageSlot {
    fn read(&self) -> Result<Option<String>, SaveError> {
        self.storage()?
            .get_item(&self.key)
            .map_err(|err| SaveError::Storage(format!("{:?}", err)))
    }

    fn write(&self, contents: &str) -> Result<(), SaveError> {
        self.storage()?
            .set_item(&self.key, contents)
            .map_err(|err| SaveError::Storage(format!("{:?}", err)))
    }

    fn location(&self) -> String {
        format!("localStorage[{}]", self.key)
    }
}

pub struct SaveGameStore {
    slot: Box<dyn SaveSlot>,
}

impl SaveGameStore {
    pub fn new(slot: impl SaveSlot + 'static) -> Self {
        SaveGameStore { slot: Box::new(slot) }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn for_platform(file_name: &str) -> Self {
        SaveGameStore::new(FileSlot::in_data_dir(file_name))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn for_platform(file_name: &str) -> Self {
        SaveGameStore::new(LocalStorageSlot::new(file_name))
    }

    pub fn location(&self) -> String {
        self.slot.location()
    }

    /// Saves `level_id` together with the position returned by
    /// `locate_player`. Nothing is written unless both are present.
    pub fn save<F>(&self, level_id: &str, locate_player: F) -> Result<SaveRecord, SaveError>
    where
        F: FnOnce() -> Option<Vec3>,
    {
        let position = locate_player().ok_or(SaveError::PlayerNotFound)?;
        if level_id.is_empty() {
            return Err(SaveError::NoActiveLevel);
        }
        if !position.is_finite() {
            return Err(SaveError::InvalidPosition(position));
        }

        let record = SaveRecord {
            level_name: level_id.to_string(),
            player_position: position.into(),
        };
        let json = serde_json::to_string(&record).map_err(|err| SaveError::Encode(err.to_string()))?;
        self.slot.write(&json)?;

        Ok(record)
    }

    pub fn load(&self) -> Result<SaveRecord, SaveError> {
        let json = match self.slot.read()? {
            Some(json) => json,
            None => return Err(SaveError::NoSaveFound(self.location())),
        };

        let record: SaveRecord = serde_json::from_str(&json).map_err(|err| SaveError::CorruptSave {
            location: self.location(),
            reason: err.to_string(),
        })?;

        if record.level_name.is_empty() {
            return Err(SaveError::CorruptSave {
                location: self.location(),
                reason: String::from("no saved level"),
            });
        }

        Ok(record)
    }

    /// Like `load`, but a missing or unusable save is only logged.
    pub fn load_record(&self) -> Option<SaveRecord> {
        match self.load() {
            Ok(record) => Some(record),
            Err(SaveError::NoSaveFound(location)) => {
                info!("No save file found at {}", location);
                None
            }
            Err(err @ SaveError::CorruptSave { .. }) => {
                warn!("Ignoring save: {}", err);
                None
            }
            Err(err) => {
                error!("Could not read save: {}", err);
                None
            }
        }
    }
}
