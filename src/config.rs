use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[allow(dead_code)]
const CONFIG_PATH: &str = "assets/config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("could not parse {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

/// Tunables, read once before startup. Any field left out of the file
/// keeps its default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub save_file_name: String,
    /// How long to wait for a level to report ready before placing the
    /// restored player anyway.
    pub restore_fallback_delay_secs: f32,
    pub player_model: String,
    pub ui_font: String,
    pub engine_force: f32,
    pub reverse_force: f32,
    pub steering_torque: f32,
    pub camera_follow_distance: f32,
    pub camera_follow_height: f32,
    /// Fraction of the remaining distance the camera covers each frame.
    pub camera_smoothing: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            save_file_name: String::from("savefile.json"),
            restore_fallback_delay_secs: 0.5,
            player_model: String::from("car_0001/model.glb#Scene0"),
            ui_font: String::from("fonts/FiraSans-Bold.ttf"),
            engine_force: 100.0,
            reverse_force: 40.0,
            steering_torque: 12.0,
            camera_follow_distance: 20.0,
            camera_follow_height: 5.0,
            camera_smoothing: 0.125,
        }
    }
}

impl GameConfig {
    pub fn from_json(path: &str, json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse { path: path.to_string(), source })
    }

    /// `Ok(None)` when the file does not exist.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn read(path: &str) -> Result<Option<Self>, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(json) => GameConfig::from_json(path, &json).map(Some),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Read { path: path.to_string(), source }),
        }
    }

    pub fn restore_fallback_delay(&self) -> Duration {
        Duration::from_secs_f32(self.restore_fallback_delay_secs.max(0.0))
    }
}

pub fn load_config(mut commands: Commands) {
    #[cfg(not(target_arch = "wasm32"))]
    let config = match GameConfig::read(CONFIG_PATH) {
        Ok(Some(config)) => {
            info!("Loaded configuration from {}", CONFIG_PATH);
            config
        }
        Ok(None) => GameConfig::default(),
        Err(err) => {
            warn!("{}, using defaults", err);
            GameConfig::default()
        }
    };
    #[cfg(target_arch = "wasm32")]
    let config = GameConfig::default();

    commands.insert_resource(config);
}
