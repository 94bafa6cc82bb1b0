use bevy::prelude::*;

use serde::{Serialize, Deserialize};

#[derive(Default, Serialize, Deserialize, Debug)]
pub struct CameraTarget {
    pub position: Option<Vec3>,
    pub up: Option<Vec3>,
    pub look_at: Option<Vec3>,
}

#[derive(Default)]
pub struct Game {
    /// The car the player drives. Set whenever a level spawns one or a
    /// restored save places one.
    pub player_car: Option<Entity>,
    pub camera_target: CameraTarget,
    pub camera: Option<Entity>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum AppState {
    MainMenu,
    InGame,
    /// Simulation frozen, pause menu shown.
    Paused,
}
