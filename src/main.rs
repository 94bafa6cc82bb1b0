use bevy::{
    pbr::DirectionalLightShadowMap,
    prelude::*
};
use bevy_rapier3d::prelude::*;

mod config;
mod game;
mod level;
mod menu;
mod restore;
mod road_mesh;
mod save_game;
mod vehicle;

#[cfg(target_arch = "wasm32")]
mod windowmailer;

use config::{load_config, GameConfig};
use game::{AppState, Game};
use level::*;
use menu::*;
use restore::restore_player_system;
use save_game::SaveGameStore;
use vehicle::*;

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    let default_catalog_state = CatalogLoadingState::Loaded;
    #[cfg(target_arch = "wasm32")]
    let default_catalog_state = CatalogLoadingState::Loading;

    App::new()
        .init_resource::<Game>()
        .init_resource::<LevelCatalog>()
        .init_resource::<ActiveLevel>()
        .insert_resource(ClearColor(Color::rgb(0.1, 0.1, 0.1)))
        .insert_resource(DirectionalLightShadowMap { size: 2048 })
        .insert_resource(AmbientLight {
            color: Color::rgb(0.6, 0.4, 0.5),
            brightness: 0.6,
        })
        .add_state(AppState::MainMenu)
        .add_state(default_catalog_state)
        .add_event::<LoadLevel>()
        .add_event::<MenuAction>()
        .add_plugins(DefaultPlugins)
        .add_plugin(RapierPhysicsPlugin::<NoUserData>::default())
        .add_startup_system_to_stage(StartupStage::PreStartup, load_config)
        .add_startup_system(setup_camera)
        .add_startup_system(setup_save_store)
        .add_startup_system(setup_player_template)
        .add_startup_system(load_level_catalog)
        .add_startup_system(setup_window_size)
        .add_system_set(
            SystemSet::on_update(CatalogLoadingState::Loading)
                .with_system(catalog_load_check)
        )
        .add_system(button_system)
        .add_system(pause_key_system)
        .add_system(menu_action_system.before(LevelSystem::Load))
        .add_system(level_loading_system.label(LevelSystem::Load))
        .add_system(restore_player_system.after(LevelSystem::Load))
        .add_system_to_stage(CoreStage::PostUpdate, level_readiness_system)
        .add_system_set(
            SystemSet::on_enter(AppState::MainMenu)
                .with_system(unload_level)
                .with_system(setup_main_menu)
        )
        .add_system_set(SystemSet::on_exit(AppState::MainMenu).with_system(despawn_with::<MainMenuRoot>))
        .add_system_set(SystemSet::on_enter(AppState::InGame).with_system(setup_hud))
        .add_system_set(SystemSet::on_exit(AppState::InGame).with_system(despawn_with::<HudRoot>))
        .add_system_set(
            SystemSet::on_update(AppState::InGame)
                .with_system(vehicle_input_system)
                .with_system(camera_target_car_system.label(CameraSystem::Target))
                .with_system(camera_follow_system.label(CameraSystem::Follow).after(CameraSystem::Target))
                .with_system(finish_line_system)
        )
        .add_system_set(
            SystemSet::on_enter(AppState::Paused)
                .with_system(setup_pause_menu)
                .with_system(pause_physics)
        )
        .add_system_set(
            SystemSet::on_exit(AppState::Paused)
                .with_system(despawn_with::<PauseMenuRoot>)
                .with_system(resume_physics)
        )
        .run();
}

fn setup_save_store(mut commands: Commands, config: Res<GameConfig>) {
    let store = SaveGameStore::for_platform(&config.save_file_name);
    info!("Save slot: {}", store.location());
    commands.insert_resource(store);
}

#[cfg(target_arch = "wasm32")]
fn setup_window_size(mut windows: ResMut<Windows>) {
    let window = match windows.get_primary_mut() {
        Some(window) => window,
        _ => {
            return;
        }
    };
    let wasm_window = match web_sys::window() {
        Some(wasm_window) => wasm_window,
        _ => {
            return;
        }
    };
    let size = (
        wasm_window.inner_width().ok().and_then(|width| width.as_f64()),
        wasm_window.inner_height().ok().and_then(|height| height.as_f64()),
    );

    if let (Some(width), Some(height)) = size {
        window.set_resolution(width as f32, height as f32);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn setup_window_size() {
}
