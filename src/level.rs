//! Level host: the catalog of levels, loading and unloading them, and
//! advancing when the car reaches the finish line.

use bevy::{asset::LoadState, prelude::*};
use bevy_rapier3d::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    game::{AppState, Game},
    road_mesh::{build_road_mesh, road_material, Segment},
    vehicle::{spawn_player_car, PlayerCar, PlayerTemplate},
};

#[cfg(target_arch = "wasm32")]
use crate::windowmailer;

#[allow(dead_code)]
const LEVEL_CATALOG_PATH: &str = "assets/levels.json";

// The code here is not used in native builds
#[allow(dead_code)]
const LEVEL_CATALOG_CHANNEL: &str = "LEVEL_CATALOG_DATA";

const ROAD_HALF_WIDTH: f32 = 1.5;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("could not parse level catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level catalog has no levels")]
    NoLevels,
    #[error("level #{0} has no name")]
    UnnamedLevel(usize),
    #[error("level {0} is defined twice")]
    DuplicateLevel(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum CatalogLoadingState {
    Loading,
    Loaded,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FinishZone {
    pub center: Vec3,
    pub half_extents: Vec3,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LevelDefinition {
    pub name: String,
    /// Where the level places the car. Levels without one leave placing
    /// the car to whoever loaded them.
    #[serde(default)]
    pub spawn: Option<Vec3>,
    pub finish: FinishZone,
    #[serde(default)]
    pub road: Vec<Segment>,
}

/// Levels in play order.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LevelCatalog {
    pub levels: Vec<LevelDefinition>,
}

impl LevelCatalog {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let catalog: LevelCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn read(path: &str) -> Result<Self, LevelError> {
        let json = std::fs::read_to_string(path)
            .map_err(|source| LevelError::Read { path: path.to_string(), source })?;
        LevelCatalog::from_json(&json)
    }

    fn validate(&self) -> Result<(), LevelError> {
        if self.levels.is_empty() {
            return Err(LevelError::NoLevels);
        }
        for (index, level) in self.levels.iter().enumerate() {
            if level.name.is_empty() {
                return Err(LevelError::UnnamedLevel(index));
            }
            if self.levels[..index].iter().any(|other| other.name == level.name) {
                return Err(LevelError::DuplicateLevel(level.name.clone()));
            }
        }
        Ok(())
    }

    pub fn first(&self) -> Option<&LevelDefinition> {
        self.levels.first()
    }

    pub fn find(&self, name: &str) -> Option<(usize, &LevelDefinition)> {
        self.levels.iter().enumerate().find(|(_, level)| level.name == name)
    }

    pub fn next_after(&self, index: usize) -> Option<&LevelDefinition> {
        self.levels.get(index + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    Loading,
    /// Level entities exist and the player model is loaded.
    Ready,
}

#[derive(Debug, Clone)]
pub struct ActiveLevel {
    pub name: Option<String>,
    pub index: Option<usize>,
    /// Bumped on every load and unload.
    pub generation: u64,
    pub status: LevelStatus,
}

impl Default for ActiveLevel {
    fn default() -> Self {
        ActiveLevel { name: None, index: None, generation: 0, status: LevelStatus::Ready }
    }
}

impl ActiveLevel {
    pub fn current_level_id(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn begin(&mut self, name: &str, index: usize) {
        self.name = Some(name.to_string());
        self.index = Some(index);
        self.generation += 1;
        self.status = LevelStatus::Loading;
    }

    fn clear(&mut self) {
        self.name = None;
        self.index = None;
        self.generation += 1;
        self.status = LevelStatus::Ready;
    }
}

/// Request to replace whatever level is loaded with the named one.
#[derive(Debug, Clone)]
pub struct LoadLevel {
    pub name: String,
}

impl LoadLevel {
    pub fn new(name: &str) -> Self {
        LoadLevel { name: name.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, SystemLabel)]
pub enum LevelSystem {
    Load,
}

/// Everything despawned when the level goes away.
#[derive(Component)]
pub struct LevelEntity;

#[derive(Component)]
pub struct FinishLine;

// The code here is not used in native builds
#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str) -> Result<String, wasm_bindgen::JsValue> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or_else(|| wasm_bindgen::JsValue::from("no window"))?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url)).await?.dyn_into()?;
    let text = JsFuture::from(response.text()?).await?;
    text.as_string().ok_or_else(|| wasm_bindgen::JsValue::from("response is not text"))
}

pub fn load_level_catalog(mut _commands: Commands) {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            match fetch_text(LEVEL_CATALOG_PATH).await {
                Ok(json) => windowmailer::send_message(LEVEL_CATALOG_CHANNEL, json),
                Err(err) => error!("Could not fetch {}: {:?}", LEVEL_CATALOG_PATH, err),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        match LevelCatalog::read(LEVEL_CATALOG_PATH) {
            Ok(catalog) => {
                info!("Loaded {} levels from {}", catalog.levels.len(), LEVEL_CATALOG_PATH);
                _commands.insert_resource(catalog);
            }
            Err(err) => error!("{}", err),
        }
    }
}

#[allow(unused_mut, unused_variables)]
// Waits for the fetched catalog
pub fn catalog_load_check(
    mut commands: Commands,
    mut catalog_loading_state: ResMut<State<CatalogLoadingState>>,
) {
    #[cfg(target_arch = "wasm32")]
    {
        let json = match windowmailer::read_message(LEVEL_CATALOG_CHANNEL) {
            Some(json) => json,
            None => {
                return;
            }
        };

        match LevelCatalog::from_json(&json) {
            Ok(catalog) => {
                info!("Loaded {} levels", catalog.levels.len());
                commands.insert_resource(catalog);
            }
            Err(err) => error!("{}", err),
        }

        if let Err(err) = catalog_loading_state.set(CatalogLoadingState::Loaded) {
            warn!("{:?}", err);
        }
    }
}

fn despawn_level(commands: &mut Commands, level_entities: &Query<Entity, With<LevelEntity>>) {
    for entity in level_entities.iter() {
        commands.entity(entity).despawn_recursive();
    }
}

fn spawn_level(
    commands: &mut Commands,
    level: &LevelDefinition,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    // Ground
    commands
        .spawn_bundle(PbrBundle {
            mesh: meshes.add(Mesh::from(shape::Plane { size: 200.0 })),
            material: materials.add(Color::rgb(0.25, 0.3, 0.25).into()),
            ..default()
        })
        .insert(Collider::cuboid(100.0, 0.1, 100.0))
        .insert(LevelEntity);

    commands
        .spawn_bundle(PbrBundle {
            mesh: meshes.add(build_road_mesh(&level.road, ROAD_HALF_WIDTH)),
            material: materials.add(road_material()),
            transform: Transform::from_xyz(0.0, 0.01, 0.0),
            ..default()
        })
        .insert(LevelEntity);

    let finish = &level.finish;
    commands
        .spawn()
        .insert(Collider::cuboid(finish.half_extents.x, finish.half_extents.y, finish.half_extents.z))
        .insert(Sensor)
        .insert(ActiveEvents::COLLISION_EVENTS)
        .insert_bundle(TransformBundle::from(Transform::from_translation(finish.center)))
        .insert(FinishLine)
        .insert(LevelEntity);

    // Stripe on the ground marking the finish
    commands
        .spawn_bundle(PbrBundle {
            mesh: meshes.add(Mesh::from(shape::Box::new(
                finish.half_extents.x * 2.0,
                0.05,
                finish.half_extents.z * 2.0,
            ))),
            material: materials.add(Color::rgb(0.9, 0.9, 0.9).into()),
            transform: Transform::from_xyz(finish.center.x, 0.02, finish.center.z),
            ..default()
        })
        .insert(LevelEntity);
}

pub fn level_loading_system(
    mut commands: Commands,
    mut requests: EventReader<LoadLevel>,
    catalog: Res<LevelCatalog>,
    mut active: ResMut<ActiveLevel>,
    mut game: ResMut<Game>,
    level_entities: Query<Entity, With<LevelEntity>>,
    template: Option<Res<PlayerTemplate>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Only the latest request matters.
    let request = match requests.iter().last() {
        Some(request) => request.clone(),
        None => {
            return;
        }
    };

    let (index, level) = match catalog.find(&request.name) {
        Some(found) => found,
        None => {
            error!("Unknown level {}", request.name);
            return;
        }
    };

    despawn_level(&mut commands, &level_entities);
    spawn_level(&mut commands, level, &mut meshes, &mut materials);

    game.player_car = match (level.spawn, &template) {
        (Some(spawn), Some(template)) => Some(spawn_player_car(&mut commands, template, spawn)),
        (Some(_), None) => {
            warn!("Level {} has a spawn point but no player model is configured", level.name);
            None
        }
        (None, _) => None,
    };

    active.begin(&level.name, index);
    info!("Loading level {}", level.name);
}

/// Runs after `level_loading_system`'s commands have been applied.
pub fn level_readiness_system(
    mut active: ResMut<ActiveLevel>,
    template: Option<Res<PlayerTemplate>>,
    asset_server: Res<AssetServer>,
) {
    if active.name.is_none() || active.status == LevelStatus::Ready {
        return;
    }

    let ready = match &template {
        Some(template) => match asset_server.get_load_state(template.scene.id) {
            LoadState::Loaded => true,
            LoadState::Failed => {
                warn!("Player model failed to load");
                true
            }
            _ => false,
        },
        None => true,
    };

    if ready {
        active.status = LevelStatus::Ready;
        info!("Level {} ready", active.name.as_deref().unwrap_or_default());
    }
}

pub fn unload_level(
    mut commands: Commands,
    level_entities: Query<Entity, With<LevelEntity>>,
    mut active: ResMut<ActiveLevel>,
    mut game: ResMut<Game>,
) {
    despawn_level(&mut commands, &level_entities);
    game.player_car = None;
    if active.name.is_some() {
        info!("Unloaded level {}", active.name.as_deref().unwrap_or_default());
    }
    active.clear();
}

fn is_finish_crossing(
    finish_lines: &Query<(), With<FinishLine>>,
    players: &Query<(), With<PlayerCar>>,
    a: Entity,
    b: Entity,
) -> bool {
    (finish_lines.get(a).is_ok() && players.get(b).is_ok())
        || (finish_lines.get(b).is_ok() && players.get(a).is_ok())
}

pub fn finish_line_system(
    mut collisions: EventReader<CollisionEvent>,
    finish_lines: Query<(), With<FinishLine>>,
    players: Query<(), With<PlayerCar>>,
    catalog: Res<LevelCatalog>,
    active: Res<ActiveLevel>,
    mut load_level: EventWriter<LoadLevel>,
    mut state: ResMut<State<AppState>>,
) {
    let crossings = collisions
        .iter()
        .filter(|event| match event {
            CollisionEvent::Started(a, b, _) => is_finish_crossing(&finish_lines, &players, *a, *b),
            CollisionEvent::Stopped(..) => false,
        })
        .count();

    if crossings == 0 || active.status != LevelStatus::Ready {
        return;
    }

    let index = match active.index {
        Some(index) => index,
        None => {
            return;
        }
    };

    match catalog.next_after(index) {
        Some(next) => {
            info!("Level {} complete", active.name.as_deref().unwrap_or_default());
            load_level.send(LoadLevel::new(&next.name));
        }
        None => {
            info!("All levels complete");
            if let Err(err) = state.set(AppState::MainMenu) {
                warn!("{:?}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::{app::AppExit, asset::AssetPlugin};
    use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

    use crate::{
        config::GameConfig,
        menu::{menu_action_system, MenuAction},
        restore::{restore_player_system, PendingRestore},
        save_game::{FileSlot, SaveGameStore},
    };

    const CATALOG: &str = r#"{
        "levels": [
            { "name": "Level1", "spawn": [0.0, 1.0, 0.0],
              "finish": { "center": [0.0, 1.0, -60.0], "half_extents": [6.0, 3.0, 1.0] },
              "road": [ { "a": [0.0, 0.0, 0.0], "b": [0.0, 0.0, -60.0], "up": [0.0, 1.0, 0.0] } ] },
            { "name": "Level2",
              "finish": { "center": [40.0, 1.0, -40.0], "half_extents": [1.0, 3.0, 6.0] } }
        ]
    }"#;

    #[test]
    fn parses_catalog_in_order() {
        let catalog = LevelCatalog::from_json(CATALOG).unwrap();

        assert_eq!(catalog.first().unwrap().name, "Level1");
        assert_eq!(catalog.first().unwrap().spawn, Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(catalog.first().unwrap().road.len(), 1);

        let (index, level2) = catalog.find("Level2").unwrap();
        assert_eq!(index, 1);
        assert!(level2.spawn.is_none());
        assert!(level2.road.is_empty());
        assert!(catalog.find("Level9").is_none());
    }

    #[test]
    fn shipped_catalog_is_valid() {
        let catalog = LevelCatalog::read(LEVEL_CATALOG_PATH).unwrap();
        assert_eq!(catalog.first().unwrap().name, "Level1");
        assert!(catalog.levels.iter().all(|level| level.spawn.is_some()));
    }

    #[test]
    fn next_level_follows_catalog_order() {
        let catalog = LevelCatalog::from_json(CATALOG).unwrap();

        assert_eq!(catalog.next_after(0).unwrap().name, "Level2");
        assert!(catalog.next_after(1).is_none());
    }

    #[test]
    fn rejects_invalid_catalogs() {
        assert!(matches!(LevelCatalog::from_json(r#"{ "levels": [] }"#), Err(LevelError::NoLevels)));
        assert!(matches!(LevelCatalog::from_json("[1, 2"), Err(LevelError::Parse(_))));

        let finish = r#""finish": { "center": [0.0, 0.0, 0.0], "half_extents": [1.0, 1.0, 1.0] }"#;
        let unnamed = format!(r#"{{ "levels": [ {{ "name": "", {} }} ] }}"#, finish);
        assert!(matches!(LevelCatalog::from_json(&unnamed), Err(LevelError::UnnamedLevel(0))));

        let twice = format!(
            r#"{{ "levels": [ {{ "name": "A", {0} }}, {{ "name": "A", {0} }} ] }}"#,
            finish
        );
        match LevelCatalog::from_json(&twice) {
            Err(LevelError::DuplicateLevel(name)) => assert_eq!(name, "A"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn generation_advances_on_load_and_unload() {
        let mut active = ActiveLevel::default();
        assert_eq!(active.current_level_id(), None);

        active.begin("Level1", 0);
        assert_eq!(active.current_level_id(), Some("Level1"));
        assert_eq!(active.generation, 1);
        assert_eq!(active.status, LevelStatus::Loading);

        active.clear();
        assert_eq!(active.current_level_id(), None);
        assert_eq!(active.generation, 2);
    }

    fn level_app() -> App {
        let mut app = App::new();
        app.add_plugin(AssetPlugin)
            .add_asset::<Mesh>()
            .add_asset::<StandardMaterial>()
            .add_event::<LoadLevel>()
            .init_resource::<Game>()
            .init_resource::<ActiveLevel>()
            .insert_resource(LevelCatalog::from_json(CATALOG).unwrap());
        app
    }

    fn requested_levels(app: &App) -> Vec<String> {
        let requests = app.world.resource::<Events<LoadLevel>>();
        let mut reader = requests.get_reader();
        reader.iter(requests).map(|request| request.name.clone()).collect()
    }

    fn player_positions(app: &mut App) -> Vec<(Entity, Vec3)> {
        app.world
            .query_filtered::<(Entity, &Transform), With<PlayerCar>>()
            .iter(&app.world)
            .map(|(entity, transform)| (entity, transform.translation))
            .collect()
    }

    #[test]
    fn loading_a_level_replaces_the_previous_one() {
        let mut app = level_app();
        app.add_system(level_loading_system);

        app.world.resource_mut::<Events<LoadLevel>>().send(LoadLevel::new("Level1"));
        app.update();
        let first_level_entities = app
            .world
            .query_filtered::<Entity, With<LevelEntity>>()
            .iter(&app.world)
            .collect::<Vec<_>>();
        assert!(!first_level_entities.is_empty());
        assert_eq!(app.world.resource::<ActiveLevel>().current_level_id(), Some("Level1"));

        app.world.resource_mut::<Events<LoadLevel>>().send(LoadLevel::new("Level2"));
        app.update();
        let active = app.world.resource::<ActiveLevel>();
        assert_eq!(active.current_level_id(), Some("Level2"));
        assert_eq!(active.index, Some(1));
        assert_eq!(active.generation, 2);
        for entity in first_level_entities {
            assert!(app.world.get_entity(entity).is_none());
        }
        assert_eq!(
            app.world.query_filtered::<Entity, With<FinishLine>>().iter(&app.world).count(),
            1
        );
    }

    #[test]
    fn level_is_ready_once_spawned_without_player_model() {
        let mut app = level_app();
        app.add_system(level_loading_system)
            .add_system_to_stage(CoreStage::PostUpdate, level_readiness_system);

        app.world.resource_mut::<Events<LoadLevel>>().send(LoadLevel::new("Level2"));
        app.update();

        let active = app.world.resource::<ActiveLevel>();
        assert_eq!(active.current_level_id(), Some("Level2"));
        assert_eq!(active.status, LevelStatus::Ready);
    }

    #[test]
    fn readiness_waits_for_player_model() {
        let mut app = level_app();
        app.insert_resource(ActiveLevel {
            name: Some(String::from("Level1")),
            index: Some(0),
            generation: 1,
            status: LevelStatus::Loading,
        })
        .insert_resource(PlayerTemplate { scene: Handle::default() })
        .add_system(level_readiness_system);

        app.update();
        assert_eq!(app.world.resource::<ActiveLevel>().status, LevelStatus::Loading);

        app.world.remove_resource::<PlayerTemplate>();
        app.update();
        assert_eq!(app.world.resource::<ActiveLevel>().status, LevelStatus::Ready);
    }

    #[test]
    fn unloading_clears_the_level() {
        let mut app = level_app();
        app.insert_resource(ActiveLevel {
            name: Some(String::from("Level1")),
            index: Some(0),
            generation: 3,
            status: LevelStatus::Ready,
        })
        .add_system(unload_level);

        let car = app.world.spawn().insert(LevelEntity).insert(PlayerCar).id();
        app.world.spawn().insert(LevelEntity).insert(FinishLine);
        app.world.spawn().insert(LevelEntity);
        let camera = app.world.spawn().insert(Transform::default()).id();
        app.world.resource_mut::<Game>().player_car = Some(car);

        app.update();

        assert_eq!(app.world.query_filtered::<Entity, With<LevelEntity>>().iter(&app.world).count(), 0);
        assert!(app.world.get_entity(camera).is_some());
        assert_eq!(app.world.resource::<Game>().player_car, None);
        let active = app.world.resource::<ActiveLevel>();
        assert_eq!(active.current_level_id(), None);
        assert_eq!(active.index, None);
        assert_eq!(active.generation, 4);
    }

    fn finish_line_app(index: usize, status: LevelStatus) -> (App, Entity, Entity) {
        let mut app = App::new();
        app.add_event::<CollisionEvent>()
            .add_event::<LoadLevel>()
            .add_state(AppState::InGame)
            .insert_resource(LevelCatalog::from_json(CATALOG).unwrap())
            .insert_resource(ActiveLevel {
                name: Some(CATALOG_NAMES[index].to_string()),
                index: Some(index),
                generation: 1,
                status,
            })
            .add_system(finish_line_system);
        let finish = app.world.spawn().insert(FinishLine).id();
        let car = app.world.spawn().insert(PlayerCar).id();
        (app, finish, car)
    }

    const CATALOG_NAMES: [&str; 2] = ["Level1", "Level2"];

    fn cross(app: &mut App, a: Entity, b: Entity) {
        app.world
            .resource_mut::<Events<CollisionEvent>>()
            .send(CollisionEvent::Started(a, b, CollisionEventFlags::SENSOR));
        app.update();
        app.update();
    }

    #[test]
    fn crossing_finish_loads_next_level() {
        let (mut app, finish, car) = finish_line_app(0, LevelStatus::Ready);

        cross(&mut app, car, finish);

        assert_eq!(requested_levels(&app), vec![String::from("Level2")]);
        assert_eq!(*app.world.resource::<State<AppState>>().current(), AppState::InGame);
    }

    #[test]
    fn crossing_last_finish_returns_to_main_menu() {
        let (mut app, finish, car) = finish_line_app(1, LevelStatus::Ready);

        cross(&mut app, finish, car);

        assert!(requested_levels(&app).is_empty());
        assert_eq!(*app.world.resource::<State<AppState>>().current(), AppState::MainMenu);
    }

    #[test]
    fn finish_ignores_other_bodies_and_loading_levels() {
        let (mut app, finish, _) = finish_line_app(0, LevelStatus::Ready);
        let crate_box = app.world.spawn().id();
        cross(&mut app, crate_box, finish);
        assert!(requested_levels(&app).is_empty());

        let (mut app, finish, car) = finish_line_app(0, LevelStatus::Loading);
        cross(&mut app, car, finish);
        assert!(requested_levels(&app).is_empty());
    }

    #[test]
    fn saved_game_resumes_at_saved_position() {
        let dir = std::env::temp_dir().join("roadtrip_level_test_resume");
        let _ = std::fs::remove_dir_all(&dir);
        let save_path = dir.join("savefile.json");
        let saved_position = Vec3::new(3.5, 0.0, -7.25);
        let catalog = r#"{ "levels": [
            { "name": "Level1", "spawn": [0.0, 1.0, 0.0],
              "finish": { "center": [0.0, 1.0, -60.0], "half_extents": [6.0, 3.0, 1.0] } },
            { "name": "Level2", "spawn": [0.0, 1.0, 0.0],
              "finish": { "center": [40.0, 1.0, -40.0], "half_extents": [1.0, 3.0, 6.0] } }
        ] }"#;

        let mut app = level_app();
        app.add_event::<MenuAction>()
            .add_event::<AppExit>()
            .add_state(AppState::Paused)
            .insert_resource(Time::default())
            .insert_resource(LevelCatalog::from_json(catalog).unwrap())
            // The default handle never loads, so the car is placed by the fallback.
            .insert_resource(PlayerTemplate { scene: Handle::default() })
            .insert_resource(GameConfig { restore_fallback_delay_secs: 0.0, ..Default::default() })
            .insert_resource(SaveGameStore::new(FileSlot::new(&save_path)))
            .add_system(menu_action_system.before(LevelSystem::Load))
            .add_system(level_loading_system.label(LevelSystem::Load))
            .add_system(restore_player_system.after(LevelSystem::Load))
            .add_system_to_stage(CoreStage::PostUpdate, level_readiness_system);

        app.world.resource_mut::<Events<LoadLevel>>().send(LoadLevel::new("Level2"));
        app.update();
        let (car, _) = player_positions(&mut app)[0];
        app.world.get_mut::<Transform>(car).unwrap().translation = saved_position;

        app.world.resource_mut::<Events<MenuAction>>().send(MenuAction::Save);
        app.update();
        assert_eq!(
            std::fs::read_to_string(&save_path).unwrap(),
            r#"{"levelName":"Level2","playerPosition":{"x":3.5,"y":0.0,"z":-7.25}}"#
        );

        app.world.get_mut::<Transform>(car).unwrap().translation = Vec3::new(20.0, 1.0, 20.0);
        app.world.resource_mut::<Events<MenuAction>>().send(MenuAction::Load);
        for _ in 0..3 {
            app.update();
        }

        let players = player_positions(&mut app);
        assert_eq!(players.len(), 1);
        let (resumed_car, position) = players[0];
        assert_ne!(resumed_car, car);
        assert_eq!(position, saved_position);
        assert_eq!(app.world.resource::<Game>().player_car, Some(resumed_car));
        assert_eq!(app.world.resource::<ActiveLevel>().generation, 2);
        assert!(!app.world.contains_resource::<PendingRestore>());
        assert_eq!(*app.world.resource::<State<AppState>>().current(), AppState::InGame);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
