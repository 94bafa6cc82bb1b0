//! Main menu, in-game HUD and pause menu.
//!
//! Every button carries a `MenuAction`. Clicking sends it as an event and
//! `menu_action_system` is the only place that acts on it.

use bevy::{app::AppExit, prelude::*};
use bevy_rapier3d::prelude::RapierConfiguration;

use crate::{
    config::GameConfig,
    game::{AppState, Game},
    level::{ActiveLevel, LevelCatalog, LoadLevel},
    restore::PendingRestore,
    save_game::SaveGameStore,
    vehicle::PlayerCar,
};

const NORMAL_BUTTON: Color = Color::rgb(0.15, 0.15, 0.15);
const HOVERED_BUTTON: Color = Color::rgb(0.25, 0.25, 0.25);
const PRESSED_BUTTON: Color = Color::rgb(0.35, 0.75, 0.35);
const TEXT_COLOR: Color = Color::rgb(0.9, 0.9, 0.9);

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Play,
    Load,
    Save,
    Resume,
    Restart,
    Exit,
    /// Open the pause menu.
    Menu,
}

impl MenuAction {
    fn label(self) -> &'static str {
        match self {
            MenuAction::Play => "Play",
            MenuAction::Load => "Load",
            MenuAction::Save => "Save",
            MenuAction::Resume => "Resume",
            MenuAction::Restart => "Restart",
            MenuAction::Exit => "Exit",
            MenuAction::Menu => "Menu",
        }
    }
}

/// State reached by `action` from `current`, if it changes state at all.
/// Play and Load only get here once a level has actually been requested.
pub fn next_state(current: AppState, action: MenuAction) -> Option<AppState> {
    match (current, action) {
        (AppState::MainMenu, MenuAction::Play | MenuAction::Load) => Some(AppState::InGame),
        (AppState::InGame, MenuAction::Menu) => Some(AppState::Paused),
        (AppState::Paused, MenuAction::Resume | MenuAction::Load) => Some(AppState::InGame),
        (AppState::InGame | AppState::Paused, MenuAction::Restart) => Some(AppState::MainMenu),
        _ => None,
    }
}

#[derive(Component)]
pub struct MainMenuRoot;

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct PauseMenuRoot;

fn root_node() -> NodeBundle {
    NodeBundle {
        style: Style {
            size: Size::new(Val::Percent(100.0), Val::Percent(100.0)),
            flex_direction: FlexDirection::ColumnReverse,
            justify_content: JustifyContent::Center,
            align_items: AlignItems::Center,
            ..default()
        },
        color: Color::NONE.into(),
        ..default()
    }
}

fn spawn_button(parent: &mut ChildBuilder, font: &Handle<Font>, action: MenuAction) {
    parent
        .spawn_bundle(ButtonBundle {
            style: Style {
                size: Size::new(Val::Px(220.0), Val::Px(56.0)),
                margin: UiRect::all(Val::Px(8.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            color: NORMAL_BUTTON.into(),
            ..default()
        })
        .insert(action)
        .with_children(|button| {
            button.spawn_bundle(TextBundle::from_section(
                action.label(),
                TextStyle { font: font.clone(), font_size: 32.0, color: TEXT_COLOR },
            ));
        });
}

fn spawn_title(parent: &mut ChildBuilder, font: &Handle<Font>, title: &str) {
    let mut text = TextBundle::from_section(title, TextStyle { font: font.clone(), font_size: 56.0, color: TEXT_COLOR });
    text.style.margin = UiRect::all(Val::Px(24.0));
    parent.spawn_bundle(text);
}

pub fn setup_main_menu(mut commands: Commands, asset_server: Res<AssetServer>, config: Res<GameConfig>) {
    let font: Handle<Font> = asset_server.load(config.ui_font.as_str());
    commands
        .spawn_bundle(root_node())
        .insert(MainMenuRoot)
        .with_children(|parent| {
            spawn_title(parent, &font, "Roadtrip");
            for action in [MenuAction::Play, MenuAction::Load, MenuAction::Exit] {
                spawn_button(parent, &font, action);
            }
        });
}

pub fn setup_hud(mut commands: Commands, asset_server: Res<AssetServer>, config: Res<GameConfig>) {
    let font: Handle<Font> = asset_server.load(config.ui_font.as_str());
    commands
        .spawn_bundle(NodeBundle {
            style: Style {
                position_type: PositionType::Absolute,
                position: UiRect { top: Val::Px(12.0), right: Val::Px(12.0), ..default() },
                ..default()
            },
            color: Color::NONE.into(),
            ..default()
        })
        .insert(HudRoot)
        .with_children(|parent| spawn_button(parent, &font, MenuAction::Menu));
}

pub fn setup_pause_menu(mut commands: Commands, asset_server: Res<AssetServer>, config: Res<GameConfig>) {
    let font: Handle<Font> = asset_server.load(config.ui_font.as_str());
    commands
        .spawn_bundle(NodeBundle { color: Color::rgba(0.0, 0.0, 0.0, 0.6).into(), ..root_node() })
        .insert(PauseMenuRoot)
        .with_children(|parent| {
            spawn_title(parent, &font, "Paused");
            for action in [
                MenuAction::Resume,
                MenuAction::Save,
                MenuAction::Load,
                MenuAction::Restart,
                MenuAction::Exit,
            ] {
                spawn_button(parent, &font, action);
            }
        });
}

pub fn despawn_with<T: Component>(mut commands: Commands, roots: Query<Entity, With<T>>) {
    for entity in roots.iter() {
        commands.entity(entity).despawn_recursive();
    }
}

pub fn pause_physics(mut rapier_config: ResMut<RapierConfiguration>) {
    rapier_config.physics_pipeline_active = false;
}

pub fn resume_physics(mut rapier_config: ResMut<RapierConfiguration>) {
    rapier_config.physics_pipeline_active = true;
}

pub fn button_system(
    mut buttons: Query<(&Interaction, &MenuAction, &mut UiColor), (Changed<Interaction>, With<Button>)>,
    mut actions: EventWriter<MenuAction>,
) {
    for (interaction, action, mut color) in buttons.iter_mut() {
        match *interaction {
            Interaction::Clicked => {
                *color = PRESSED_BUTTON.into();
                actions.send(*action);
            }
            Interaction::Hovered => *color = HOVERED_BUTTON.into(),
            Interaction::None => *color = NORMAL_BUTTON.into(),
        }
    }
}

/// Escape opens and closes the pause menu.
pub fn pause_key_system(
    keyboard_input: Res<Input<KeyCode>>,
    state: Res<State<AppState>>,
    mut actions: EventWriter<MenuAction>,
) {
    if !keyboard_input.just_pressed(KeyCode::Escape) {
        return;
    }
    match state.current() {
        AppState::InGame => actions.send(MenuAction::Menu),
        AppState::Paused => actions.send(MenuAction::Resume),
        AppState::MainMenu => {}
    }
}

pub fn menu_action_system(
    mut commands: Commands,
    mut actions: EventReader<MenuAction>,
    mut state: ResMut<State<AppState>>,
    store: Res<SaveGameStore>,
    catalog: Res<LevelCatalog>,
    active: Res<ActiveLevel>,
    config: Res<GameConfig>,
    game: Res<Game>,
    cars: Query<&Transform, With<PlayerCar>>,
    mut load_level: EventWriter<LoadLevel>,
    mut app_exit: EventWriter<AppExit>,
) {
    for action in actions.iter() {
        let proceed = match action {
            MenuAction::Play => match catalog.first() {
                Some(level) => {
                    commands.remove_resource::<PendingRestore>();
                    load_level.send(LoadLevel::new(&level.name));
                    true
                }
                None => {
                    warn!("No levels to play");
                    false
                }
            },
            MenuAction::Load => match store.load_record() {
                Some(record) if catalog.find(&record.level_name).is_some() => {
                    info!("Loading save for level {}", record.level_name);
                    load_level.send(LoadLevel::new(&record.level_name));
                    commands.insert_resource(PendingRestore::new(
                        &record.level_name,
                        record.player_position.into(),
                        active.generation,
                        config.restore_fallback_delay(),
                    ));
                    true
                }
                Some(record) => {
                    warn!("Saved level {} does not exist", record.level_name);
                    false
                }
                None => false,
            },
            MenuAction::Save => {
                let level_id = active.current_level_id().unwrap_or_default();
                let locate_player = || {
                    game.player_car
                        .and_then(|car| cars.get(car).ok())
                        .map(|transform| transform.translation)
                };
                match store.save(level_id, locate_player) {
                    Ok(record) => info!(
                        "Game saved at level {} with position {}",
                        record.level_name,
                        Vec3::from(record.player_position)
                    ),
                    Err(err) => warn!("{}", err),
                }
                true
            }
            MenuAction::Restart => {
                commands.remove_resource::<PendingRestore>();
                true
            }
            MenuAction::Exit => {
                info!("Game is exiting");
                app_exit.send(AppExit);
                false
            }
            MenuAction::Resume | MenuAction::Menu => true,
        };

        if !proceed {
            continue;
        }
        if let Some(next) = next_state(*state.current(), *action) {
            if let Err(err) = state.set(next) {
                warn!("Ignoring {:?}: {:?}", action, err);
            }
        }
    }
}
