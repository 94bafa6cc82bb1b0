use bevy::{
    input::{keyboard::KeyCode, Input},
    prelude::*,
};
use bevy_rapier3d::prelude::*;

use crate::{config::GameConfig, game::Game, level::LevelEntity};

/// Marks the car the player drives. This is the tag used to find the
/// player; everything else holds on to the `Entity` in `Game`.
#[derive(Component)]
pub struct PlayerCar;

/// What a player car is spawned from.
pub struct PlayerTemplate {
    pub scene: Handle<Scene>,
}

pub fn setup_player_template(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    config: Res<GameConfig>,
) {
    commands.insert_resource(PlayerTemplate {
        scene: asset_server.load(config.player_model.as_str()),
    });
}

pub fn spawn_player_car(commands: &mut Commands, template: &PlayerTemplate, position: Vec3) -> Entity {
    commands
        .spawn_bundle(SceneBundle {
            scene: template.scene.clone(),
            transform: Transform::from_translation(position),
            ..Default::default()
        })
        .insert(PlayerCar)
        .insert(LevelEntity)
        .insert(RigidBody::Dynamic)
        .insert(Collider::cuboid(1.0, 1.0, 4.0))
        .insert(ColliderMassProperties::Density(0.04))
        .insert(Friction::coefficient(0.0))
        .insert(Damping { linear_damping: 0.8, angular_damping: 0.4 })
        .insert(Velocity::zero())
        .insert(ExternalForce {
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        })
        .id()
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DriveAxes {
    /// -1 (reverse) to 1 (forward)
    pub throttle: f32,
    /// -1 (left) to 1 (right)
    pub steer: f32,
}

fn axis(input: &Input<KeyCode>, negative: [KeyCode; 2], positive: [KeyCode; 2]) -> f32 {
    let mut value = 0.0;
    if negative.iter().any(|key| input.pressed(*key)) {
        value -= 1.0;
    }
    if positive.iter().any(|key| input.pressed(*key)) {
        value += 1.0;
    }
    value
}

pub fn read_drive_axes(input: &Input<KeyCode>) -> DriveAxes {
    DriveAxes {
        throttle: axis(input, [KeyCode::S, KeyCode::Down], [KeyCode::W, KeyCode::Up]),
        steer: axis(input, [KeyCode::A, KeyCode::Left], [KeyCode::D, KeyCode::Right]),
    }
}

pub fn vehicle_input_system(
    keyboard_input: Res<Input<KeyCode>>,
    config: Res<GameConfig>,
    game: Res<Game>,
    mut cars: Query<(&Transform, &mut ExternalForce), With<PlayerCar>>,
) {
    let entity = match game.player_car {
        Some(entity) => entity,
        _ => {
            return;
        }
    };
    let (transform, mut ext_force) = match cars.get_mut(entity) {
        Ok(car) => car,
        _ => {
            return;
        }
    };

    let axes = read_drive_axes(&keyboard_input);

    let engine_force = if axes.throttle >= 0.0 { config.engine_force } else { config.reverse_force };
    ext_force.force = transform.forward() * axes.throttle * engine_force;
    ext_force.torque = transform.rotation * Vec3::new(0.0, -axes.steer * config.steering_torque, 0.0);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, SystemLabel)]
pub enum CameraSystem {
    Target,
    Follow,
}

pub fn setup_camera(
    mut commands: Commands,
    mut game: ResMut<Game>,
) {
    game.camera = Some(
        commands.spawn_bundle(Camera3dBundle {
            transform: Transform::from_xyz(-3.0, 3.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
            ..Default::default()
        }).id());

    commands.spawn_bundle(DirectionalLightBundle {
        directional_light: DirectionalLight {
            shadows_enabled: true,
            illuminance: 1000.0,
            color: Color::rgb(0.5, 0.5, 2.0),
            ..default()
        },
        transform: Transform {
            translation: Vec3::new(0.0, 2.0, 0.0),
            rotation: Quat::from_xyzw(-1.0, -0.3, 0.0, 0.0),
            ..default()
        },
        ..default()
    });
}

pub fn camera_target_car_system(
    cars: Query<&Transform, With<PlayerCar>>,
    config: Res<GameConfig>,
    mut game: ResMut<Game>,
) {
    let car_entity = match game.player_car {
        Some(entity) => entity,
        _ => {
            return;
        }
    };
    let car_transform = match cars.get(car_entity) {
        Ok(transform) => transform,
        _ => {
            return;
        }
    };
    game.camera_target.look_at = Some(car_transform.translation);
    game.camera_target.up = Some(car_transform.up());
    game.camera_target.position = Some(
        car_transform.translation
            - car_transform.forward() * config.camera_follow_distance
            + car_transform.up() * config.camera_follow_height,
    );
}

/// Moves `current` a `smoothing` fraction of the way to `desired`.
pub fn smooth_follow(current: Vec3, desired: Vec3, smoothing: f32) -> Vec3 {
    current.lerp(desired, smoothing.clamp(0.0, 1.0))
}

pub fn camera_follow_system(
    mut transforms: Query<&mut Transform>,
    config: Res<GameConfig>,
    game: Res<Game>,
) {
    let camera_entity = match game.camera { Some(x) => x, _ => { return; } };
    let mut camera_transform = match transforms.get_mut(camera_entity) { Ok(x) => x, _ => { return; } };
    let camera_target_look_at = match game.camera_target.look_at { Some(x) => x, _ => { return; } };
    let camera_target_position = match game.camera_target.position { Some(x) => x, _ => { return; } };
    let camera_target_up = match game.camera_target.up { Some(x) => x, _ => { return; } };

    camera_transform.translation =
        smooth_follow(camera_transform.translation, camera_target_position, config.camera_smoothing);
    camera_transform.look_at(camera_target_look_at, camera_target_up);
}
