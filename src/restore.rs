//! Putting the player back where a save left them once the saved level
//! has loaded.

use std::time::Duration;

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::{
    game::Game,
    level::{ActiveLevel, LevelStatus},
    save_game::SaveError,
    vehicle::{spawn_player_car, PlayerCar, PlayerTemplate},
};

/// Where players live, as far as restoring one is concerned.
pub trait PlayerHost {
    type Handle: Copy;

    /// The one player in the level, if any. Extra players are removed.
    fn claim_player(&mut self) -> Option<Self::Handle>;
    fn place_player(&mut self, player: Self::Handle, position: Vec3);
    fn spawn_player(&mut self, position: Vec3) -> Result<Self::Handle, SaveError>;
}

/// Teleports the existing player to `target`, or spawns one there.
pub fn restore_player<H: PlayerHost>(host: &mut H, target: Vec3) -> Result<H::Handle, SaveError> {
    match host.claim_player() {
        Some(player) => {
            host.place_player(player, target);
            info!("Player position loaded: {}", target);
            Ok(player)
        }
        None => {
            let player = host.spawn_player(target)?;
            info!("Player instantiated at position: {}", target);
            Ok(player)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Waiting,
    /// The level host reported the level ready.
    Ready,
    /// The level never reported ready within the fallback delay.
    FallbackElapsed,
    /// Another level replaced the one being waited for.
    Abandoned,
}

/// A load-game request waiting for its level.
pub struct PendingRestore {
    pub level: String,
    pub target: Vec3,
    /// `ActiveLevel::generation` when the load was requested.
    pub requested_at: u64,
    fallback: Timer,
}

impl PendingRestore {
    pub fn new(level: &str, target: Vec3, requested_at: u64, fallback_delay: Duration) -> Self {
        PendingRestore {
            level: level.to_string(),
            target,
            requested_at,
            fallback: Timer::new(fallback_delay, false),
        }
    }

    pub fn poll(&mut self, active: &ActiveLevel, delta: Duration) -> Readiness {
        // The host has not started on the request yet.
        if active.generation <= self.requested_at {
            return Readiness::Waiting;
        }
        if active.generation > self.requested_at + 1
            || active.current_level_id() != Some(self.level.as_str())
        {
            return Readiness::Abandoned;
        }
        if active.status == LevelStatus::Ready {
            return Readiness::Ready;
        }
        if self.fallback.tick(delta).finished() {
            return Readiness::FallbackElapsed;
        }
        Readiness::Waiting
    }
}

struct EcsPlayerHost<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    players: Vec<(Entity, Mut<'a, Transform>, Option<Mut<'a, Velocity>>)>,
    template: Option<&'a PlayerTemplate>,
}

impl<'a, 'w, 's> PlayerHost for EcsPlayerHost<'a, 'w, 's> {
    type Handle = Entity;

    fn claim_player(&mut self) -> Option<Entity> {
        let mut players = self.players.iter().map(|(entity, ..)| *entity);
        let player = players.next()?;
        for extra in players {
            warn!("Removing extra player {:?}", extra);
            self.commands.entity(extra).despawn_recursive();
        }
        Some(player)
    }

    fn place_player(&mut self, player: Entity, position: Vec3) {
        let found = self.players.iter_mut().find(|(entity, ..)| *entity == player);
        if let Some((_, transform, velocity)) = found {
            transform.translation = position;
            if let Some(velocity) = velocity {
                **velocity = Velocity::zero();
            }
        }
    }

    fn spawn_player(&mut self, position: Vec3) -> Result<Entity, SaveError> {
        let template = self.template.ok_or(SaveError::PlayerSpawnUnavailable)?;
        Ok(spawn_player_car(self.commands, template, position))
    }
}

pub fn restore_player_system(
    mut commands: Commands,
    pending: Option<ResMut<PendingRestore>>,
    active: Res<ActiveLevel>,
    time: Res<Time>,
    template: Option<Res<PlayerTemplate>>,
    mut game: ResMut<Game>,
    mut players: Query<(Entity, &mut Transform, Option<&mut Velocity>), With<PlayerCar>>,
) {
    let mut pending = match pending {
        Some(pending) => pending,
        None => {
            return;
        }
    };

    let result = match pending.poll(&active, time.delta()) {
        Readiness::Waiting => {
            return;
        }
        Readiness::Abandoned => Err(SaveError::PlayerSpawnUnavailable),
        readiness => {
            if readiness == Readiness::FallbackElapsed {
                warn!("Level {} did not report ready, placing player anyway", pending.level);
            }
            let mut host = EcsPlayerHost {
                commands: &mut commands,
                players: players.iter_mut().collect(),
                template: template.as_deref(),
            };
            restore_player(&mut host, pending.target)
        }
    };

    match result {
        Ok(player) => game.player_car = Some(player),
        Err(err) => error!("Could not resume {}: {}", pending.level, err),
    }
    commands.remove_resource::<PendingRestore>();
}
