//! Базовые компоненты акторов: Actor, Player, PlayerRegistry

use bevy::prelude::*;

use crate::status::StatusEffects;

/// Актор (игрок, враг): базовый компонент для живых существ
///
/// Автоматически добавляет StatusEffects через Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(StatusEffects)]
pub struct Actor {
    /// Stable ID фракции (projectiles не бьют свою фракцию)
    pub faction_id: u64,
}

/// Маркер игрока
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Player;

/// Registry: кто сейчас игрок (default target для новых врагов)
///
/// Заполняется системой `register_players`, читается один раз на спавне brain.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerRegistry {
    pub primary: Option<Entity>,
}

/// Система: запомнить первого заспавненного игрока
pub fn register_players(
    players: Query<Entity, Added<Player>>,
    mut registry: ResMut<PlayerRegistry>,
) {
    for entity in players.iter() {
        if registry.primary.is_none() {
            registry.primary = Some(entity);
            crate::log(&format!("🎮 Player registered: {:?}", entity));
        }
    }
}

/// Система: выкинуть despawned игрока из registry
pub fn prune_player_registry(
    players: Query<(), With<Player>>,
    mut registry: ResMut<PlayerRegistry>,
) {
    if let Some(entity) = registry.primary {
        if players.get(entity).is_err() {
            registry.primary = None;
            crate::log_warning(&format!("PlayerRegistry: player {:?} no longer exists", entity));
        }
    }
}
