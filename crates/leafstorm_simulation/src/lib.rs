//! Leafstorm Simulation Core
//!
//! ECS-симуляция боя на Bevy 0.16 (headless, движок подключается через capabilities)
//!
//! Подсистемы:
//! - status: Slow / Inhibit с таймерами, агрегированный speed multiplier
//! - knockback: геометрический knockback → ExternalVelocity
//! - ai: боевой FSM врага (ranged / melee / backpedal, two-phase attack)
//! - projectile: полёт, попадание, таймаут
//! - ragdoll: blow → физика → recovery на navmesh
//! - player: leaf blower (непрерывный поток, charged blast, self-launch)
//! - physics: kinematic движение с учётом slow и внешней скорости
//!
//! Порядок тика (FixedUpdate, CombatSet chain):
//! Sync → Ragdoll → Status → Decision → Resolve → Apply → Motion

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Публичные модули
pub mod ai;
pub mod capabilities;
pub mod components;
pub mod knockback;
pub mod logger;
pub mod physics;
pub mod player;
pub mod projectile;
pub mod ragdoll;
pub mod status;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, CombatBrain, CombatProfile, CombatState, CombatTarget, EngagementMode, RangedAttack};
pub use capabilities::{
    AnimationIntent, Animator, BodyShape, CapabilitiesPlugin, FlatNavMesh, NavMesh, NavMeshQuery, SpatialBackend,
    SpatialQuery, SphereWorld,
};
pub use components::*;
pub use knockback::{KnockbackPlugin, KnockbackRequest};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, set_logger_if_needed,
    ConsoleLogger, LogLevel, LogPrinter,
};
pub use physics::{KinematicController, KinematicControllerPlugin, MovementInput};
pub use player::{Blowable, BlowerFired, BlowerInput, BlowerPlugin, BlowerTool};
pub use projectile::{Projectile, ProjectilePlugin, ProjectileRetired};
pub use ragdoll::{Blow, Ragdoll, RagdollPlugin, RagdollRecovered};
pub use status::{ActionTag, StatusApplied, StatusEffect, StatusEffects, StatusPlugin};

/// Частота simulation tick
pub const TICK_HZ: f64 = 60.0;

/// Фазы боевого тика (FixedUpdate, строго по порядку)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Spatial backend, player registry, default targets
    Sync,
    /// Таймеры ragdoll, затем новые Blow
    Ragdoll,
    /// Reset multiplier → tick эффектов → удаление истёкших
    Status,
    /// FSM врагов, blower input
    Decision,
    /// Impact moments, projectiles
    Resolve,
    /// StatusApplied / KnockbackRequest этого тика
    Apply,
    /// Steering → velocity composition → integration
    Motion,
}

/// Глобальные параметры боя (host может загрузить через serde)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSettings {
    /// Скорость затухания ExternalVelocity (1/s)
    pub knockback_decay_rate: f32,
    /// |external.y| выше порога → заменяет вертикальную скорость контроллера
    pub vertical_override_threshold: f32,
    /// Длительность ragdoll от blower (секунды, без recovery delay)
    pub default_blow_duration: f32,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            knockback_decay_rate: 5.0,
            vertical_override_threshold: 0.1,
            default_blow_duration: Ragdoll::DEFAULT_BLOW_DURATION,
        }
    }
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .init_resource::<CombatSettings>()
            .init_resource::<PlayerRegistry>()
            .configure_sets(
                FixedUpdate,
                (
                    CombatSet::Sync,
                    CombatSet::Ragdoll,
                    CombatSet::Status,
                    CombatSet::Decision,
                    CombatSet::Resolve,
                    CombatSet::Apply,
                    CombatSet::Motion,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    (register_players, prune_player_registry, capabilities::sync_spatial_backend)
                        .chain()
                        .in_set(CombatSet::Sync),
                    (
                        capabilities::steer_navigation_agents,
                        capabilities::apply_animation_intents,
                    )
                        .chain()
                        .in_set(CombatSet::Motion),
                ),
            )
            // Подсистемы
            .add_plugins((
                CapabilitiesPlugin,
                RagdollPlugin,
                StatusPlugin,
                AIPlugin,
                ProjectilePlugin,
                KnockbackPlugin,
                KinematicControllerPlugin,
                BlowerPlugin,
            ));

        // Детерминистичный RNG (seed по умолчанию, если host не задал свой)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается ровно на один fixed tick за `app.update()`
/// (первый update только стартует часы).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(TICK_HZ)) // 60Hz FixedUpdate
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / TICK_HZ,
        )));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
