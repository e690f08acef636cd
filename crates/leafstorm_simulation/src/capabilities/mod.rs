//! Capability interfaces (внешние collaborators)
//!
//! Core не знает о движке: spatial queries, navigation и animation
//! приходят через trait objects в resources и typed component handles.
//! По умолчанию подставляются headless реализации.

use bevy::prelude::*;

pub mod animation;
pub mod navigation;
pub mod spatial;

pub use animation::{apply_animation_intents, AnimParam, AnimationCommand, AnimationIntent, Animator};
pub use navigation::{steer_navigation_agents, FlatNavMesh, NavMesh, NavMeshQuery};
pub use spatial::{
    has_line_of_sight, sync_spatial_backend, BodyShape, RayHit, SpatialBackend, SpatialBody,
    SpatialQuery, SphereWorld,
};

/// Capabilities Plugin
///
/// Вставляет headless backends (если host не подставил свои) и регистрирует
/// AnimationIntent. Системы синхронизации добавляет SimulationPlugin в нужные CombatSet.
pub struct CapabilitiesPlugin;

impl Plugin for CapabilitiesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpatialBackend>()
            .init_resource::<NavMesh>()
            .add_event::<AnimationIntent>();
    }
}
