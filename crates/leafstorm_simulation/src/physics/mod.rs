//! Physics simulation module
//!
//! Kinematic контроллер, композиция скоростей (slow + knockback), collision groups.

pub mod collision;
pub mod movement;

// Re-export основных типов
pub use movement::{
    compose_velocity, spawn_kinematic_character, KinematicController, KinematicControllerPlugin,
    MovementInput,
};
