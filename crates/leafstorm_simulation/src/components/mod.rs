//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые характеристики (faction, player marker, player registry)
//! - movement: навигационные intents и скорости (MovementCommand, NavigationAgent,
//!   PhysicsBody, ExternalVelocity)

pub mod actor;
pub mod movement;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
