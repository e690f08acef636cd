//! Movement компоненты: навигационные intents, скорость тела, внешняя скорость

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Команда движения для актора (intent для navigation collaborator)
///
/// Архитектура:
/// - AI система пишет MovementCommand (high-level intent)
/// - Headless: `steer_navigation_agents` конвертирует в MovementInput
/// - Host: NavigationAgent движка читает и строит путь сам
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub enum MovementCommand {
    /// Стоять на месте (не обновлять target)
    #[default]
    Idle,
    /// Двигаться к позиции (world coordinates)
    MoveToPosition { target: Vec3 },
    /// Следовать за entity (target обновляется каждый тик)
    FollowEntity { target: Entity },
    /// Остановиться немедленно
    Stop,
}

/// Handle навигационного агента (typed handle вместо поиска по имени)
///
/// `enabled = false`: агент на паузе (ragdoll, knockback recovery).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NavigationAgent {
    /// Дистанция, на которой агент считает цель достигнутой (метры)
    pub stop_distance: f32,
    pub enabled: bool,
}

impl Default for NavigationAgent {
    fn default() -> Self {
        Self {
            stop_distance: 0.5,
            enabled: true,
        }
    }
}

/// Собственная скорость тела (intrinsic + vertical), интегрируется в Transform
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    pub velocity: Vec3,
    pub mass: f32,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            mass: 70.0,
        }
    }
}

/// Внешняя скорость (knockback, self-launch)
///
/// Пишется только через `KnockbackRequest`, затухает экспоненциально.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct ExternalVelocity(pub Vec3);

impl ExternalVelocity {
    /// Ниже этой длины вектор обнуляется
    pub const SNAP_EPSILON: f32 = 1e-3;

    /// v *= exp(-rate·dt)
    pub fn decay(&mut self, rate: f32, dt: f32) {
        self.0 *= (-rate * dt).exp();
        if self.0.length() < Self::SNAP_EPSILON {
            self.0 = Vec3::ZERO;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Vec3::ZERO
    }
}
