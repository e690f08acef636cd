//! AI Events: атаки (trigger + impact moment)
//!
//! Two-phase commit:
//! 1. Decision: AttackTriggered (анимация стартовала, cooldown записан)
//! 2. Resolve: AttackImpact (от animation collaborator или по impact_delay) →
//!    повторная проверка дистанции → хит / projectile / промах

use bevy::prelude::*;

use super::components::EngagementMode;

/// Атака стартовала
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackTriggered {
    pub attacker: Entity,
    pub target: Entity,
    pub mode: EngagementMode,
    /// Вариант анимации (0 / 1)
    pub attack_index: i32,
}

/// Impact moment атаки (хост шлёт из animation event)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackImpact {
    pub attacker: Entity,
}

/// Итог разрешения impact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// Ближний удар попал (payload + knockback)
    MeleeHit,
    /// Выпущен projectile
    ProjectileLaunched,
    /// Цель вышла из зоны: промах
    Missed,
}

/// Event: чем закончилась атака
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackResolved {
    pub attacker: Entity,
    pub target: Entity,
    pub outcome: AttackOutcome,
}
