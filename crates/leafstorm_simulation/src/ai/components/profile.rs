//! Combat profile: дистанции, тайминги, payloads врага (пресеты spider / mushroom / turret)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::status::StatusEffect;

/// Параметры дальней атаки (projectile)
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
pub struct RangedAttack {
    /// Максимальная дистанция выстрела (метры)
    pub range: f32,
    /// Желаемая дистанция стрельбы (min, max)
    pub preferred_min: f32,
    pub preferred_max: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub projectile_radius: f32,
    /// Эффект на попадании
    pub payload: StatusEffect,
}

impl Default for RangedAttack {
    fn default() -> Self {
        Self {
            range: 8.0,
            preferred_min: 6.0,
            preferred_max: 10.0,
            projectile_speed: 15.0,
            projectile_lifetime: 5.0,
            projectile_radius: 0.2,
            payload: StatusEffect::slow(0.5, 3.0),
        }
    }
}

/// Параметры боевого AI
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct CombatProfile {
    /// Дальше sight range враг цель не видит и не идёт к ней
    pub sight_range: f32,
    pub melee_range: f32,
    /// Желаемая дистанция ближнего боя (min задаёт stop distance)
    pub preferred_melee_min: f32,
    pub preferred_melee_max: f32,
    /// None: только ближний бой
    pub ranged: Option<RangedAttack>,

    pub attack_cooldown: f32,
    /// Длительность Attacking (секунды)
    pub attack_duration: f32,
    /// Через сколько после старта атаки core сам шлёт AttackImpact.
    /// None: impact приходит от animation collaborator.
    pub impact_delay: Option<f32>,
    /// Шанс второго варианта атаки (AttackIndex = 1)
    pub attack2_chance: f32,

    pub melee_payload: Option<StatusEffect>,
    pub melee_knockback: f32,
    pub melee_upward_bias: f32,

    /// Скорость поворота к цели (slerp factor / sec)
    pub look_at_speed: f32,
    /// Турель: не двигается, не пятится, атакует без backpedal gate
    pub stationary: bool,
    /// Умеет пятиться, если цель слишком близко
    pub backpedal: bool,
    /// Пауза навигации после knockback (None: knockback не прерывает AI)
    pub knockback_recovery: Option<f32>,
}

impl Default for CombatProfile {
    fn default() -> Self {
        Self::spider()
    }
}

impl CombatProfile {
    /// Паук: стреляет издалека, кусается вблизи
    pub fn spider() -> Self {
        Self {
            sight_range: 15.0,
            melee_range: 2.2,
            preferred_melee_min: 1.8,
            preferred_melee_max: 3.5,
            ranged: Some(RangedAttack::default()),
            attack_cooldown: 1.25,
            attack_duration: 0.9,
            impact_delay: Some(0.45),
            attack2_chance: 0.35,
            melee_payload: Some(StatusEffect::slow(0.5, 1.5)),
            melee_knockback: 15.0,
            melee_upward_bias: 0.3,
            look_at_speed: 5.0,
            stationary: false,
            backpedal: true,
            knockback_recovery: None,
        }
    }

    /// Гриб: только догоняет и толкает, после knockback полсекунды стоит
    pub fn mushroom() -> Self {
        Self {
            sight_range: 15.0,
            melee_range: 2.5,
            // stop distance = 2.5 × 0.8
            preferred_melee_min: 2.5,
            preferred_melee_max: 3.5,
            ranged: None,
            attack_cooldown: 2.0,
            attack_duration: 0.8,
            impact_delay: Some(0.4),
            attack2_chance: 0.0,
            melee_payload: None,
            melee_knockback: 12.0,
            melee_upward_bias: 0.25,
            look_at_speed: 5.0,
            stationary: false,
            backpedal: false,
            knockback_recovery: Some(0.5),
        }
    }

    /// Паук-турель на уступе: не ходит, только поворачивается и стреляет
    pub fn turret() -> Self {
        Self {
            stationary: true,
            ..Self::spider()
        }
    }

    /// Stop distance навигации для текущего режима
    pub fn stop_distance(&self, ranged_mode: bool) -> f32 {
        match (&self.ranged, ranged_mode) {
            (Some(ranged), true) => (ranged.preferred_min + ranged.preferred_max) * 0.5,
            _ => (self.preferred_melee_min * 0.8).clamp(0.1, (self.melee_range - 0.1).max(0.1)),
        }
    }

    pub fn can_backpedal(&self) -> bool {
        self.backpedal && !self.stationary
    }
}
