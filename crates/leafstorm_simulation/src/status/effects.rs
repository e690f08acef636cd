//! Status effects: Slow, Inhibit + контейнер StatusEffects

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Действие, которое может быть заблокировано Inhibit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum ActionTag {
    /// Leaf blower игрока (зарядка + выстрел)
    LeafBlower,
    /// Атака врага (новые атаки не стартуют)
    Attack,
}

/// Временный эффект на entity
///
/// `elapsed` считается с момента apply. Эффект активен пока `elapsed < duration`.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Замедление: speed multiplier ≤ factor
    Slow {
        /// Множитель скорости [0, 1]
        factor: f32,
        duration: f32,
        #[serde(default)]
        elapsed: f32,
    },
    /// Блокировка действия
    Inhibit {
        action: ActionTag,
        duration: f32,
        #[serde(default)]
        elapsed: f32,
    },
}

impl StatusEffect {
    pub fn slow(factor: f32, duration: f32) -> Self {
        Self::Slow {
            factor: factor.clamp(0.0, 1.0),
            duration,
            elapsed: 0.0,
        }
    }

    pub fn inhibit(action: ActionTag, duration: f32) -> Self {
        Self::Inhibit {
            action,
            duration,
            elapsed: 0.0,
        }
    }

    pub fn duration(&self) -> f32 {
        match self {
            Self::Slow { duration, .. } | Self::Inhibit { duration, .. } => *duration,
        }
    }

    pub fn elapsed(&self) -> f32 {
        match self {
            Self::Slow { elapsed, .. } | Self::Inhibit { elapsed, .. } => *elapsed,
        }
    }

    pub fn remaining(&self) -> f32 {
        (self.duration() - self.elapsed()).max(0.0)
    }

    pub fn is_active(&self) -> bool {
        self.elapsed() < self.duration()
    }

    /// Копия эффекта с обнулённым elapsed (payload шаблон → свежий эффект)
    pub fn fresh(&self) -> Self {
        let mut effect = *self;
        match &mut effect {
            Self::Slow { factor, elapsed, .. } => {
                *factor = factor.clamp(0.0, 1.0);
                *elapsed = 0.0;
            }
            Self::Inhibit { elapsed, .. } => *elapsed = 0.0,
        }
        effect
    }

    /// Продвинуть эффект на dt. Вклад в aggregate только пока активен.
    ///
    /// Возвращает false, если эффект истёк (его нужно удалить).
    pub fn tick(&mut self, speed_multiplier: &mut f32, dt: f32) -> bool {
        match self {
            Self::Slow { elapsed, .. } | Self::Inhibit { elapsed, .. } => *elapsed += dt,
        }

        if !self.is_active() {
            return false;
        }

        self.contribute(speed_multiplier);
        true
    }

    fn contribute(&self, speed_multiplier: &mut f32) {
        if let Self::Slow { factor, .. } = self {
            *speed_multiplier = speed_multiplier.min(*factor);
        }
    }
}

/// Контейнер эффектов на entity (+ aggregate speed multiplier)
///
/// Инвариант: speed_multiplier == min(factor активных Slow), 1.0 без Slow.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
    speed_multiplier: f32,
}

impl Default for StatusEffects {
    fn default() -> Self {
        Self {
            effects: Vec::new(),
            speed_multiplier: 1.0,
        }
    }
}

impl StatusEffects {
    /// Добавить эффект (без дедупликации). Нулевая длительность: no-op.
    ///
    /// Slow клампит aggregate сразу, до следующего advance.
    pub fn apply(&mut self, effect: StatusEffect) -> bool {
        let effect = effect.fresh();
        if effect.duration() <= 0.0 {
            return false;
        }

        effect.contribute(&mut self.speed_multiplier);
        self.effects.push(effect);
        true
    }

    /// Тик: reset aggregate → tick в порядке добавления → удалить истёкшие
    pub fn advance(&mut self, dt: f32) {
        self.speed_multiplier = 1.0;

        let speed_multiplier = &mut self.speed_multiplier;
        self.effects.retain_mut(|effect| effect.tick(speed_multiplier, dt));
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn is_action_inhibited(&self, tag: ActionTag) -> bool {
        self.effects.iter().any(|effect| {
            matches!(effect, StatusEffect::Inhibit { action, .. } if *action == tag) && effect.is_active()
        })
    }

    pub fn active(&self) -> &[StatusEffect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
