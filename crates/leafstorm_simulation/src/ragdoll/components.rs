//! Ragdoll component: кто владеет телом (анимация или физика) + таймер

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Владелец тела
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum RagdollState {
    /// Анимация + навигация (limbs kinematic, коллайдеры выключены)
    #[default]
    Animated,
    /// Физика (limbs dynamic, коллайдеры включены)
    Ragdolled,
}

/// Что сделал blow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlowOutcome {
    /// Animated → Ragdolled
    Entered,
    /// Уже в ragdoll: таймер перезапущен, повторного входа нет
    Restarted,
}

/// Ragdoll handle: limbs + параметры восстановления
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Ragdoll {
    pub state: RagdollState,
    /// Сколько осталось до возврата в Animated (секунды)
    pub remaining: f32,
    /// Доп. время на "успокоиться" после ragdoll
    pub recovery_delay: f32,
    /// Доля импульса, которая уходит в каждый limb
    pub limb_impulse_fraction: f32,
    pub limbs: Vec<Entity>,
    /// Tag анимации подъёма (None = сразу idle)
    pub recover_animation: Option<String>,
    /// Радиус поиска navmesh при возврате
    pub navmesh_sample_radius: f32,
}

impl Default for Ragdoll {
    fn default() -> Self {
        Self {
            state: RagdollState::Animated,
            remaining: 0.0,
            recovery_delay: 0.6,
            limb_impulse_fraction: 0.35,
            limbs: Vec::new(),
            recover_animation: None,
            navmesh_sample_radius: 2.0,
        }
    }
}

impl Ragdoll {
    /// Длительность ragdoll по умолчанию (секунды)
    pub const DEFAULT_BLOW_DURATION: f32 = 0.8;

    pub fn new(limbs: Vec<Entity>) -> Self {
        Self {
            limbs,
            ..default()
        }
    }

    pub fn with_recover_animation(mut self, tag: &str) -> Self {
        self.recover_animation = Some(tag.to_string());
        self
    }

    pub fn is_ragdolled(&self) -> bool {
        self.state == RagdollState::Ragdolled
    }

    /// Blow: (пере)запустить таймер на `duration + recovery_delay`
    pub fn blow(&mut self, duration: f32) -> BlowOutcome {
        self.remaining = duration.max(0.0) + self.recovery_delay;

        if self.is_ragdolled() {
            return BlowOutcome::Restarted;
        }

        self.state = RagdollState::Ragdolled;
        BlowOutcome::Entered
    }

    /// Тик таймера. true: пора вернуться в Animated (state уже переключён)
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.is_ragdolled() {
            return false;
        }

        self.remaining -= dt;
        if self.remaining > 0.0 {
            return false;
        }

        self.remaining = 0.0;
        self.state = RagdollState::Animated;
        true
    }
}
