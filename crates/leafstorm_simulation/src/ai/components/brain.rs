//! Combat brain: состояние боевого FSM + чистая логика выбора режима

use bevy::prelude::*;

use super::profile::CombatProfile;
use crate::components::MovementCommand;

/// Режим атаки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum EngagementMode {
    Ranged,
    Melee,
}

/// Боевые состояния врага
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum CombatState {
    /// Идём к цели (или стоим без цели)
    #[default]
    Approaching,
    /// melee < d ≤ ranged, есть LOS
    RangedEngage,
    /// d ≤ melee
    MeleeEngage,
    /// Цель слишком близко: пятимся, не атакуем
    Backpedal,
    /// Атака идёт: ждём impact moment, потом конец анимации
    Attacking {
        mode: EngagementMode,
        /// Сколько прошло с trigger (секунды)
        elapsed: f32,
        /// Impact уже разрешён (второй игнорируется)
        impact_resolved: bool,
    },
    /// Сбит с ног: навигация на паузе до конца таймера
    KnockedBack { timer: f32 },
}

impl CombatState {
    pub fn is_attacking(&self) -> bool {
        matches!(self, Self::Attacking { .. })
    }

    pub fn is_knocked_back(&self) -> bool {
        matches!(self, Self::KnockedBack { .. })
    }
}

/// Результат оценки дистанции + LOS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Evaluation {
    pub ranged: bool,
    pub melee: bool,
    pub backpedal: bool,
}

impl Evaluation {
    pub fn mode(&self) -> Option<EngagementMode> {
        if self.ranged {
            Some(EngagementMode::Ranged)
        } else if self.melee {
            Some(EngagementMode::Melee)
        } else {
            None
        }
    }

    /// Состояние вне атаки
    pub fn engagement_state(&self) -> CombatState {
        if self.backpedal {
            CombatState::Backpedal
        } else {
            self.settled_state()
        }
    }

    /// Состояние после атаки (Attacking никогда не переходит сразу в Backpedal)
    pub fn settled_state(&self) -> CombatState {
        match self.mode() {
            Some(EngagementMode::Ranged) => CombatState::RangedEngage,
            Some(EngagementMode::Melee) => CombatState::MeleeEngage,
            None => CombatState::Approaching,
        }
    }
}

/// Ranged: melee < d ≤ ranged + LOS. Melee: d ≤ melee.
/// Backpedal: ranged и d < 0.7·preferred_min, или melee и d < 0.5.
pub fn evaluate(profile: &CombatProfile, distance: f32, has_line_of_sight: bool) -> Evaluation {
    let ranged = profile.ranged.as_ref().is_some_and(|ranged| {
        distance > profile.melee_range && distance <= ranged.range && has_line_of_sight
    });
    let melee = distance <= profile.melee_range;

    let backpedal = profile.can_backpedal() && {
        let too_close_ranged = ranged
            && profile
                .ranged
                .as_ref()
                .is_some_and(|attack| distance < attack.preferred_min * 0.7);
        let too_close_melee = melee && distance < 0.5;
        too_close_ranged || too_close_melee
    };

    Evaluation {
        ranged,
        melee,
        backpedal,
    }
}

/// Текущая цель врага (None: стоим)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CombatTarget(pub Option<Entity>);

/// Боевой AI врага
///
/// Автоматически добавляет CombatTarget, CombatProfile (spider) и MovementCommand
/// через Required Components.
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
#[require(CombatTarget, CombatProfile, MovementCommand)]
pub struct CombatBrain {
    pub state: CombatState,
    /// Время последней атаки (None: готов атаковать сразу)
    pub last_attack_time: Option<f32>,
    pub has_line_of_sight: bool,
    pub distance_to_target: f32,
    /// Вариант последней атаки (0 / 1)
    pub attack_index: i32,
}

impl CombatBrain {
    pub fn cooldown_ready(&self, now: f32, cooldown: f32) -> bool {
        self.last_attack_time
            .map_or(true, |last| now >= last + cooldown)
    }

    /// Можно ли стартовать атаку в этом тике
    pub fn can_trigger_attack(&self, now: f32, profile: &CombatProfile, evaluation: &Evaluation) -> bool {
        if self.state.is_attacking() || self.state.is_knocked_back() {
            return false;
        }
        if evaluation.mode().is_none() {
            return false;
        }
        if !profile.stationary && evaluation.backpedal {
            return false;
        }
        self.cooldown_ready(now, profile.attack_cooldown)
    }

    /// Commit атаки: Attacking из текущего режима, запомнить время
    pub fn trigger_attack(&mut self, now: f32, mode: EngagementMode, attack_index: i32) {
        self.state = CombatState::Attacking {
            mode,
            elapsed: 0.0,
            impact_resolved: false,
        };
        self.last_attack_time = Some(now);
        self.attack_index = attack_index;
    }
}
