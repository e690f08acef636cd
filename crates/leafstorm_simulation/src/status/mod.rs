//! Status effect engine
//!
//! Архитектура:
//! - StatusEffects (component): контейнер эффектов + aggregate speed multiplier
//! - StatusApplied (event): единственный канал, которым атакующий вешает эффект
//! - Тик: reset aggregate → tick эффектов → удалить истёкшие (CombatSet::Status)
//! - Применение: CombatSet::Apply (после того, как все хиты тика разрешены)

use bevy::prelude::*;

use crate::CombatSet;

pub mod effects;


pub use effects::{ActionTag, StatusEffect, StatusEffects};

/// Event: повесить эффект на target
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct StatusApplied {
    pub target: Entity,
    pub effect: StatusEffect,
}

/// Status Plugin
pub struct StatusPlugin;

impl Plugin for StatusPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<StatusApplied>()
            .add_systems(FixedUpdate, tick_status_effects.in_set(CombatSet::Status))
            .add_systems(FixedUpdate, apply_status_events.in_set(CombatSet::Apply));
    }
}

/// Система: продвинуть все эффекты на fixed delta
pub fn tick_status_effects(mut query: Query<&mut StatusEffects>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut effects in query.iter_mut() {
        if effects.is_empty() && effects.speed_multiplier() == 1.0 {
            continue;
        }
        effects.advance(delta);
    }
}

/// Система: StatusApplied → StatusEffects::apply
///
/// Нет контейнера: warning, эффект теряется.
pub fn apply_status_events(
    mut events: EventReader<StatusApplied>,
    mut targets: Query<&mut StatusEffects>,
) {
    for event in events.read() {
        let Ok(mut effects) = targets.get_mut(event.target) else {
            crate::log_warning(&format!(
                "StatusApplied: {:?} has no StatusEffects, {:?} dropped",
                event.target, event.effect
            ));
            continue;
        };

        if effects.apply(event.effect) {
            crate::log(&format!(
                "🧪 {:?} ← {:?} (speed ×{:.2})",
                event.target,
                event.effect,
                effects.speed_multiplier()
            ));
        }
    }
}
