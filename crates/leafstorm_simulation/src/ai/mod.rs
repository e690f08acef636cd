//! AI decision-making module
//!
//! Боевой FSM врага: выбор ranged / melee / backpedal по дистанции и LOS,
//! тайминг атак (cooldown + two-phase commit), movement intents.

use bevy::prelude::*;

use crate::CombatSet;

pub mod components;
pub mod events;
pub mod systems;

// Re-export основных типов
pub use components::{
    evaluate, CombatBrain, CombatProfile, CombatState, CombatTarget, EngagementMode, Evaluation,
    RangedAttack,
};
pub use events::{AttackImpact, AttackOutcome, AttackResolved, AttackTriggered};
pub use systems::{assign_default_targets, combat_decision, face_toward, resolve_attack_impacts};

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма:
/// 1. assign_default_targets (CombatSet::Sync): цель из PlayerRegistry
/// 2. combat_decision (CombatSet::Decision): FSM, поворот, атаки, movement intents
/// 3. resolve_attack_impacts (CombatSet::Resolve): impact moment → хит / projectile
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AttackTriggered>()
            .add_event::<AttackImpact>()
            .add_event::<AttackResolved>()
            .add_systems(
                FixedUpdate,
                (
                    assign_default_targets
                        .in_set(CombatSet::Sync)
                        .after(crate::components::prune_player_registry),
                    combat_decision.in_set(CombatSet::Decision),
                    resolve_attack_impacts.in_set(CombatSet::Resolve),
                ),
            );
    }
}
