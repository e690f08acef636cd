//! Attack resolution: impact moment → повторная проверка → хит / projectile / промах
//!
//! Режим (Ranged / Melee) выбран на trigger. На impact проверяется только его окно:
//! цель ушла из окна → Missed, без payload и knockback.
//! Второй impact той же атаки игнорируется (флаг impact_resolved).
//! Impact вне Attacking (ragdoll, knockback прервали атаку): отбрасывается.

use bevy::prelude::*;

use crate::ai::{
    AttackImpact, AttackOutcome, AttackResolved, CombatBrain, CombatProfile, CombatState, CombatTarget,
    EngagementMode,
};
use crate::capabilities::{has_line_of_sight, SpatialBackend};
use crate::components::Actor;
use crate::knockback::KnockbackRequest;
use crate::projectile::{spawn_projectile, Projectile};
use crate::status::StatusApplied;

/// Точка вылета projectile: чуть вперёд и вверх от врага
pub fn projectile_spawn_point(transform: &Transform) -> Vec3 {
    transform.translation + *transform.forward() * 0.5 + Vec3::Y * 0.5
}

/// Куда целимся: центр корпуса цели (+1m от ног)
pub fn projectile_aim_point(target_position: Vec3) -> Vec3 {
    target_position + Vec3::Y
}

/// System: разрешение impact moments
#[allow(clippy::too_many_arguments)]
pub fn resolve_attack_impacts(
    mut commands: Commands,
    mut impacts: EventReader<AttackImpact>,
    mut attackers: Query<(&mut CombatBrain, &CombatProfile, &CombatTarget, &Transform, Option<&Actor>)>,
    targets: Query<&Transform>,
    spatial: Res<SpatialBackend>,
    time: Res<Time<Fixed>>,
    mut status_events: EventWriter<StatusApplied>,
    mut knockback_events: EventWriter<KnockbackRequest>,
    mut resolved_events: EventWriter<AttackResolved>,
) {
    let now = time.elapsed_secs();

    for impact in impacts.read() {
        let Ok((mut brain, profile, target, transform, actor)) = attackers.get_mut(impact.attacker) else {
            crate::log_warning(&format!("AttackImpact: attacker {:?} has no CombatBrain", impact.attacker));
            continue;
        };

        // Stale impact: атака уже закончилась или прервана
        let CombatState::Attacking {
            mode,
            elapsed,
            impact_resolved,
        } = brain.state
        else {
            crate::log(&format!("AttackImpact: {:?} not attacking, dropped", impact.attacker));
            continue;
        };
        if impact_resolved {
            continue;
        }
        brain.state = CombatState::Attacking {
            mode,
            elapsed,
            impact_resolved: true,
        };

        let Some(target_entity) = target.0 else {
            crate::log_warning(&format!("AttackImpact: {:?} has no target", impact.attacker));
            continue;
        };
        let Ok(target_transform) = targets.get(target_entity) else {
            crate::log_warning(&format!(
                "AttackImpact: {:?} target {:?} no longer exists",
                impact.attacker, target_entity
            ));
            continue;
        };

        let position = transform.translation;
        let target_position = target_transform.translation;
        let distance = position.distance(target_position);
        let los = has_line_of_sight(&spatial, position, target_position, target_entity, profile.sight_range);

        // Режим зафиксирован на trigger: проверяем только его окно
        let ranged_window = match mode {
            EngagementMode::Ranged => profile
                .ranged
                .as_ref()
                .filter(|ranged| distance > profile.melee_range && distance <= ranged.range && los),
            EngagementMode::Melee => None,
        };
        let melee_window = mode == EngagementMode::Melee && distance <= profile.melee_range;

        let outcome = if let Some(ranged) = ranged_window {
            let origin = projectile_spawn_point(transform);
            let direction = projectile_aim_point(target_position) - origin;
            let projectile = Projectile::new(
                direction,
                ranged.projectile_speed,
                ranged.projectile_lifetime,
                Some(ranged.payload),
                impact.attacker,
                now,
            )
            .with_radius(ranged.projectile_radius)
            .with_faction(actor.map(|actor| actor.faction_id));

            let projectile_entity = spawn_projectile(&mut commands, origin, projectile);
            crate::log(&format!(
                "🕸️ {:?} spat projectile {:?} at {:.2}m",
                impact.attacker, projectile_entity, distance
            ));
            AttackOutcome::ProjectileLaunched
        } else if melee_window {
            if let Some(payload) = profile.melee_payload {
                status_events.write(StatusApplied {
                    target: target_entity,
                    effect: payload,
                });
            }
            knockback_events.write(KnockbackRequest::FromImpact {
                target: target_entity,
                impact_point: target_position,
                source_point: position,
                magnitude: profile.melee_knockback,
                upward_bias: profile.melee_upward_bias,
            });
            crate::log(&format!("🩸 {:?} melee hit at {:.2}m", impact.attacker, distance));
            AttackOutcome::MeleeHit
        } else {
            crate::log(&format!(
                "AttackImpact: {:?} {:?} missed, target left the window ({:.2}m, los = {})",
                impact.attacker, mode, distance, los
            ));
            AttackOutcome::Missed
        };

        resolved_events.write(AttackResolved {
            attacker: impact.attacker,
            target: target_entity,
            outcome,
        });
    }
}
