//! Combat decision FSM: sensing → режим → атака → movement intent
//!
//! Каждый тик на врага (ragdolled пропускаются):
//! 1. KnockedBack: ждём таймер, потом Approaching + навигация ON
//! 2. Нет цели → Approaching + Idle
//! 3. Дистанция + LOS, поворот к цели (в sight range)
//! 4. Attacking: impact по impact_delay, конец по attack_duration
//! 5. Иначе: Ranged / Melee / Backpedal / Approaching по evaluate
//! 6. Trigger атаки (cooldown, backpedal gate, Inhibit(Attack))
//! 7. MovementCommand: Stop в атаке, FollowEntity в sight range, иначе Idle

use bevy::prelude::*;
use rand::Rng;

use crate::ai::{
    evaluate, AttackImpact, AttackTriggered, CombatBrain, CombatProfile, CombatState, CombatTarget,
};
use crate::capabilities::{has_line_of_sight, AnimationIntent, Animator, NavMesh, SpatialBackend};
use crate::components::{MovementCommand, NavigationAgent};
use crate::ragdoll::Ragdoll;
use crate::status::{ActionTag, StatusEffects};
use crate::DeterministicRng;

/// Плавный поворот по yaw к точке (forward = -Z)
///
/// `t`: доля slerp за тик (look_at_speed·dt), почти совпадающие точки игнорируются.
pub fn face_toward(transform: &mut Transform, target: Vec3, t: f32) {
    let to_target = Vec3::new(
        target.x - transform.translation.x,
        0.0,
        target.z - transform.translation.z,
    );
    if to_target.length_squared() <= 0.01 {
        return;
    }

    let yaw = f32::atan2(-to_target.x, -to_target.z);
    let desired = Quat::from_rotation_y(yaw);
    transform.rotation = transform.rotation.slerp(desired, t.clamp(0.0, 1.0));
}

fn set_command(entity: Entity, command: &mut Mut<MovementCommand>, desired: MovementCommand) {
    if **command != desired {
        crate::log(&format!("🏃 {:?} movement: {:?} → {:?}", entity, **command, desired));
        **command = desired;
    }
}

/// System: боевой FSM врага
#[allow(clippy::type_complexity)]
pub fn combat_decision(
    mut brains: Query<(
        Entity,
        &mut CombatBrain,
        &CombatProfile,
        &CombatTarget,
        &mut Transform,
        &mut MovementCommand,
        Option<&mut NavigationAgent>,
        Option<&mut Animator>,
        Option<&Ragdoll>,
        Option<&StatusEffects>,
    )>,
    targets: Query<&Transform, Without<CombatBrain>>,
    spatial: Res<SpatialBackend>,
    navmesh: Res<NavMesh>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut animation_intents: EventWriter<AnimationIntent>,
    mut triggered_events: EventWriter<AttackTriggered>,
    mut impact_events: EventWriter<AttackImpact>,
) {
    let delta = time.delta_secs();
    let now = time.elapsed_secs();

    for (
        entity,
        mut brain,
        profile,
        target,
        mut transform,
        mut command,
        mut agent,
        mut animator,
        ragdoll,
        status,
    ) in brains.iter_mut()
    {
        if ragdoll.is_some_and(|ragdoll| ragdoll.is_ragdolled()) {
            continue;
        }

        // 1. Восстановление после knockback
        let knocked_back = brain.state;
        if let CombatState::KnockedBack { timer } = knocked_back {
            let timer = timer - delta;
            if timer > 0.0 {
                brain.state = CombatState::KnockedBack { timer };
                set_command(entity, &mut command, MovementCommand::Stop);
                continue;
            }

            brain.state = CombatState::Approaching;
            if let Some(agent) = agent.as_mut() {
                agent.enabled = !profile.stationary;
            }
            crate::log(&format!("AI: {:?} KnockedBack → Approaching", entity));
        }

        // 2. Цель
        let resolved_target = target
            .0
            .and_then(|target| targets.get(target).ok().map(|tf| (target, tf.translation)));
        let Some((target_entity, target_position)) = resolved_target else {
            if brain.state != CombatState::Approaching {
                crate::log_warning(&format!(
                    "AI: {:?} lost target {:?} → Approaching (idle)",
                    entity, target.0
                ));
                brain.state = CombatState::Approaching;
            }
            brain.has_line_of_sight = false;
            set_command(entity, &mut command, MovementCommand::Idle);
            continue;
        };

        // 3. Sensing + поворот
        let position = transform.translation;
        let distance = position.distance(target_position);
        let los = has_line_of_sight(&spatial, position, target_position, target_entity, profile.sight_range);
        brain.distance_to_target = distance;
        brain.has_line_of_sight = los;

        if distance <= profile.sight_range {
            face_toward(&mut transform, target_position, profile.look_at_speed * delta);
        }

        let evaluation = evaluate(profile, distance, los);

        // 4-5. Состояние
        let current_state = brain.state;
        match current_state {
            CombatState::Attacking {
                mode,
                elapsed,
                impact_resolved,
            } => {
                let elapsed = elapsed + delta;
                let impact_due =
                    !impact_resolved && profile.impact_delay.is_some_and(|delay| elapsed >= delay);

                if impact_due {
                    impact_events.write(AttackImpact { attacker: entity });
                }

                if elapsed >= profile.attack_duration && !impact_due {
                    let next = evaluation.settled_state();
                    crate::log(&format!("AI: {:?} Attacking → {:?}", entity, next));
                    brain.state = next;
                } else {
                    brain.state = CombatState::Attacking {
                        mode,
                        elapsed,
                        impact_resolved,
                    };
                }
            }
            current => {
                let next = evaluation.engagement_state();
                if next != current {
                    crate::log(&format!(
                        "AI: {:?} {:?} → {:?} (d = {:.2}m, los = {})",
                        entity, current, next, distance, los
                    ));
                    brain.state = next;
                }
            }
        }

        // 6. Атака
        let inhibited = status.is_some_and(|status| status.is_action_inhibited(ActionTag::Attack));
        if !inhibited && brain.can_trigger_attack(now, profile, &evaluation) {
            if let Some(mode) = evaluation.mode() {
                let attack_index = if rng.rng.gen::<f32>() < profile.attack2_chance { 1 } else { 0 };
                brain.trigger_attack(now, mode, attack_index);

                if let Some(animator) = animator.as_mut() {
                    animator.set_int("AttackIndex", attack_index);
                }
                animation_intents.write(AnimationIntent::trigger(entity, "Attack"));
                triggered_events.write(AttackTriggered {
                    attacker: entity,
                    target: target_entity,
                    mode,
                    attack_index,
                });

                crate::log(&format!(
                    "⚔️ {:?} triggering {:?} attack #{} at {:.2}m",
                    entity, mode, attack_index, distance
                ));
            }
        }

        // 7. Movement intent
        let desired = if brain.state.is_attacking() {
            MovementCommand::Stop
        } else if profile.stationary {
            MovementCommand::Idle
        } else if distance <= profile.sight_range && navmesh.0.can_reach(position, target_position) {
            if let Some(agent) = agent.as_mut() {
                agent.stop_distance = profile.stop_distance(evaluation.ranged);
            }
            MovementCommand::FollowEntity {
                target: target_entity,
            }
        } else {
            MovementCommand::Idle
        };
        set_command(entity, &mut command, desired);

        if !profile.stationary {
            if let Some(animator) = animator.as_mut() {
                animator.set_bool("Backpedal", brain.state == CombatState::Backpedal);
            }
        }
    }
}
