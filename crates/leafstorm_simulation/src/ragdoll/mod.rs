//! Ragdoll transitions: передача тела между анимацией и физикой
//!
//! Архитектура:
//! - `Blow` (event) → enter ragdoll (или перезапуск таймера, если уже лежим)
//! - Enter: навигация + аниматор на паузу, атака прервана, limbs → Dynamic, коллайдеры ON,
//!   импульс в root и `limb_impulse_fraction` в каждый limb (Rapier ExternalImpulse)
//! - Exit (таймер истёк): limbs → KinematicPositionBased, коллайдеры OFF,
//!   root на navmesh, навигация + аниматор ON, recovery анимация, brain → Approaching
//!
//! Порядок в тике: сначала таймеры, потом новые blow (blow перезаписывает таймер).

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::ai::{CombatBrain, CombatProfile, CombatState};
use crate::capabilities::{AnimationIntent, Animator, NavMesh};
use crate::components::{NavigationAgent, PhysicsBody};
use crate::physics::collision;
use crate::CombatSet;

pub mod components;


pub use components::{BlowOutcome, Ragdoll, RagdollState};

/// Event: сдуть entity в ragdoll
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Blow {
    pub entity: Entity,
    pub impulse: Vec3,
    /// Время в ragdoll (без recovery delay)
    pub duration: f32,
}

impl Blow {
    pub fn new(entity: Entity, impulse: Vec3) -> Self {
        Self {
            entity,
            impulse,
            duration: Ragdoll::DEFAULT_BLOW_DURATION,
        }
    }
}

/// Event: entity встал после ragdoll
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct RagdollRecovered {
    pub entity: Entity,
    /// Позиция после reprojection на navmesh
    pub position: Vec3,
}

/// Ragdoll Plugin
pub struct RagdollPlugin;

impl Plugin for RagdollPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<Blow>()
            .add_event::<RagdollRecovered>()
            .add_systems(
                FixedUpdate,
                (tick_ragdolls, process_blow_events)
                    .chain()
                    .in_set(CombatSet::Ragdoll),
            );
    }
}

/// Добавить импульс к ExternalImpulse; без компонента: копим до insert
pub(crate) fn add_impulse(
    impulses: &mut Query<&mut ExternalImpulse>,
    pending: &mut Vec<(Entity, Vec3)>,
    entity: Entity,
    impulse: Vec3,
) {
    if let Ok(mut external) = impulses.get_mut(entity) {
        external.impulse += impulse;
        return;
    }

    match pending.iter_mut().find(|(pending_entity, _)| *pending_entity == entity) {
        Some((_, accumulated)) => *accumulated += impulse,
        None => pending.push((entity, impulse)),
    }
}

/// Система: Blow → enter ragdoll / restart timer
#[allow(clippy::type_complexity)]
pub fn process_blow_events(
    mut commands: Commands,
    mut blows: EventReader<Blow>,
    mut ragdolls: Query<(
        &mut Ragdoll,
        Option<&mut NavigationAgent>,
        Option<&mut Animator>,
        Option<&mut PhysicsBody>,
        Option<&mut CombatBrain>,
    )>,
    mut impulses: Query<&mut ExternalImpulse>,
) {
    let mut pending: Vec<(Entity, Vec3)> = Vec::new();

    for blow in blows.read() {
        let Ok((mut ragdoll, agent, animator, body, brain)) = ragdolls.get_mut(blow.entity) else {
            crate::log_warning(&format!("Blow: {:?} has no Ragdoll, ignored", blow.entity));
            continue;
        };

        let outcome = ragdoll.blow(blow.duration);

        if outcome == BlowOutcome::Entered {
            if let Some(mut agent) = agent {
                agent.enabled = false;
            }
            if let Some(mut animator) = animator {
                animator.enabled = false;
            }
            // Собственная скорость больше не наша: тело у физики
            if let Some(mut body) = body {
                body.velocity = Vec3::ZERO;
            }
            // Начатая атака прерывается: поздний AttackImpact будет отброшен
            if let Some(mut brain) = brain {
                if brain.state.is_attacking() {
                    crate::log(&format!("AI: {:?} attack interrupted by blow", blow.entity));
                }
                brain.state = CombatState::Approaching;
            }

            for &limb in &ragdoll.limbs {
                commands
                    .entity(limb)
                    .insert(RigidBody::Dynamic)
                    .remove::<ColliderDisabled>();
            }

            crate::log(&format!(
                "🍃 {:?} → Ragdolled ({:.2}s + {:.2}s)",
                blow.entity, blow.duration, ragdoll.recovery_delay
            ));
        } else {
            crate::log(&format!(
                "🍃 {:?} blown again, timer restarted ({:.2}s)",
                blow.entity, ragdoll.remaining
            ));
        }

        add_impulse(&mut impulses, &mut pending, blow.entity, blow.impulse);
        let limb_impulse = blow.impulse * ragdoll.limb_impulse_fraction;
        for &limb in &ragdoll.limbs {
            add_impulse(&mut impulses, &mut pending, limb, limb_impulse);
        }
    }

    for (entity, impulse) in pending {
        commands.entity(entity).insert(ExternalImpulse {
            impulse,
            torque_impulse: Vec3::ZERO,
        });
    }
}

/// Система: тик таймеров ragdoll → exit
#[allow(clippy::type_complexity)]
pub fn tick_ragdolls(
    mut commands: Commands,
    mut ragdolls: Query<(
        Entity,
        &mut Ragdoll,
        &mut Transform,
        Option<&mut NavigationAgent>,
        Option<&mut Animator>,
        Option<&mut CombatBrain>,
        Option<&CombatProfile>,
    )>,
    navmesh: Res<NavMesh>,
    time: Res<Time<Fixed>>,
    mut animation_intents: EventWriter<AnimationIntent>,
    mut recovered_events: EventWriter<RagdollRecovered>,
) {
    let delta = time.delta_secs();

    for (entity, mut ragdoll, mut transform, agent, animator, brain, profile) in ragdolls.iter_mut() {
        if !ragdoll.tick(delta) {
            continue;
        }

        // Freeze limbs
        for &limb in &ragdoll.limbs {
            commands
                .entity(limb)
                .insert((RigidBody::KinematicPositionBased, ColliderDisabled));
        }

        // Root обратно на navmesh
        let mut position = transform.translation;
        if !navmesh.0.is_on_mesh(position) {
            match navmesh.0.sample_position(position, ragdoll.navmesh_sample_radius) {
                Some(sampled) => position = sampled,
                None => crate::log_warning(&format!(
                    "Ragdoll {:?}: no navmesh within {:.1}m of {:?}",
                    entity, ragdoll.navmesh_sample_radius, position
                )),
            }
        }
        transform.translation = position;

        // Турель так и стоит без навигации
        if let Some(mut agent) = agent {
            agent.enabled = !profile.is_some_and(|profile| profile.stationary);
        }

        if let Some(mut animator) = animator {
            animator.enabled = true;
            if let Some(tag) = &ragdoll.recover_animation {
                animation_intents.write(AnimationIntent::play(entity, tag));
            }
        }

        if let Some(mut brain) = brain {
            brain.state = CombatState::Approaching;
        }

        recovered_events.write(RagdollRecovered { entity, position });
        crate::log(&format!("🕷️ {:?} recovered from ragdoll at {:?}", entity, position));
    }
}

/// Spawn helper для limb (kinematic, коллайдер выключен до ragdoll)
pub fn spawn_ragdoll_limb(commands: &mut Commands, position: Vec3, radius: f32) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            RigidBody::KinematicPositionBased,
            Collider::ball(radius),
            ColliderDisabled,
            collision::limb_groups(),
        ))
        .id()
}
