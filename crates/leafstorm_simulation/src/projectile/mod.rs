//! Projectile lifecycle: spawn → полёт → hit / terrain / timeout
//!
//! Архитектура:
//! - Каждый тик: retired: ничего; lifetime истёк: Expired (без payload);
//!   иначе сдвиг + overlap query на радиусе снаряда
//! - Цель (StatusEffects, другая фракция) → StatusApplied + Hit
//! - Твёрдая геометрия чужой фракции → Terrain, свою фракцию пролетаем
//! - Не больше одного разрешения: флаг `retired` + despawn

use bevy::prelude::*;

use crate::capabilities::SpatialBackend;
use crate::components::Actor;
use crate::status::{StatusApplied, StatusEffects};
use crate::CombatSet;

pub mod components;


pub use components::{Projectile, RetireReason};

/// Event: projectile убран
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ProjectileRetired {
    pub projectile: Entity,
    pub reason: RetireReason,
    /// Кого задели (Hit / Terrain)
    pub contact: Option<Entity>,
    pub position: Vec3,
}

/// Projectile Plugin
pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ProjectileRetired>().add_systems(
            FixedUpdate,
            advance_projectiles
                .in_set(CombatSet::Resolve)
                .before(crate::ai::resolve_attack_impacts),
        );
    }
}

/// Spawn helper: projectile в точке origin
pub fn spawn_projectile(commands: &mut Commands, origin: Vec3, projectile: Projectile) -> Entity {
    commands
        .spawn((Transform::from_translation(origin), projectile))
        .id()
}

/// Система: полёт, контакты, timeout
pub fn advance_projectiles(
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    bodies: Query<(Option<&Actor>, Has<StatusEffects>)>,
    spatial: Res<SpatialBackend>,
    time: Res<Time<Fixed>>,
    mut status_events: EventWriter<StatusApplied>,
    mut retired_events: EventWriter<ProjectileRetired>,
) {
    let delta = time.delta_secs();
    let now = time.elapsed_secs();

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        if projectile.retired {
            continue;
        }

        let (reason, contact) = if projectile.is_expired(now) {
            (RetireReason::Expired, None)
        } else {
            transform.translation = projectile.step(transform.translation, delta);

            let mut terrain = None;
            let mut hit = None;
            for body in spatial.overlap_sphere(transform.translation, projectile.radius) {
                let (faction, accepts_status) = bodies
                    .get(body.entity)
                    .map(|(actor, has_status)| (actor.map(|actor| actor.faction_id), has_status))
                    .unwrap_or((None, false));

                match projectile.classify_contact(&body, faction, accepts_status) {
                    Some(RetireReason::Hit) => {
                        hit = Some(body.entity);
                        break;
                    }
                    Some(RetireReason::Terrain) if terrain.is_none() => terrain = Some(body.entity),
                    _ => {}
                }
            }

            match (hit, terrain) {
                (Some(target), _) => (RetireReason::Hit, Some(target)),
                (None, Some(wall)) => (RetireReason::Terrain, Some(wall)),
                (None, None) => continue,
            }
        };

        if !projectile.retire() {
            continue;
        }

        if reason == RetireReason::Hit {
            if let (Some(target), Some(payload)) = (contact, projectile.payload) {
                status_events.write(StatusApplied {
                    target,
                    effect: payload,
                });
            }
        }

        crate::log(&format!(
            "🎯 Projectile {:?} retired: {:?} (contact {:?})",
            entity, reason, contact
        ));

        retired_events.write(ProjectileRetired {
            projectile: entity,
            reason,
            contact,
            position: transform.translation,
        });
        commands.entity(entity).despawn();
    }
}
