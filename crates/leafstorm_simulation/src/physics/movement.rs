//! Kinematic контроллер для врагов/игрока
//!
//! Архитектура:
//! - Rapier для коллизий (RigidBody::KinematicPositionBased)
//! - Custom velocity integration (не используем Rapier forces)
//! - velocity = intrinsic × speed multiplier + external (knockback)
//! - Ragdolled entities не двигаются контроллером (тело у физики)
//!
//! Детерминизм: fixed timestep (60Hz)

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::capabilities::Animator;
use crate::components::{ExternalVelocity, PhysicsBody};
use crate::ragdoll::Ragdoll;
use crate::status::StatusEffects;
use crate::CombatSettings;

use super::collision;

/// Высота пола в headless режиме
pub const GROUND_HEIGHT: f32 = 0.0;

/// Kinematic контроллер компонент
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct KinematicController {
    /// Скорость движения (m/s)
    pub move_speed: f32,
    /// Сила гравитации (m/s²)
    pub gravity: f32,
    /// На земле ли персонаж (refill зарядов blower, гравитация)
    pub grounded: bool,
}

impl Default for KinematicController {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            gravity: -9.81,
            grounded: false,
        }
    }
}

/// Входные данные для движения
///
/// Игрок: заполняется host'ом из input. Враги: `steer_navigation_agents`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct MovementInput {
    /// Направление движения (горизонтальное, normalized)
    pub direction: Vec3,
}

/// Итоговая скорость: intrinsic × multiplier + external
///
/// Горизонталь: `dir·move_speed·multiplier + external.xz`.
/// Вертикаль: external.y перекрывает собственную, если `|external.y| > threshold`.
pub fn compose_velocity(
    input_direction: Vec3,
    move_speed: f32,
    speed_multiplier: f32,
    external: Vec3,
    current_vertical: f32,
    vertical_threshold: f32,
) -> Vec3 {
    let planar = Vec3::new(input_direction.x, 0.0, input_direction.z);
    let direction = if planar.length_squared() > 0.01 {
        planar.normalize()
    } else {
        Vec3::ZERO
    };

    let intrinsic = direction * move_speed * speed_multiplier;
    let vertical = if external.y.abs() > vertical_threshold {
        external.y
    } else {
        current_vertical
    };

    Vec3::new(intrinsic.x + external.x, vertical, intrinsic.z + external.z)
}

fn is_ragdolled(ragdoll: Option<&Ragdoll>) -> bool {
    ragdoll.is_some_and(|ragdoll| ragdoll.is_ragdolled())
}

/// Система ground detection через простую Y-проверку
///
/// Stub для headless: пол на y = 0, Transform стоит в ногах.
pub fn ground_detection(mut query: Query<(&Transform, &PhysicsBody, &mut KinematicController)>) {
    for (transform, body, mut controller) in query.iter_mut() {
        controller.grounded =
            transform.translation.y <= GROUND_HEIGHT + 0.01 && body.velocity.y <= 0.0;
    }
}

/// Система применения движения: input + slow + knockback → velocity
pub fn apply_movement_input(
    mut query: Query<(
        &KinematicController,
        &MovementInput,
        &mut PhysicsBody,
        Option<&StatusEffects>,
        Option<&ExternalVelocity>,
        Option<&Ragdoll>,
        Option<&mut Animator>,
    )>,
    settings: Res<CombatSettings>,
) {
    for (controller, input, mut body, status, external, ragdoll, animator) in query.iter_mut() {
        if is_ragdolled(ragdoll) {
            continue;
        }

        let multiplier = status.map_or(1.0, |status| status.speed_multiplier());
        let external = external.map_or(Vec3::ZERO, |external| external.0);

        body.velocity = compose_velocity(
            input.direction,
            controller.move_speed,
            multiplier,
            external,
            body.velocity.y,
            settings.vertical_override_threshold,
        );

        if let Some(mut animator) = animator {
            if animator.enabled {
                animator.set_float("Speed", Vec2::new(body.velocity.x, body.velocity.z).length());
            }
        }
    }
}

/// Система применения gravity к velocity
pub fn apply_gravity(
    mut query: Query<(&KinematicController, &mut PhysicsBody, Option<&Ragdoll>)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (controller, mut body, ragdoll) in query.iter_mut() {
        if is_ragdolled(ragdoll) {
            continue;
        }
        if !controller.grounded {
            body.velocity.y += controller.gravity * delta;
        }
    }
}

/// Система интеграции velocity → Transform (headless режим, без Rapier step)
///
/// Пол не проваливаем: y < 0 → y = 0, падение гасим.
pub fn integrate_velocity_to_transform(
    mut query: Query<(&mut PhysicsBody, &mut Transform, Option<&Ragdoll>), With<KinematicController>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut body, mut transform, ragdoll) in query.iter_mut() {
        if is_ragdolled(ragdoll) {
            continue;
        }

        transform.translation += body.velocity * delta;

        if transform.translation.y < GROUND_HEIGHT {
            transform.translation.y = GROUND_HEIGHT;
            body.velocity.y = body.velocity.y.max(0.0);
        }
    }
}

/// Система синхронизации velocity с Rapier (host с полной физикой)
pub fn sync_velocity_to_rapier(
    mut query: Query<(&PhysicsBody, &mut Velocity), With<KinematicController>>,
) {
    for (body, mut rapier_velocity) in query.iter_mut() {
        rapier_velocity.linvel = body.velocity;
    }
}

/// Система затухания внешней скорости (exp decay)
pub fn decay_external_velocity(
    mut query: Query<&mut ExternalVelocity>,
    settings: Res<CombatSettings>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for mut external in query.iter_mut() {
        if external.is_zero() {
            continue;
        }
        external.decay(settings.knockback_decay_rate, delta);
    }
}

/// Plugin для kinematic контроллера
///
/// Регистрирует системы в CombatSet::Motion (после steering).
pub struct KinematicControllerPlugin;

impl Plugin for KinematicControllerPlugin {
    fn build(&self, app: &mut App) {
        use bevy_rapier3d::plugin::PhysicsSet;

        app.add_systems(
            FixedUpdate,
            (
                ground_detection,
                apply_movement_input,
                apply_gravity,
                integrate_velocity_to_transform,
                sync_velocity_to_rapier,
                decay_external_velocity,
            )
                .chain()
                .in_set(crate::CombatSet::Motion)
                .after(crate::capabilities::steer_navigation_agents)
                .before(PhysicsSet::SyncBackend),
        );
    }
}

/// Spawn helper для создания kinematic персонажа
///
/// Создает entity с полным набором компонентов:
/// - Transform
/// - PhysicsBody + ExternalVelocity + StatusEffects
/// - KinematicController + MovementInput
/// - Rapier: RigidBody + Collider (capsule) + Velocity
pub fn spawn_kinematic_character(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            PhysicsBody::default(),
            ExternalVelocity::default(),
            StatusEffects::default(),
            KinematicController::default(),
            MovementInput::default(),
            crate::capabilities::BodyShape::character(),
            // Rapier physics
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(0.5, 0.4),
            Velocity::default(),
            collision::actor_groups(),
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_applies_speed_multiplier() {
        let velocity = compose_velocity(Vec3::Z, 5.0, 0.5, Vec3::ZERO, 0.0, 0.1);

        assert!((velocity.z - 2.5).abs() < 1e-5, "velocity.z = {}", velocity.z);
        assert_eq!(velocity.x, 0.0);
    }

    #[test]
    fn test_compose_adds_external_horizontal() {
        let velocity = compose_velocity(Vec3::X, 5.0, 1.0, Vec3::new(-3.0, 0.0, 2.0), 0.0, 0.1);

        assert!((velocity.x - 2.0).abs() < 1e-5);
        assert!((velocity.z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_compose_vertical_override_threshold() {
        // |external.y| > 0.1 → перекрывает
        let launched = compose_velocity(Vec3::ZERO, 5.0, 1.0, Vec3::new(0.0, 4.0, 0.0), -1.0, 0.1);
        assert_eq!(launched.y, 4.0);

        // Ниже порога → собственная вертикаль
        let settled = compose_velocity(Vec3::ZERO, 5.0, 1.0, Vec3::new(0.0, 0.05, 0.0), -1.0, 0.1);
        assert_eq!(settled.y, -1.0);
    }

    #[test]
    fn test_compose_ignores_tiny_input() {
        let velocity = compose_velocity(Vec3::new(0.05, 0.0, 0.0), 5.0, 1.0, Vec3::ZERO, 0.0, 0.1);
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn test_gravity_pulls_only_airborne_bodies() {
        let mut time = Time::<Fixed>::default();
        time.advance_by(std::time::Duration::from_secs_f64(1.0 / 60.0));

        let mut app = App::new();
        app.insert_resource(time).add_systems(Update, apply_gravity);

        let airborne = app
            .world_mut()
            .spawn((KinematicController::default(), PhysicsBody::default()))
            .id();
        let grounded = app
            .world_mut()
            .spawn((
                KinematicController {
                    grounded: true,
                    ..default()
                },
                PhysicsBody::default(),
            ))
            .id();
        let mut ragdoll = Ragdoll::new(Vec::new());
        ragdoll.blow(0.8);
        let ragdolled = app
            .world_mut()
            .spawn((KinematicController::default(), PhysicsBody::default(), ragdoll))
            .id();

        app.update();

        // После 1/60 sec: velocity.y = -9.81 / 60 ≈ -0.1635
        let fall = app.world().get::<PhysicsBody>(airborne).expect("body").velocity.y;
        assert!(fall < -0.16 && fall > -0.17, "fall = {}", fall);

        assert_eq!(app.world().get::<PhysicsBody>(grounded).expect("body").velocity.y, 0.0);
        // Тело у физики: контроллер не трогает
        assert_eq!(app.world().get::<PhysicsBody>(ragdolled).expect("body").velocity.y, 0.0);
    }
}
