//! Knockback: общий для всех атакующих канал внешней скорости
//!
//! Архитектура:
//! - `resolve_knockback`: чистая геометрия (impact, source, magnitude, bias)
//! - `KnockbackRequest` (event): единственный writer ExternalVelocity
//!   - FromImpact: геометрический удар, ЗАМЕНЯЕТ внешнюю скорость
//!   - Launch: готовый вектор (self-launch), ДОБАВЛЯЕТСЯ к внешней скорости
//! - Враги с `knockback_recovery` уходят в KnockedBack (навигация на паузе)

use bevy::prelude::*;

use crate::ai::{CombatBrain, CombatProfile, CombatState};
use crate::components::{ExternalVelocity, NavigationAgent};
use crate::CombatSet;

pub mod resolver;


pub use resolver::resolve_knockback;

/// Event: запрос на knockback
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum KnockbackRequest {
    /// Удар от source в точку impact (заменяет текущую внешнюю скорость)
    FromImpact {
        target: Entity,
        impact_point: Vec3,
        source_point: Vec3,
        magnitude: f32,
        upward_bias: f32,
    },
    /// Готовый вектор скорости (прибавляется к текущей)
    Launch { target: Entity, velocity: Vec3 },
}

impl KnockbackRequest {
    pub fn target(&self) -> Entity {
        match self {
            Self::FromImpact { target, .. } | Self::Launch { target, .. } => *target,
        }
    }
}

/// Knockback Plugin
pub struct KnockbackPlugin;

impl Plugin for KnockbackPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<KnockbackRequest>()
            .add_systems(FixedUpdate, apply_knockback_requests.in_set(CombatSet::Apply));
    }
}

/// Система: KnockbackRequest → ExternalVelocity (+ KnockedBack для врагов)
pub fn apply_knockback_requests(
    mut requests: EventReader<KnockbackRequest>,
    mut bodies: Query<&mut ExternalVelocity>,
    mut brains: Query<(&mut CombatBrain, &CombatProfile, Option<&mut NavigationAgent>)>,
) {
    for request in requests.read() {
        let target = request.target();

        let Ok(mut external) = bodies.get_mut(target) else {
            crate::log_warning(&format!(
                "KnockbackRequest: {:?} has no ExternalVelocity, ignored",
                target
            ));
            continue;
        };

        match *request {
            KnockbackRequest::FromImpact {
                impact_point,
                source_point,
                magnitude,
                upward_bias,
                ..
            } => {
                external.0 = resolve_knockback(impact_point, source_point, magnitude, upward_bias);
                crate::log(&format!("💥 {:?} knocked back → {:?}", target, external.0));
            }
            KnockbackRequest::Launch { velocity, .. } => {
                external.0 += velocity;
                crate::log(&format!("🚀 {:?} launched (+{:?}) → {:?}", target, velocity, external.0));
            }
        }

        // Chaser враги: пауза навигации на время восстановления
        let Ok((mut brain, profile, agent)) = brains.get_mut(target) else {
            continue;
        };
        let Some(recovery) = profile.knockback_recovery else {
            continue;
        };

        brain.state = CombatState::KnockedBack { timer: recovery };
        if let Some(mut agent) = agent {
            agent.enabled = false;
        }
        crate::log(&format!("🍄 {:?} → KnockedBack ({:.2}s)", target, recovery));
    }
}
