//! Target assignment: default target из PlayerRegistry (один раз на спавне brain)

use bevy::prelude::*;

use crate::ai::{CombatBrain, CombatProfile, CombatTarget};
use crate::components::{NavigationAgent, PlayerRegistry};

/// System: новому brain без цели: игрок из registry
///
/// Турели сразу выключают навигацию.
pub fn assign_default_targets(
    mut brains: Query<
        (Entity, &mut CombatTarget, &CombatProfile, Option<&mut NavigationAgent>),
        Added<CombatBrain>,
    >,
    registry: Res<PlayerRegistry>,
) {
    for (entity, mut target, profile, agent) in brains.iter_mut() {
        if profile.stationary {
            if let Some(mut agent) = agent {
                agent.enabled = false;
            }
        }

        if target.0.is_some() {
            continue;
        }

        match registry.primary {
            Some(player) => {
                target.0 = Some(player);
                crate::log(&format!("🎯 {:?} default target → player {:?}", entity, player));
            }
            None => {
                crate::log_warning(&format!("{:?}: no player registered, brain stays idle", entity));
            }
        }
    }
}
