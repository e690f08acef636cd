//! Player tools
//!
//! Сейчас только leaf blower: непрерывный поток, charged blast + self-launch.

use bevy::prelude::*;

use crate::CombatSet;

pub mod blower;


pub use blower::{update_blower, BlastVolume, Blowable, BlowerFired, BlowerInput, BlowerTool};

/// Blower Plugin
///
/// update_blower в CombatSet::Decision (после FSM врагов): KnockbackRequest
/// применяется в Apply этого тика, Blow подхватывает ragdoll на следующем.
pub struct BlowerPlugin;

impl Plugin for BlowerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BlowerFired>()
            .add_systems(
                FixedUpdate,
                update_blower
                    .in_set(CombatSet::Decision)
                    .after(crate::ai::combat_decision),
            );
    }
}
