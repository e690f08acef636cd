//! Collision groups для Rapier (host с полной физикой)
//!
//! - Actors: коллайдят с геометрией и друг с другом
//! - Ragdoll limbs: только с геометрией (не толкают своего же root)

use bevy_rapier3d::prelude::*;

pub const ENVIRONMENT: Group = Group::GROUP_1;
pub const ACTORS: Group = Group::GROUP_2;
pub const LIMBS: Group = Group::GROUP_3;

pub fn actor_groups() -> CollisionGroups {
    CollisionGroups::new(ACTORS, ENVIRONMENT | ACTORS)
}

pub fn limb_groups() -> CollisionGroups {
    CollisionGroups::new(LIMBS, ENVIRONMENT)
}
