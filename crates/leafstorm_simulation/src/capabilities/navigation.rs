//! Navigation capability: reachability, steering, navmesh sampling
//!
//! Path planning: внешний collaborator. Core только спрашивает:
//! достижима ли точка, куда шагать, где ближайшая точка на navmesh.
//! Headless режим: `FlatNavMesh`: плоскость y = ground_height.

use bevy::prelude::*;

use crate::components::{MovementCommand, NavigationAgent};
use crate::physics::MovementInput;

/// Capability: navigation queries
pub trait NavMeshQuery: Send + Sync + 'static {
    /// Можно ли дойти от `from` до `to`
    fn can_reach(&self, from: Vec3, to: Vec3) -> bool;

    /// Направление следующего шага (unit или ZERO, если шагать некуда)
    fn steer_toward(&self, from: Vec3, to: Vec3) -> Vec3;

    /// Ближайшая точка navmesh в радиусе `max_distance`
    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3>;

    fn is_on_mesh(&self, point: Vec3) -> bool;
}

/// Resource: активный navmesh backend
#[derive(Resource)]
pub struct NavMesh(pub Box<dyn NavMeshQuery>);

impl Default for NavMesh {
    fn default() -> Self {
        Self(Box::new(FlatNavMesh::default()))
    }
}

impl NavMesh {
    pub fn new(query: impl NavMeshQuery) -> Self {
        Self(Box::new(query))
    }
}

/// Headless navmesh: бесконечная (или квадратная) плоскость
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatNavMesh {
    pub ground_height: f32,
    /// Допуск по высоте для `is_on_mesh`
    pub tolerance: f32,
    /// Половина стороны квадрата арены (None = бесконечная плоскость)
    pub half_extent: Option<f32>,
}

impl Default for FlatNavMesh {
    fn default() -> Self {
        Self {
            ground_height: 0.0,
            tolerance: 0.05,
            half_extent: None,
        }
    }
}

impl FlatNavMesh {
    pub fn bounded(half_extent: f32) -> Self {
        Self {
            half_extent: Some(half_extent),
            ..default()
        }
    }

    fn within_bounds(&self, point: Vec3) -> bool {
        match self.half_extent {
            Some(extent) => point.x.abs() <= extent && point.z.abs() <= extent,
            None => true,
        }
    }

    fn project(&self, point: Vec3) -> Vec3 {
        let (x, z) = match self.half_extent {
            Some(extent) => (point.x.clamp(-extent, extent), point.z.clamp(-extent, extent)),
            None => (point.x, point.z),
        };
        Vec3::new(x, self.ground_height, z)
    }
}

impl NavMeshQuery for FlatNavMesh {
    fn can_reach(&self, from: Vec3, to: Vec3) -> bool {
        // Цель в прыжке над ареной тоже достижима
        self.within_bounds(from) && self.within_bounds(to)
    }

    fn steer_toward(&self, from: Vec3, to: Vec3) -> Vec3 {
        Vec3::new(to.x - from.x, 0.0, to.z - from.z).normalize_or_zero()
    }

    fn sample_position(&self, point: Vec3, max_distance: f32) -> Option<Vec3> {
        let projected = self.project(point);
        (projected.distance(point) <= max_distance).then_some(projected)
    }

    fn is_on_mesh(&self, point: Vec3) -> bool {
        self.within_bounds(point) && (point.y - self.ground_height).abs() <= self.tolerance
    }
}

/// Система: MovementCommand → MovementInput (headless navigation collaborator)
///
/// Выключенный агент стоит. Внутри stop_distance: стоим.
pub fn steer_navigation_agents(
    mut agents: Query<(Entity, &NavigationAgent, &MovementCommand, &mut MovementInput)>,
    transforms: Query<&Transform>,
    navmesh: Res<NavMesh>,
) {
    for (entity, agent, command, mut input) in agents.iter_mut() {
        input.direction = Vec3::ZERO;

        if !agent.enabled {
            continue;
        }

        let Ok(transform) = transforms.get(entity) else {
            continue;
        };
        let position = transform.translation;

        let goal = match command {
            MovementCommand::Idle | MovementCommand::Stop => continue,
            MovementCommand::MoveToPosition { target } => *target,
            MovementCommand::FollowEntity { target } => {
                let Ok(target_transform) = transforms.get(*target) else {
                    continue;
                };
                target_transform.translation
            }
        };

        let planar_distance = Vec2::new(goal.x - position.x, goal.z - position.z).length();
        if planar_distance <= agent.stop_distance {
            continue;
        }

        input.direction = navmesh.0.steer_toward(position, goal);
    }
}
