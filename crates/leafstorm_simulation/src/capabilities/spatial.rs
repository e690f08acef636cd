//! Spatial queries: raycast + overlap sphere
//!
//! Архитектура:
//! - Core не владеет collision world: только спрашивает через `SpatialQuery`
//! - Host (движок) подставляет свой backend в `SpatialBackend`
//! - Headless режим: `SphereWorld`: простые сферы из `BodyShape` компонентов,
//!   пересобираются каждый тик системой `sync_spatial_backend`

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Форма тела для headless spatial queries (сфера вокруг Transform)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct BodyShape {
    /// Радиус сферы (метры)
    pub radius: f32,
    /// Твёрдая геометрия (стены, акторы). Не-solid = trigger, projectiles пролетают
    pub solid: bool,
    /// Высота центра сферы над Transform (Transform персонажа стоит в ногах)
    #[serde(default)]
    pub offset: f32,
}

impl Default for BodyShape {
    fn default() -> Self {
        Self {
            radius: 0.5,
            solid: true,
            offset: 0.0,
        }
    }
}

impl BodyShape {
    /// Корпус персонажа: сфера на уровне груди
    pub fn character() -> Self {
        Self {
            radius: 0.5,
            solid: true,
            offset: 0.9,
        }
    }
}

/// Snapshot тела в spatial backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialBody {
    pub entity: Entity,
    pub center: Vec3,
    pub radius: f32,
    pub solid: bool,
}

/// Результат raycast: первое тело на луче
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Capability: spatial queries (consumed from collaborator)
pub trait SpatialQuery: Send + Sync + 'static {
    /// Hook для синхронизации тел (engine-backed реализации игнорируют)
    fn refresh(&mut self, _bodies: &[SpatialBody]) {}

    /// Первое тело на луче. Тела, внутри которых стоит origin, не считаются.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;

    /// Все тела, пересекающие сферу
    fn overlap_sphere(&self, origin: Vec3, radius: f32) -> Vec<SpatialBody>;
}

/// Resource: активный spatial backend
#[derive(Resource)]
pub struct SpatialBackend(pub Box<dyn SpatialQuery>);

impl Default for SpatialBackend {
    fn default() -> Self {
        Self(Box::new(SphereWorld::default()))
    }
}

impl SpatialBackend {
    pub fn new(query: impl SpatialQuery) -> Self {
        Self(Box::new(query))
    }

    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.0.raycast(origin, direction, max_distance)
    }

    pub fn overlap_sphere(&self, origin: Vec3, radius: f32) -> Vec<SpatialBody> {
        self.0.overlap_sphere(origin, radius)
    }
}

/// Headless backend: мир из сфер
#[derive(Debug, Clone, Default)]
pub struct SphereWorld {
    bodies: Vec<SpatialBody>,
}

impl SphereWorld {
    pub fn with_bodies(bodies: Vec<SpatialBody>) -> Self {
        Self { bodies }
    }

    pub fn bodies(&self) -> &[SpatialBody] {
        &self.bodies
    }
}

impl SpatialQuery for SphereWorld {
    fn refresh(&mut self, bodies: &[SpatialBody]) {
        self.bodies.clear();
        self.bodies.extend_from_slice(bodies);
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let mut nearest: Option<RayHit> = None;

        for body in &self.bodies {
            let oc = origin - body.center;
            let c = oc.length_squared() - body.radius * body.radius;
            if c <= 0.0 {
                // origin внутри тела (например, сам стреляющий)
                continue;
            }

            let b = oc.dot(dir);
            let discriminant = b * b - c;
            if discriminant < 0.0 {
                continue;
            }

            let t = -b - discriminant.sqrt();
            if t < 0.0 || t > max_distance {
                continue;
            }

            if nearest.map_or(true, |hit| t < hit.distance) {
                nearest = Some(RayHit {
                    entity: body.entity,
                    point: origin + dir * t,
                    distance: t,
                });
            }
        }

        nearest
    }

    fn overlap_sphere(&self, origin: Vec3, radius: f32) -> Vec<SpatialBody> {
        self.bodies
            .iter()
            .filter(|body| body.center.distance(origin) <= radius + body.radius)
            .copied()
            .collect()
    }
}

/// Line of sight: луч с высоты глаз (+0.5m) в сторону цели свободен,
/// либо первым попали в саму цель.
///
/// Луч параллелен from → to (на ноги цели не опускается).
/// За пределами sight_range видимости нет.
pub fn has_line_of_sight(
    spatial: &SpatialBackend,
    from: Vec3,
    to: Vec3,
    target: Entity,
    sight_range: f32,
) -> bool {
    let to_target = to - from;
    let distance = to_target.length();
    if distance > sight_range {
        return false;
    }
    if distance <= f32::EPSILON {
        return true;
    }

    let eye = from + Vec3::Y * 0.5;
    match spatial.raycast(eye, to_target, distance) {
        None => true,
        Some(hit) => hit.entity == target,
    }
}

/// Система: пересобрать headless spatial backend из BodyShape
///
/// Сортируем по Entity index: порядок тел влияет на tie-break в raycast.
pub fn sync_spatial_backend(
    bodies: Query<(Entity, &Transform, &BodyShape)>,
    mut backend: ResMut<SpatialBackend>,
) {
    let mut snapshot: Vec<SpatialBody> = bodies
        .iter()
        .map(|(entity, transform, shape)| SpatialBody {
            entity,
            center: transform.translation + Vec3::Y * shape.offset,
            radius: shape.radius,
            solid: shape.solid,
        })
        .collect();
    snapshot.sort_by_key(|body| body.entity.index());

    backend.0.refresh(&snapshot);
}
