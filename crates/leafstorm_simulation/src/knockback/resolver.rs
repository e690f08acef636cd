//! Геометрия knockback: направление удара + upward bias

use bevy::prelude::*;

/// Вектор knockback от source к impact point
///
/// `dir = normalize(impact − source)`, `dir.y += upward_bias`, renormalize, `× magnitude`.
/// Совпадающие точки (или bias, обнуливший направление) → строго вверх.
pub fn resolve_knockback(
    impact_point: Vec3,
    source_point: Vec3,
    magnitude: f32,
    upward_bias: f32,
) -> Vec3 {
    let mut direction = (impact_point - source_point).normalize_or_zero();
    if direction == Vec3::ZERO {
        direction = Vec3::Y;
    }

    direction.y += upward_bias;

    let direction = direction.try_normalize().unwrap_or(Vec3::Y);
    direction * magnitude
}
