//! Projectile component + чистая логика lifetime / контактов

use bevy::prelude::*;

use crate::capabilities::SpatialBody;
use crate::status::StatusEffect;

/// Почему projectile убран
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum RetireReason {
    /// Попал в цель (payload доставлен)
    Hit,
    /// Врезался в твёрдую геометрию
    Terrain,
    /// Истёк lifetime
    Expired,
}

/// Летящий снаряд (spider spit)
///
/// Летит прямо с постоянной скоростью. Разрешается не больше одного раза.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    /// Направление (unit)
    pub direction: Vec3,
    pub speed: f32,
    pub spawn_time: f32,
    pub lifetime: f32,
    /// Радиус overlap проверки
    pub radius: f32,
    pub payload: Option<StatusEffect>,
    pub source: Entity,
    /// Фракция стрелявшего (свою не бьём)
    pub source_faction: Option<u64>,
    pub retired: bool,
}

impl Projectile {
    pub const DEFAULT_RADIUS: f32 = 0.2;

    /// Нулевое направление → летим вперёд (-Z)
    pub fn new(
        direction: Vec3,
        speed: f32,
        lifetime: f32,
        payload: Option<StatusEffect>,
        source: Entity,
        now: f32,
    ) -> Self {
        Self {
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Z),
            speed,
            spawn_time: now,
            lifetime,
            radius: Self::DEFAULT_RADIUS,
            payload,
            source,
            source_faction: None,
            retired: false,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_faction(mut self, faction_id: Option<u64>) -> Self {
        self.source_faction = faction_id;
        self
    }

    /// now ≥ spawn + lifetime
    pub fn is_expired(&self, now: f32) -> bool {
        now >= self.spawn_time + self.lifetime
    }

    /// Позиция через dt
    pub fn step(&self, position: Vec3, dt: f32) -> Vec3 {
        position + self.direction * self.speed * dt
    }

    /// Что значит касание тела: None: пролетаем насквозь
    pub fn classify_contact(
        &self,
        body: &SpatialBody,
        body_faction: Option<u64>,
        accepts_status: bool,
    ) -> Option<RetireReason> {
        if body.entity == self.source {
            return None;
        }
        if body_faction.is_some() && body_faction == self.source_faction {
            return None;
        }
        if accepts_status {
            return Some(RetireReason::Hit);
        }
        if body.solid {
            return Some(RetireReason::Terrain);
        }
        None
    }

    /// Пометить retired. false: уже был разрешён
    pub fn retire(&mut self) -> bool {
        if self.retired {
            return false;
        }
        self.retired = true;
        true
    }
}
