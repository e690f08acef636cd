//! Leaf blower: зарядка, charged blast, self-launch
//!
//! - Держим charging → charge растёт до max_charge
//! - Отпустили с charge > 0.01 и зарядами → blast:
//!   recoil игроку (Launch, прибавляется), Blow всем ragdoll в конусе,
//!   knockback остальным врагам, -1 заряд
//! - Держим blowing → непрерывный поток: каждый тик толкаем Blowable и
//!   лежащие ragdoll в том же объёме на blow_force (без отдачи, без зарядов)
//! - Приземлились → заряды восстановлены
//! - Inhibit(LeafBlower) → ввод игнорируется, заряд сбрасывается

use bevy::prelude::*;
use bevy_rapier3d::prelude::ExternalImpulse;
use serde::{Deserialize, Serialize};

use crate::ai::{CombatBrain, CombatProfile};
use crate::capabilities::{SpatialBackend, SpatialBody};
use crate::knockback::KnockbackRequest;
use crate::physics::KinematicController;
use crate::ragdoll::{add_impulse, Blow, Ragdoll};
use crate::status::{ActionTag, StatusEffects};
use crate::CombatSettings;

/// Параметры и состояние leaf blower
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct BlowerTool {
    /// Текущий заряд [0, max_charge]
    pub charge: f32,
    pub max_charge: f32,
    /// Прирост заряда в секунду
    pub charge_rate: f32,
    /// Сколько blast'ов осталось до приземления
    pub charges: u32,
    pub max_charges: u32,
    /// Сила отдачи (меньше: слабее запуск)
    pub recoil_multiplier: f32,
    /// Базовый импульс blast
    pub blow_force: f32,
    /// Длина конуса (метры)
    pub blow_range: f32,
    /// Радиус конуса (метры)
    pub blow_radius: f32,
    /// Смещение сопла вправо от центра игрока
    pub nozzle_offset: f32,
    #[serde(skip)]
    was_charging: bool,
    #[serde(skip)]
    was_grounded: bool,
}

impl Default for BlowerTool {
    fn default() -> Self {
        Self {
            charge: 0.0,
            max_charge: 2.0,
            charge_rate: 1.2, // 0.02 за тик при 60Hz
            charges: 2,
            max_charges: 2,
            recoil_multiplier: 0.3,
            blow_force: 10.0,
            blow_range: 5.0,
            blow_radius: 1.0,
            nozzle_offset: 0.75,
            was_charging: false,
            was_grounded: true,
        }
    }
}

impl BlowerTool {
    /// Минимальный заряд для выстрела
    pub const MIN_FIRE_CHARGE: f32 = 0.01;

    pub fn charge_percent(&self) -> f32 {
        if self.max_charge <= 0.0 {
            return 0.0;
        }
        (self.charge / self.max_charge).clamp(0.0, 1.0)
    }

    /// Тик ввода. Some(charge): выстрел на отпускании
    pub fn update(&mut self, charging: bool, inhibited: bool, dt: f32) -> Option<f32> {
        if inhibited {
            self.charge = 0.0;
            self.was_charging = false;
            return None;
        }

        if charging {
            if self.charges > 0 {
                self.charge = (self.charge + self.charge_rate * dt).min(self.max_charge);
            }
            self.was_charging = true;
            return None;
        }

        if !self.was_charging {
            return None;
        }
        self.was_charging = false;

        let charge = self.charge;
        self.charge = 0.0;
        if charge > Self::MIN_FIRE_CHARGE && self.charges > 0 {
            self.charges -= 1;
            return Some(charge);
        }
        None
    }

    /// Приземление (переход air → ground) восстанавливает заряды. true: восстановили
    pub fn update_grounded(&mut self, grounded: bool) -> bool {
        let landed = grounded && !self.was_grounded;
        self.was_grounded = grounded;

        if landed && self.charges < self.max_charges {
            self.charges = self.max_charges;
            return true;
        }
        false
    }

    /// Импульс blast: blow_force × (1 + 3 × charge%)
    pub fn blast_strength(&self, charge: f32) -> f32 {
        let percent = if self.max_charge > 0.0 {
            (charge / self.max_charge).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.blow_force * (1.0 + percent * 3.0)
    }

    /// Отдача игроку: против прицела, charge × 10 × recoil_multiplier
    pub fn recoil_velocity(&self, aim: Vec3, charge: f32) -> Vec3 {
        -aim.normalize_or_zero() * charge * 10.0 * self.recoil_multiplier
    }
}

/// Ввод blower (host заполняет из мыши/камеры)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct BlowerInput {
    /// Направление прицела (камера forward)
    pub aim: Vec3,
    /// Зажата кнопка зарядки
    pub charging: bool,
    /// Зажата кнопка непрерывного потока
    pub blowing: bool,
}

impl Default for BlowerInput {
    fn default() -> Self {
        Self {
            aim: Vec3::NEG_Z,
            charging: false,
            blowing: false,
        }
    }
}

/// Лёгкий физический предмет (листья, ящики): его сдувает непрерывный поток
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Blowable;

/// Event: charged blast выстрелил
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct BlowerFired {
    pub player: Entity,
    pub charge: f32,
    /// Сколько entity задело
    pub affected: u32,
    pub charges_left: u32,
}

/// Геометрия конуса (sphere cast): сегмент от origin вдоль aim на range, радиус radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlastVolume {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
    /// Откуда толкаем (сопло)
    pub nozzle: Vec3,
}

impl BlastVolume {
    pub fn new(position: Vec3, aim: Vec3, tool: &BlowerTool) -> Self {
        let aim = aim.try_normalize().unwrap_or(Vec3::NEG_Z);
        let right = aim.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);
        let nozzle = position + right * tool.nozzle_offset;
        let start = position + aim * 2.0 + right * tool.nozzle_offset;

        Self {
            start,
            end: start + aim * tool.blow_range,
            radius: tool.blow_radius,
            nozzle,
        }
    }

    /// Тело радиуса body_radius пересекает объём
    pub fn contains(&self, center: Vec3, body_radius: f32) -> bool {
        let segment = self.end - self.start;
        let length_squared = segment.length_squared();
        let t = if length_squared > f32::EPSILON {
            ((center - self.start).dot(segment) / length_squared).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = self.start + segment * t;
        closest.distance(center) <= self.radius + body_radius
    }

    /// Направление толчка: от сопла к телу
    pub fn push_direction(&self, center: Vec3, aim: Vec3) -> Vec3 {
        (center - self.nozzle)
            .try_normalize()
            .unwrap_or_else(|| aim.normalize_or_zero())
    }

    /// Радиус сферы, покрывающей весь объём (для broad phase)
    fn bounding_radius(&self) -> f32 {
        self.start.distance(self.end) * 0.5 + self.radius
    }

    fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    /// Тела внутри объёма (кроме exclude)
    pub fn bodies(&self, spatial: &SpatialBackend, exclude: Entity) -> Vec<SpatialBody> {
        spatial
            .overlap_sphere(self.center(), self.bounding_radius())
            .into_iter()
            .filter(|body| body.entity != exclude && self.contains(body.center, body.radius))
            .collect()
    }
}

/// Upward bias knockback'а врагов без ragdoll
const BLAST_UPWARD_BIAS: f32 = 0.3;

/// System: ввод blower → непрерывный поток + charged blast
#[allow(clippy::type_complexity, clippy::too_many_arguments)]
pub fn update_blower(
    mut commands: Commands,
    mut players: Query<(
        Entity,
        &mut BlowerTool,
        &BlowerInput,
        &Transform,
        Option<&StatusEffects>,
        Option<&KinematicController>,
    )>,
    victims: Query<(
        &Transform,
        Option<&Ragdoll>,
        Has<CombatBrain>,
        Option<&CombatProfile>,
        Has<Blowable>,
    )>,
    mut impulses: Query<&mut ExternalImpulse>,
    spatial: Res<SpatialBackend>,
    settings: Res<CombatSettings>,
    time: Res<Time<Fixed>>,
    mut knockback_events: EventWriter<KnockbackRequest>,
    mut blow_events: EventWriter<Blow>,
    mut fired_events: EventWriter<BlowerFired>,
) {
    let delta = time.delta_secs();
    let mut pending: Vec<(Entity, Vec3)> = Vec::new();

    for (player, mut tool, input, transform, status, controller) in players.iter_mut() {
        if let Some(controller) = controller {
            if tool.update_grounded(controller.grounded) {
                crate::log(&format!(
                    "🍂 {:?} landed, blower charges refilled: {}/{}",
                    player, tool.charges, tool.max_charges
                ));
            }
        }

        let inhibited = status.is_some_and(|status| status.is_action_inhibited(ActionTag::LeafBlower));

        // Непрерывный поток: импульс blow_force за тик
        if input.blowing && !inhibited {
            let volume = BlastVolume::new(transform.translation, input.aim, &tool);
            for body in volume.bodies(&spatial, player) {
                let Ok((victim_transform, ragdoll, _, _, blowable)) = victims.get(body.entity) else {
                    continue;
                };
                let ragdolled = ragdoll.is_some_and(|ragdoll| ragdoll.is_ragdolled());
                if !blowable && !ragdolled {
                    continue;
                }

                let direction = volume.push_direction(victim_transform.translation, input.aim);
                add_impulse(&mut impulses, &mut pending, body.entity, direction * tool.blow_force);
            }
        }

        let Some(charge) = tool.update(input.charging, inhibited, delta) else {
            continue;
        };

        // Отдача (прибавляется к текущей внешней скорости)
        knockback_events.write(KnockbackRequest::Launch {
            target: player,
            velocity: tool.recoil_velocity(input.aim, charge),
        });

        let strength = tool.blast_strength(charge);
        let volume = BlastVolume::new(transform.translation, input.aim, &tool);
        let mut affected = 0;

        for body in volume.bodies(&spatial, player) {
            let Ok((victim_transform, ragdoll, has_brain, profile, _)) = victims.get(body.entity) else {
                continue;
            };

            let center = victim_transform.translation;
            if ragdoll.is_some() {
                blow_events.write(Blow {
                    entity: body.entity,
                    impulse: volume.push_direction(center, input.aim) * strength,
                    duration: settings.default_blow_duration,
                });
                affected += 1;
            } else if has_brain {
                // Турель прикручена к уступу
                if profile.is_some_and(|profile| profile.stationary) {
                    continue;
                }
                knockback_events.write(KnockbackRequest::FromImpact {
                    target: body.entity,
                    impact_point: center,
                    source_point: volume.nozzle,
                    magnitude: strength,
                    upward_bias: BLAST_UPWARD_BIAS,
                });
                affected += 1;
            }
        }

        crate::log(&format!(
            "💨 {:?} CHARGED BLAST! power {:.0}%, affected {}, charges {}/{}",
            player,
            charge / tool.max_charge * 100.0,
            affected,
            tool.charges,
            tool.max_charges
        ));

        fired_events.write(BlowerFired {
            player,
            charge,
            affected,
            charges_left: tool.charges,
        });
    }

    for (entity, impulse) in pending {
        commands.entity(entity).insert(ExternalImpulse {
            impulse,
            torque_impulse: Vec3::ZERO,
        });
    }
}
