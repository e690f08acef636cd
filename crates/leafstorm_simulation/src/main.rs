//! Headless симуляция Leafstorm
//!
//! Игрок стоит, spider / mushroom / turret атакуют, на 3-й секунде игрок
//! сдувает spider'а charged blast'ом. В конце: сводка по событиям.

use bevy::prelude::*;
use leafstorm_simulation::ai::{AttackOutcome, AttackResolved};
use leafstorm_simulation::physics::spawn_kinematic_character;
use leafstorm_simulation::ragdoll::spawn_ragdoll_limb;
use leafstorm_simulation::*;

const TICKS: usize = 600;
const BLOWER_CHARGE_START: usize = 120;
const BLOWER_RELEASE: usize = 180;

#[derive(Resource, Default, Debug)]
struct Summary {
    melee_hits: u32,
    projectiles: u32,
    misses: u32,
    blasts: u32,
    recoveries: u32,
}

fn collect_summary(
    mut summary: ResMut<Summary>,
    mut resolved: EventReader<AttackResolved>,
    mut fired: EventReader<BlowerFired>,
    mut recovered: EventReader<RagdollRecovered>,
) {
    for event in resolved.read() {
        match event.outcome {
            AttackOutcome::MeleeHit => summary.melee_hits += 1,
            AttackOutcome::ProjectileLaunched => summary.projectiles += 1,
            AttackOutcome::Missed => summary.misses += 1,
        }
    }
    summary.blasts += fired.read().count() as u32;
    summary.recoveries += recovered.read().count() as u32;
}

fn spawn_enemy(commands: &mut Commands, position: Vec3, profile: CombatProfile, ragdoll: bool) -> Entity {
    let entity = spawn_kinematic_character(commands, position);
    commands.entity(entity).insert((
        Actor { faction_id: 1 },
        CombatBrain::default(),
        profile,
        NavigationAgent::default(),
        Animator::default(),
    ));

    if ragdoll {
        let limbs: Vec<Entity> = (0..4)
            .map(|i| {
                let offset = Vec3::new(if i % 2 == 0 { 0.3 } else { -0.3 }, 0.2, if i < 2 { 0.3 } else { -0.3 });
                spawn_ragdoll_limb(commands, position + offset, 0.1)
            })
            .collect();
        commands
            .entity(entity)
            .insert(Ragdoll::new(limbs).with_recover_animation("GetUp"));
    }

    entity
}

fn main() {
    let seed = 42;
    init_logger();
    set_log_level(LogLevel::Info);
    log_info(&format!("Starting Leafstorm headless simulation (seed: {})", seed));

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin)
        .init_resource::<Summary>()
        .add_systems(FixedUpdate, collect_summary.after(CombatSet::Motion));

    let player = {
        let mut commands = app.world_mut().commands();
        let player = spawn_kinematic_character(&mut commands, Vec3::ZERO);
        commands.entity(player).insert((
            Player,
            Actor { faction_id: 0 },
            BlowerTool::default(),
            BlowerInput {
                aim: Vec3::X,
                charging: false,
                blowing: false,
            },
        ));

        spawn_enemy(&mut commands, Vec3::new(5.0, 0.0, 0.0), CombatProfile::spider(), true);
        spawn_enemy(&mut commands, Vec3::new(0.0, 0.0, 9.0), CombatProfile::mushroom(), false);
        spawn_enemy(&mut commands, Vec3::new(-7.0, 0.0, 0.0), CombatProfile::turret(), false);
        player
    };
    app.world_mut().flush();

    for tick in 0..TICKS {
        if tick == BLOWER_CHARGE_START || tick == BLOWER_RELEASE {
            if let Some(mut input) = app.world_mut().get_mut::<BlowerInput>(player) {
                input.charging = tick == BLOWER_CHARGE_START;
            }
        }

        app.update();

        if tick % 100 == 0 {
            let multiplier = app
                .world()
                .get::<StatusEffects>(player)
                .map_or(1.0, |status| status.speed_multiplier());
            log_info(&format!(
                "Tick {}: {} entities, player speed x{:.2}",
                tick,
                app.world().entities().len(),
                multiplier
            ));
        }
    }

    let summary = app.world().resource::<Summary>();
    log_info(&format!(
        "Simulation complete! melee hits: {}, projectiles: {}, misses: {}, blasts: {}, ragdoll recoveries: {}",
        summary.melee_hits, summary.projectiles, summary.misses, summary.blasts, summary.recoveries
    ));
}
