//! Combat integration test
//!
//! Полный headless App (SimulationPlugin), игрок + враги, проверяем:
//! - melee spider: slow + knockback на игроке
//! - ranged spider: projectile долетает и вешает slow
//! - blower: spider в ragdoll, потом recovery на navmesh
//! - mushroom: knockback → KnockedBack → снова Approaching
//! - Inhibit блокирует атаки и blower
//! - slow замедляет движение
//! - режим атаки фиксируется на trigger: цель ушла из окна → Missed
//! - projectile: timeout и стена
//! - непрерывный поток толкает Blowable, турель не сдвигается

use bevy::prelude::*;
use bevy_rapier3d::prelude::{ColliderDisabled, ExternalImpulse, RigidBody};
use leafstorm_simulation::ai::{AttackImpact, AttackOutcome, AttackResolved, AttackTriggered, EngagementMode};
use leafstorm_simulation::physics::spawn_kinematic_character;
use leafstorm_simulation::projectile::{spawn_projectile, RetireReason};
use leafstorm_simulation::ragdoll::spawn_ragdoll_limb;
use leafstorm_simulation::*;

/// Все интересные события симуляции (копятся после Motion)
#[derive(Resource, Default)]
struct EventLog {
    triggered: Vec<AttackTriggered>,
    resolved: Vec<AttackResolved>,
    retired: Vec<ProjectileRetired>,
    fired: Vec<BlowerFired>,
    recovered: Vec<RagdollRecovered>,
    applied: Vec<StatusApplied>,
}

fn record_events(
    mut log: ResMut<EventLog>,
    mut triggered: EventReader<AttackTriggered>,
    mut resolved: EventReader<AttackResolved>,
    mut retired: EventReader<ProjectileRetired>,
    mut fired: EventReader<BlowerFired>,
    mut recovered: EventReader<RagdollRecovered>,
    mut applied: EventReader<StatusApplied>,
) {
    log.triggered.extend(triggered.read().copied());
    log.resolved.extend(resolved.read().copied());
    log.retired.extend(retired.read().copied());
    log.fired.extend(fired.read().copied());
    log.recovered.extend(recovered.read().copied());
    log.applied.extend(applied.read().copied());
}

/// Helper: создать полный combat App со всеми plugins
fn create_combat_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin)
        .init_resource::<EventLog>()
        .add_systems(FixedUpdate, record_events.after(CombatSet::Motion));
    app
}

fn spawn_player(app: &mut App, position: Vec3) -> Entity {
    let mut commands = app.world_mut().commands();
    let player = spawn_kinematic_character(&mut commands, position);
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
    app.world_mut().flush();
    player
}

fn spawn_enemy(app: &mut App, position: Vec3, profile: CombatProfile) -> Entity {
    let mut commands = app.world_mut().commands();
    let enemy = spawn_kinematic_character(&mut commands, position);
    commands.entity(enemy).insert((
        Actor { faction_id: 1 },
        CombatBrain::default(),
        profile,
        NavigationAgent::default(),
        Animator::default(),
    ));
    app.world_mut().flush();
    enemy
}

/// Враг с ragdoll (2 limb'а)
fn spawn_ragdoll_enemy(app: &mut App, position: Vec3, profile: CombatProfile) -> (Entity, Vec<Entity>) {
    let enemy = spawn_enemy(app, position, profile);

    let mut commands = app.world_mut().commands();
    let limbs = vec![
        spawn_ragdoll_limb(&mut commands, position + Vec3::new(0.3, 0.2, 0.0), 0.1),
        spawn_ragdoll_limb(&mut commands, position + Vec3::new(-0.3, 0.2, 0.0), 0.1),
    ];
    commands
        .entity(enemy)
        .insert(Ragdoll::new(limbs.clone()).with_recover_animation("GetUp"));
    app.world_mut().flush();

    (enemy, limbs)
}

fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

fn status(app: &App, entity: Entity) -> &StatusEffects {
    app.world().get::<StatusEffects>(entity).expect("StatusEffects")
}

fn external(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<ExternalVelocity>(entity).expect("ExternalVelocity").0
}

/// Spider, которому impact присылает host (без impact_delay)
fn host_driven_spider() -> CombatProfile {
    CombatProfile {
        impact_delay: None,
        ..CombatProfile::spider()
    }
}

/// Тикаем, пока attacker не стартует атаку
fn run_until_triggered(app: &mut App, attacker: Entity, max_ticks: usize) -> AttackTriggered {
    for _ in 0..max_ticks {
        app.update();
        let log = app.world().resource::<EventLog>();
        if let Some(event) = log.triggered.iter().find(|event| event.attacker == attacker) {
            return *event;
        }
    }
    panic!("{:?} never triggered an attack", attacker);
}

fn move_to(app: &mut App, entity: Entity, position: Vec3) {
    app.world_mut().get_mut::<Transform>(entity).expect("Transform").translation = position;
}

fn projectile_count(app: &mut App) -> usize {
    let mut projectiles = app.world_mut().query::<&Projectile>();
    projectiles.iter(app.world()).count()
}

/// Test: spider вплотную кусает: slow 0.5 + knockback от паука
#[test]
fn test_spider_melee_hit_slows_and_knocks_back() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app, Vec3::ZERO);
    let spider = spawn_enemy(&mut app, Vec3::new(1.5, 0.0, 0.0), CombatProfile::spider());

    // impact на 0.45s после старта атаки
    run_ticks(&mut app, 45);

    let log = app.world().resource::<EventLog>();
    assert!(
        log.resolved
            .iter()
            .any(|event| event.attacker == spider && event.outcome == AttackOutcome::MeleeHit),
        "spider should land a melee hit"
    );

    let effects = status(&app, player);
    assert!((effects.speed_multiplier() - 0.5).abs() < 1e-5);
    assert!(effects
        .active()
        .iter()
        .any(|effect| matches!(effect, StatusEffect::Slow { .. })));

    let position = app.world().get::<Transform>(player).expect("Transform").translation;
    assert!(position.x < -0.5, "player should be knocked away from spider, x = {}", position.x);

    // Одна атака: один хит
    let hits = log
        .resolved
        .iter()
        .filter(|event| event.outcome == AttackOutcome::MeleeHit)
        .count();
    assert_eq!(hits, 1);
}

/// Test: spider на 5m стреляет, projectile долетает, slow на 3s
#[test]
fn test_spider_projectile_hits_player() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app, Vec3::ZERO);
    let spider = spawn_enemy(&mut app, Vec3::new(5.0, 0.0, 0.0), CombatProfile::spider());

    run_ticks(&mut app, 60);

    let log = app.world().resource::<EventLog>();
    assert!(log
        .resolved
        .iter()
        .any(|event| event.attacker == spider && event.outcome == AttackOutcome::ProjectileLaunched));

    let hit = log
        .retired
        .iter()
        .find(|event| event.reason == RetireReason::Hit)
        .expect("projectile should hit");
    assert_eq!(hit.contact, Some(player));

    let effects = status(&app, player);
    assert!((effects.speed_multiplier() - 0.5).abs() < 1e-5);
    let slow = effects.active().first().expect("slow active");
    assert_eq!(slow.duration(), 3.0);

    // Projectile despawned после попадания
    let mut projectiles = app.world_mut().query::<&Projectile>();
    assert_eq!(projectiles.iter(app.world()).count(), 0);
}

/// Test: charged blast сдувает spider в ragdoll, через duration + delay он встаёт
#[test]
fn test_blower_ragdolls_spider_then_recovers() {
    let mut app = create_combat_app(7);
    let player = spawn_player(&mut app, Vec3::ZERO);
    let (spider, limbs) = spawn_ragdoll_enemy(&mut app, Vec3::new(4.0, 0.0, 0.0), CombatProfile::spider());

    // Заряжаем ~0.5s и отпускаем
    app.world_mut().get_mut::<BlowerInput>(player).expect("input").charging = true;
    run_ticks(&mut app, 31);
    app.world_mut().get_mut::<BlowerInput>(player).expect("input").charging = false;
    run_ticks(&mut app, 1);

    {
        let log = app.world().resource::<EventLog>();
        assert_eq!(log.fired.len(), 1);
        assert_eq!(log.fired[0].affected, 1);
        assert_eq!(log.fired[0].charges_left, 1);
    }

    // Отдача: игрока тянет против прицела
    let external = app.world().get::<ExternalVelocity>(player).expect("external");
    assert!(external.0.x < 0.0, "recoil = {:?}", external.0);

    // Blow обрабатывается на следующем тике
    run_ticks(&mut app, 1);

    let ragdoll = app.world().get::<Ragdoll>(spider).expect("ragdoll");
    assert!(ragdoll.is_ragdolled());
    assert!(!app.world().get::<NavigationAgent>(spider).expect("agent").enabled);
    assert!(!app.world().get::<Animator>(spider).expect("animator").enabled);

    let impulse = app.world().get::<ExternalImpulse>(spider).expect("root impulse");
    assert!(impulse.impulse.x > 0.0, "spider pushed away from the player");

    for &limb in &limbs {
        assert_eq!(app.world().get::<RigidBody>(limb), Some(&RigidBody::Dynamic));
        assert!(app.world().get::<ColliderDisabled>(limb).is_none());
        assert!(app.world().get::<ExternalImpulse>(limb).is_some());
    }

    // 0.8s blow + 0.6s recovery delay = 84 тика
    run_ticks(&mut app, 90);

    let ragdoll = app.world().get::<Ragdoll>(spider).expect("ragdoll");
    assert!(!ragdoll.is_ragdolled());
    assert!(app.world().get::<NavigationAgent>(spider).expect("agent").enabled);

    let animator = app.world().get::<Animator>(spider).expect("animator");
    assert!(animator.enabled);
    assert_eq!(animator.current_clip(), Some("GetUp"));

    for &limb in &limbs {
        assert_eq!(
            app.world().get::<RigidBody>(limb),
            Some(&RigidBody::KinematicPositionBased)
        );
        assert!(app.world().get::<ColliderDisabled>(limb).is_some());
    }

    let log = app.world().resource::<EventLog>();
    assert_eq!(log.recovered.len(), 1);
    assert_eq!(log.recovered[0].entity, spider);
    assert!(log.recovered[0].position.y.abs() < 1e-4, "root back on navmesh");
}

/// Test: Inhibit(LeafBlower): заряд сгорает, выстрела нет
#[test]
fn test_inhibited_blower_does_not_fire() {
    let mut app = create_combat_app(7);
    let player = spawn_player(&mut app, Vec3::ZERO);

    app.world_mut()
        .get_mut::<StatusEffects>(player)
        .expect("status")
        .apply(StatusEffect::inhibit(ActionTag::LeafBlower, 2.0));

    app.world_mut().get_mut::<BlowerInput>(player).expect("input").charging = true;
    run_ticks(&mut app, 30);
    app.world_mut().get_mut::<BlowerInput>(player).expect("input").charging = false;
    run_ticks(&mut app, 2);

    let log = app.world().resource::<EventLog>();
    assert!(log.fired.is_empty());

    let tool = app.world().get::<BlowerTool>(player).expect("tool");
    assert_eq!(tool.charge, 0.0);
    assert_eq!(tool.charges, tool.max_charges);
}

/// Test: Inhibit(Attack): паук вплотную не атакует, пока эффект активен
#[test]
fn test_inhibited_enemy_does_not_attack() {
    let mut app = create_combat_app(42);
    spawn_player(&mut app, Vec3::ZERO);
    let spider = spawn_enemy(&mut app, Vec3::new(1.5, 0.0, 0.0), CombatProfile::spider());

    app.world_mut()
        .get_mut::<StatusEffects>(spider)
        .expect("status")
        .apply(StatusEffect::inhibit(ActionTag::Attack, 1.0));

    run_ticks(&mut app, 50);
    assert!(app.world().resource::<EventLog>().triggered.is_empty());

    // Inhibit истёк → атака
    run_ticks(&mut app, 20);
    let log = app.world().resource::<EventLog>();
    assert!(log.triggered.iter().any(|event| event.attacker == spider));
}

/// Test: knockback на гриб → KnockedBack 0.5s → навигация снова ON
#[test]
fn test_mushroom_knockback_recovery() {
    let mut app = create_combat_app(3);
    spawn_player(&mut app, Vec3::ZERO);
    let mushroom = spawn_enemy(&mut app, Vec3::new(0.0, 0.0, 9.0), CombatProfile::mushroom());

    run_ticks(&mut app, 2);
    app.world_mut().send_event(KnockbackRequest::FromImpact {
        target: mushroom,
        impact_point: Vec3::new(0.0, 0.0, 9.0),
        source_point: Vec3::ZERO,
        magnitude: 12.0,
        upward_bias: 0.25,
    });
    run_ticks(&mut app, 1);

    let brain = app.world().get::<CombatBrain>(mushroom).expect("brain");
    assert!(brain.state.is_knocked_back(), "state = {:?}", brain.state);
    assert!(!app.world().get::<NavigationAgent>(mushroom).expect("agent").enabled);
    assert!(app.world().get::<ExternalVelocity>(mushroom).expect("external").0.z > 0.0);

    run_ticks(&mut app, 35);

    let brain = app.world().get::<CombatBrain>(mushroom).expect("brain");
    assert!(!brain.state.is_knocked_back(), "state = {:?}", brain.state);
    assert!(app.world().get::<NavigationAgent>(mushroom).expect("agent").enabled);
}

/// Test: slow 0.5: за секунду проходим половину дистанции
#[test]
fn test_slow_halves_movement() {
    let mut app = create_combat_app(1);

    let (slowed, normal) = {
        let mut commands = app.world_mut().commands();
        let slowed = spawn_kinematic_character(&mut commands, Vec3::ZERO);
        let normal = spawn_kinematic_character(&mut commands, Vec3::new(0.0, 0.0, 10.0));
        (slowed, normal)
    };
    app.world_mut().flush();

    for entity in [slowed, normal] {
        app.world_mut().get_mut::<MovementInput>(entity).expect("input").direction = Vec3::X;
    }
    app.world_mut().send_event(StatusApplied {
        target: slowed,
        effect: StatusEffect::slow(0.5, 10.0),
    });

    run_ticks(&mut app, 61);

    let slowed_x = app.world().get::<Transform>(slowed).expect("Transform").translation.x;
    let normal_x = app.world().get::<Transform>(normal).expect("Transform").translation.x;

    assert!((normal_x - 5.0).abs() < 0.2, "normal_x = {}", normal_x);
    assert!((slowed_x / normal_x - 0.5).abs() < 0.05, "slowed_x = {}", slowed_x);
}

/// Test: ranged атака, цель подошла вплотную до impact → промах, не укус
#[test]
fn test_ranged_commit_misses_when_target_closes_in() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app, Vec3::ZERO);
    let spider = spawn_enemy(&mut app, Vec3::new(5.0, 0.0, 0.0), host_driven_spider());

    let triggered = run_until_triggered(&mut app, spider, 10);
    assert_eq!(triggered.mode, EngagementMode::Ranged);

    let spider_position = app.world().get::<Transform>(spider).expect("Transform").translation;
    move_to(&mut app, player, spider_position - Vec3::X * 1.5);

    app.world_mut().send_event(AttackImpact { attacker: spider });
    run_ticks(&mut app, 1);

    let log = app.world().resource::<EventLog>();
    let outcomes: Vec<_> = log.resolved.iter().map(|event| event.outcome).collect();
    assert_eq!(outcomes, vec![AttackOutcome::Missed]);
    assert!(log.applied.is_empty());

    assert!(status(&app, player).is_empty());
    assert_eq!(external(&app, player), Vec3::ZERO);
    assert_eq!(projectile_count(&mut app), 0);
}

/// Test: melee атака, цель отошла на дистанцию выстрела → промах, не projectile
#[test]
fn test_melee_commit_misses_when_target_backs_off() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app, Vec3::ZERO);
    let spider = spawn_enemy(&mut app, Vec3::new(1.5, 0.0, 0.0), host_driven_spider());

    let triggered = run_until_triggered(&mut app, spider, 10);
    assert_eq!(triggered.mode, EngagementMode::Melee);

    let spider_position = app.world().get::<Transform>(spider).expect("Transform").translation;
    move_to(&mut app, player, spider_position - Vec3::X * 5.0);

    app.world_mut().send_event(AttackImpact { attacker: spider });
    run_ticks(&mut app, 1);

    let log = app.world().resource::<EventLog>();
    let outcomes: Vec<_> = log.resolved.iter().map(|event| event.outcome).collect();
    assert_eq!(outcomes, vec![AttackOutcome::Missed]);
    assert!(log.applied.is_empty());

    assert!(status(&app, player).is_empty());
    assert_eq!(external(&app, player), Vec3::ZERO);
    assert_eq!(projectile_count(&mut app), 0);
}

/// Test: blow посреди атаки → атака прервана, поздний impact отброшен
#[test]
fn test_blow_cancels_attack_in_progress() {
    let mut app = create_combat_app(42);
    let player = spawn_player(&mut app, Vec3::ZERO);
    let (spider, _) = spawn_ragdoll_enemy(&mut app, Vec3::new(1.5, 0.0, 0.0), host_driven_spider());

    let triggered = run_until_triggered(&mut app, spider, 10);
    assert_eq!(triggered.mode, EngagementMode::Melee);

    app.world_mut().send_event(Blow::new(spider, Vec3::X * 5.0));
    run_ticks(&mut app, 1);

    assert!(app.world().get::<Ragdoll>(spider).expect("ragdoll").is_ragdolled());
    let brain = app.world().get::<CombatBrain>(spider).expect("brain");
    assert_eq!(brain.state, CombatState::Approaching);

    app.world_mut().send_event(AttackImpact { attacker: spider });
    run_ticks(&mut app, 1);

    let log = app.world().resource::<EventLog>();
    assert!(log.resolved.is_empty(), "resolved = {:?}", log.resolved);
    assert!(log.applied.is_empty());
    assert_eq!(status(&app, player).speed_multiplier(), 1.0);
    assert_eq!(external(&app, player), Vec3::ZERO);
}

/// Test: projectile в пустоту: Expired ровно на тике spawn + lifetime, не раньше
#[test]
fn test_projectile_expires_on_lifetime_tick() {
    let mut app = create_combat_app(1);
    run_ticks(&mut app, 2);

    let now = app.world().resource::<Time<Fixed>>().elapsed_secs();
    let source = app.world_mut().spawn_empty().id();
    let projectile = {
        let mut commands = app.world_mut().commands();
        spawn_projectile(
            &mut commands,
            Vec3::new(0.0, 50.0, 0.0),
            Projectile::new(Vec3::Y, 1.0, 0.49, Some(StatusEffect::slow(0.5, 3.0)), source, now),
        )
    };
    app.world_mut().flush();

    // 29 тиков = 0.483s < 0.49s
    run_ticks(&mut app, 29);
    assert!(app.world().resource::<EventLog>().retired.is_empty());
    assert!(app.world().get::<Projectile>(projectile).is_some());

    run_ticks(&mut app, 1);

    let log = app.world().resource::<EventLog>();
    assert_eq!(log.retired.len(), 1);
    assert_eq!(log.retired[0].projectile, projectile);
    assert_eq!(log.retired[0].reason, RetireReason::Expired);
    assert_eq!(log.retired[0].contact, None);
    assert!(log.applied.is_empty());
    assert!(app.world().get::<Projectile>(projectile).is_none());
}

/// Test: projectile в стену: Terrain, payload никому
#[test]
fn test_projectile_retires_on_terrain_without_payload() {
    let mut app = create_combat_app(1);
    run_ticks(&mut app, 1);

    let wall = app
        .world_mut()
        .spawn((
            Transform::from_translation(Vec3::new(3.0, 0.5, 0.0)),
            BodyShape {
                radius: 0.5,
                solid: true,
                offset: 0.0,
            },
        ))
        .id();
    let source = app.world_mut().spawn_empty().id();
    {
        let mut commands = app.world_mut().commands();
        spawn_projectile(
            &mut commands,
            Vec3::new(0.0, 0.5, 0.0),
            Projectile::new(Vec3::X, 10.0, 2.0, Some(StatusEffect::slow(0.5, 3.0)), source, 0.0),
        );
    }
    app.world_mut().flush();

    run_ticks(&mut app, 30);

    let log = app.world().resource::<EventLog>();
    assert_eq!(log.retired.len(), 1);
    assert_eq!(log.retired[0].reason, RetireReason::Terrain);
    assert_eq!(log.retired[0].contact, Some(wall));
    assert!(log.applied.is_empty());
    assert_eq!(projectile_count(&mut app), 0);
}

fn spawn_leaf_pile(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            BodyShape {
                radius: 0.3,
                solid: false,
                offset: 0.0,
            },
            Blowable,
        ))
        .id()
}

/// Test: непрерывный поток толкает Blowable каждый тик, без отдачи и зарядов
#[test]
fn test_continuous_blow_pushes_blowables() {
    let mut app = create_combat_app(5);
    let player = spawn_player(&mut app, Vec3::ZERO);
    let pile = spawn_leaf_pile(&mut app, Vec3::new(4.0, 0.0, 0.0));
    run_ticks(&mut app, 1);

    app.world_mut().get_mut::<BlowerInput>(player).expect("input").blowing = true;
    run_ticks(&mut app, 2);

    let tool = app.world().get::<BlowerTool>(player).expect("tool").clone();
    let impulse = app.world().get::<ExternalImpulse>(pile).expect("pile impulse").impulse;
    assert!(impulse.x > 0.0, "impulse = {:?}", impulse);
    assert!((impulse.length() - 2.0 * tool.blow_force).abs() < 1e-3, "impulse = {:?}", impulse);

    assert!(app.world().resource::<EventLog>().fired.is_empty());
    assert_eq!(tool.charges, tool.max_charges);
    assert_eq!(external(&app, player), Vec3::ZERO);
}

/// Test: Inhibit(LeafBlower) глушит и непрерывный поток
#[test]
fn test_inhibited_continuous_blow_pushes_nothing() {
    let mut app = create_combat_app(5);
    let player = spawn_player(&mut app, Vec3::ZERO);
    let pile = spawn_leaf_pile(&mut app, Vec3::new(4.0, 0.0, 0.0));

    app.world_mut()
        .get_mut::<StatusEffects>(player)
        .expect("status")
        .apply(StatusEffect::inhibit(ActionTag::LeafBlower, 2.0));
    app.world_mut().get_mut::<BlowerInput>(player).expect("input").blowing = true;
    run_ticks(&mut app, 5);

    assert!(app.world().get::<ExternalImpulse>(pile).is_none());
}

/// Test: charged blast не сдвигает турель
#[test]
fn test_blast_does_not_move_stationary_turret() {
    let mut app = create_combat_app(9);
    let player = spawn_player(&mut app, Vec3::ZERO);
    let turret = spawn_enemy(&mut app, Vec3::new(4.0, 0.0, 0.0), CombatProfile::turret());

    app.world_mut().get_mut::<BlowerInput>(player).expect("input").charging = true;
    run_ticks(&mut app, 31);
    app.world_mut().get_mut::<BlowerInput>(player).expect("input").charging = false;
    run_ticks(&mut app, 3);

    let log = app.world().resource::<EventLog>();
    assert_eq!(log.fired.len(), 1);
    assert_eq!(log.fired[0].affected, 0);

    assert_eq!(external(&app, turret), Vec3::ZERO);
    let position = app.world().get::<Transform>(turret).expect("Transform").translation;
    assert!((position - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-4, "turret at {:?}", position);
}
