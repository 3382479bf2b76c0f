use core::f32::consts::PI;

use ai_core::{Position, SplitMix64, TickContext, Vec3, TAU};
use ai_motion::{
    choose_flee_offset, ChaseAngle, ChaseMovementGenerator, ConfusedMovementGenerator,
    DistractMovementGenerator, FleeConfig, FleeingMovementGenerator, FollowKind, GeneratorFlags,
    MotionMode, FollowMovementGenerator, FormationMovementGenerator, GenericMovementGenerator,
    HomeMovementGenerator, IdleMovementGenerator, MotionConfig, MotionDriver, MotionGenerator,
    MotionPriority, MotionWorld, MoveSplineInit, MovementGenerator, MovementGeneratorType,
    PointMovementGenerator, RandomMovementGenerator, RotateDirection, RotateMovementGenerator,
    SimEvent, SimUnit, SimWorld, UnitState, WaypointMoveType,
};

const STEP_MS: u32 = 100;

fn world_with(units: &[(u64, Vec3)]) -> SimWorld {
    let mut world = SimWorld::new(MotionConfig::default());
    for &(id, pos) in units {
        world.spawn(id, SimUnit::new(pos));
    }
    world
}

fn run(
    driver: &mut MotionDriver<u64>,
    world: &mut SimWorld,
    ctx: &mut TickContext,
    steps: usize,
) -> Vec<u64> {
    let mut finished = Vec::new();
    for _ in 0..steps {
        *ctx = ctx.next(STEP_MS);
        world.advance(STEP_MS);
        finished.extend(driver.update(ctx, world));
    }
    finished
}

fn informs(world: &SimWorld, unit: u64) -> Vec<(MovementGeneratorType, u32)> {
    world
        .events()
        .iter()
        .filter_map(|e| match *e {
            SimEvent::MovementInform { unit: u, kind, id } if u == unit => Some((kind, id)),
            _ => None,
        })
        .collect()
}

fn launches(world: &SimWorld, unit: u64) -> Vec<Vec3> {
    world
        .events()
        .iter()
        .filter_map(|e| match *e {
            SimEvent::SplineLaunched { unit: u, destination, .. } if u == unit => Some(destination),
            _ => None,
        })
        .collect()
}

fn angle_diff(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

#[test]
fn point_move_arrives_and_informs_once() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 7);

    let point = PointMovementGenerator::<u64>::new(42, Vec3::new(14.0, 0.0, 0.0), true);
    driver.start(&ctx, &mut world, 1, point);
    assert!(world.unit_state(1).contains(UnitState::ROAMING | UnitState::ROAMING_MOVE));

    assert!(run(&mut driver, &mut world, &mut ctx, 19).is_empty());
    assert_eq!(run(&mut driver, &mut world, &mut ctx, 1), vec![1]);

    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::Point, 42)]);
    assert!(world.position(1).pos.distance(Vec3::new(14.0, 0.0, 0.0)) < 1e-3);
    assert!(!world.unit_state(1).intersects(UnitState::ROAMING | UnitState::ROAMING_MOVE));
    assert!(driver.is_empty());
}

#[test]
fn point_move_resumes_after_root_wears_off() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 7);
    driver.start(
        &ctx,
        &mut world,
        1,
        PointMovementGenerator::<u64>::new(1, Vec3::new(35.0, 0.0, 0.0), false),
    );

    run(&mut driver, &mut world, &mut ctx, 5);
    world.add_unit_state(1, UnitState::ROOT);
    run(&mut driver, &mut world, &mut ctx, 3);
    let held = world.position(1).pos;
    run(&mut driver, &mut world, &mut ctx, 3);
    assert_eq!(world.position(1).pos, held);
    assert!(informs(&world, 1).is_empty());

    world.clear_unit_state(1, UnitState::ROOT);
    run(&mut driver, &mut world, &mut ctx, 2);
    assert_eq!(launches(&world, 1).len(), 2);
    run(&mut driver, &mut world, &mut ctx, 60);
    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::Point, 1)]);
}

#[test]
fn point_move_relaunches_on_speed_change() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 7);
    driver.start(
        &ctx,
        &mut world,
        1,
        PointMovementGenerator::<u64>::new(1, Vec3::new(70.0, 0.0, 0.0), false),
    );
    run(&mut driver, &mut world, &mut ctx, 10);

    if let Some(unit) = world.unit_mut(1) {
        unit.run_speed = 14.0;
    }
    driver.unit_speed_changed(1);
    run(&mut driver, &mut world, &mut ctx, 1);
    assert_eq!(launches(&world, 1).len(), 2);
    assert_eq!(world.spline_velocity(1), 14.0);
}

#[test]
fn chase_closes_in_without_relaunching_on_a_still_target() {
    let mut world = world_with(&[(1, Vec3::ZERO), (2, Vec3::new(20.0, 0.0, 0.0))]);
    if let Some(unit) = world.unit_mut(1) {
        unit.victim = Some(2);
    }
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 7);
    driver.start(&ctx, &mut world, 1, ChaseMovementGenerator::new(2u64));
    assert_eq!(world.followers().target_of(1), Some((2, FollowKind::Chase)));

    run(&mut driver, &mut world, &mut ctx, 1);
    let first = world.spline_id(1);
    run(&mut driver, &mut world, &mut ctx, 5);
    assert_eq!(world.spline_id(1), first);
    assert_eq!(launches(&world, 1).len(), 1);

    run(&mut driver, &mut world, &mut ctx, 40);
    let gap = world.position(1).pos.distance(world.position(2).pos);
    assert!(gap <= world.melee_range(1, 2), "stopped {gap} away");
    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::Chase, 2)]);
    assert!(!world.unit_state(1).contains(UnitState::CHASE_MOVE));
    assert!(world.unit_state(1).contains(UnitState::CHASE));
}

#[test]
fn chase_follows_a_moving_target_and_releases_on_stop() {
    let mut world = world_with(&[(1, Vec3::ZERO), (2, Vec3::new(20.0, 0.0, 0.0))]);
    if let Some(unit) = world.unit_mut(1) {
        unit.victim = Some(2);
    }
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 7);
    driver.start(&ctx, &mut world, 1, ChaseMovementGenerator::new(2u64));
    run(&mut driver, &mut world, &mut ctx, 3);

    world.place(2, Vec3::new(20.0, 15.0, 0.0));
    run(&mut driver, &mut world, &mut ctx, 1);
    let relaunched = launches(&world, 1);
    assert_eq!(relaunched.len(), 2);
    assert!(relaunched[1].y > 5.0);

    driver.stop(&mut world, 1);
    assert_eq!(world.followers().target_of(1), None);
    assert!(!world.unit_state(1).intersects(UnitState::CHASE | UnitState::CHASE_MOVE));
}

#[test]
fn chase_waits_when_target_is_not_the_victim() {
    let mut world = world_with(&[(1, Vec3::ZERO), (2, Vec3::new(20.0, 0.0, 0.0))]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 7);
    driver.start(&ctx, &mut world, 1, ChaseMovementGenerator::new(2u64));
    run(&mut driver, &mut world, &mut ctx, 10);
    assert!(launches(&world, 1).is_empty());
    assert_eq!(world.position(1).pos, Vec3::ZERO);
}

#[test]
fn mutual_chase_ignores_the_requested_angle() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    world.spawn(2, SimUnit::new(Vec3::new(20.0, 0.0, 0.0)).with_orientation(PI / 2.0));
    if let Some(unit) = world.unit_mut(1) {
        unit.victim = Some(2);
    }
    if let Some(unit) = world.unit_mut(2) {
        unit.victim = Some(1);
    }
    world.add_unit_state(2, UnitState::ROOT);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 7);
    let behind = ChaseAngle::new(PI);
    driver.start(&ctx, &mut world, 1, ChaseMovementGenerator::new(2u64).with_angle(behind));
    driver.start(&ctx, &mut world, 2, ChaseMovementGenerator::new(1u64).with_angle(behind));
    assert!(world.followers().is_chasing(1, 2));
    assert!(world.followers().is_chasing(2, 1));

    run(&mut driver, &mut world, &mut ctx, 40);
    let here = world.position(1).pos;
    assert!(here.y.abs() < 0.5, "approached from the side: {here:?}");
    assert!(here.distance(world.position(2).pos) <= world.melee_range(1, 2));

    world.despawn(2);
    assert!(run(&mut driver, &mut world, &mut ctx, 1).contains(&1));
    assert!(world.followers().is_empty());
}

#[test]
fn flee_offset_depends_on_threat_distance() {
    let config = FleeConfig::default();
    let mut rng = SplitMix64::new(99);
    for _ in 0..200 {
        let (distance, angle) = choose_flee_offset(&config, Some((5.0, 0.0)), &mut rng);
        assert!((9.1..30.0).contains(&distance), "close threat ran {distance}");
        assert!(angle_diff(angle, 0.0) <= PI / 8.0 + 1e-4);

        let (distance, angle) = choose_flee_offset(&config, Some((60.0, 0.0)), &mut rng);
        assert!((5.9..15.1).contains(&distance), "far threat ran {distance}");
        assert!(angle_diff(angle, PI) <= PI / 4.0 + 1e-4);

        let (distance, _) = choose_flee_offset(&config, Some((35.0, 0.0)), &mut rng);
        assert!((8.9..18.1).contains(&distance), "quiet band ran {distance}");
    }
}

#[test]
fn flee_direction_is_free_inside_the_quiet_band() {
    let config = FleeConfig::default();
    let mut rng = SplitMix64::new(3);
    let mut sectors = [0u32; 8];
    for _ in 0..800 {
        let (_, angle) = choose_flee_offset(&config, Some((35.0, 1.0)), &mut rng);
        assert!((0.0..=TAU).contains(&angle), "angle {angle} outside the circle");
        sectors[((angle / TAU) * 8.0) as usize % 8] += 1;
    }
    // uniform: every octant gets roughly an eighth of the draws
    for (i, &count) in sectors.iter().enumerate() {
        assert!((50..=150).contains(&count), "octant {i} got {count} of 800");
    }
}

#[test]
fn follow_holds_position_behind_target() {
    let mut world = world_with(&[(1, Vec3::ZERO), (2, Vec3::new(20.0, 0.0, 0.0))]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 7);
    driver.start(&ctx, &mut world, 1, FollowMovementGenerator::new(2u64, 3.0, ChaseAngle::new(PI)));
    assert_eq!(world.followers().target_of(1), Some((2, FollowKind::Follow)));

    run(&mut driver, &mut world, &mut ctx, 30);
    let here = world.position(1).pos;
    assert!(here.distance(Vec3::new(14.0, 0.0, 0.0)) < 0.1, "follower at {here:?}");
    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::Follow, 2)]);

    world.place(2, Vec3::new(40.0, 0.0, 0.0));
    run(&mut driver, &mut world, &mut ctx, 1);
    assert_eq!(launches(&world, 1).len(), 2);
}

#[test]
fn follow_with_duration_ends_and_unregisters() {
    let mut world = world_with(&[(1, Vec3::ZERO), (2, Vec3::new(3.0, 0.0, 0.0))]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 7);
    let follow = FollowMovementGenerator::new(2u64, 1.0, ChaseAngle::new(PI)).with_duration(500);
    driver.start(&ctx, &mut world, 1, follow);
    assert!(run(&mut driver, &mut world, &mut ctx, 4).is_empty());
    assert_eq!(run(&mut driver, &mut world, &mut ctx, 1), vec![1]);
    assert_eq!(world.followers().target_of(1), None);
}

#[test]
fn fleeing_runs_away_from_a_close_threat() {
    let mut world = world_with(&[(1, Vec3::ZERO), (2, Vec3::new(-5.0, 0.0, 0.0))]);
    let mut driver = MotionDriver::new();
    let ctx = TickContext::new(0, 0, 11);
    let flee = FleeingMovementGenerator::new(Some(2u64));
    assert_eq!(MovementGenerator::<u64>::priority(&flee), MotionPriority::Highest);
    driver.start(&ctx, &mut world, 1, flee);

    let dest = launches(&world, 1)[0];
    assert!(dest.x > 8.0, "fled toward {dest:?}");
    assert!(world.unit_state(1).contains(UnitState::FLEEING | UnitState::FLEEING_MOVE));
}

#[test]
fn timed_fleeing_ends_and_informs() {
    let mut world = world_with(&[(1, Vec3::ZERO), (2, Vec3::new(-5.0, 0.0, 0.0))]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 11);
    let flee = FleeingMovementGenerator::timed(Some(2u64), 1000);
    assert_eq!(MovementGenerator::<u64>::kind(&flee), MovementGeneratorType::TimedFleeing);
    driver.start(&ctx, &mut world, 1, flee);

    assert!(run(&mut driver, &mut world, &mut ctx, 9).is_empty());
    assert_eq!(run(&mut driver, &mut world, &mut ctx, 1), vec![1]);
    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::TimedFleeing, 0)]);
    assert!(!world.unit_state(1).intersects(UnitState::FLEEING | UnitState::FLEEING_MOVE));
}

#[test]
fn confused_unit_stays_near_where_it_started() {
    let start = Vec3::new(10.0, 10.0, 0.0);
    let mut world = world_with(&[(1, start)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 3);
    driver.start(&ctx, &mut world, 1, ConfusedMovementGenerator::new());

    for _ in 0..100 {
        run(&mut driver, &mut world, &mut ctx, 1);
        let offset = world.position(1).pos.distance_2d(start);
        assert!(offset <= world.motion_config().confused.radius + 1e-3, "wandered {offset}");
    }
    assert!(launches(&world, 1).len() > 1);
}

#[test]
fn confused_unit_waits_while_stunned() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 3);
    driver.start(&ctx, &mut world, 1, ConfusedMovementGenerator::new());
    world.add_unit_state(1, UnitState::STUNNED);

    let before = launches(&world, 1).len();
    run(&mut driver, &mut world, &mut ctx, 30);
    assert_eq!(launches(&world, 1).len(), before);
    assert!(driver.get(1).is_some_and(|g| g.has_flag(ai_motion::GeneratorFlags::INTERRUPTED)));
}

#[test]
fn random_wander_stays_inside_its_radius() {
    let start = Vec3::new(50.0, 50.0, 0.0);
    let mut world = world_with(&[(1, start)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 5);
    driver.start(&ctx, &mut world, 1, RandomMovementGenerator::new(8.0));

    run(&mut driver, &mut world, &mut ctx, 600);
    let destinations = launches(&world, 1);
    assert!(destinations.len() > 2);
    for dest in destinations {
        assert!(dest.distance_2d(start) <= 8.0 + 1e-3, "wander target {dest:?}");
    }
    assert_eq!(driver.get(1).and_then(|g| g.reset_position(1, &world)), Some(start));
}

#[test]
fn random_wander_pauses_until_resumed() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 5);
    driver.start(&ctx, &mut world, 1, RandomMovementGenerator::new(8.0));
    run(&mut driver, &mut world, &mut ctx, 1);

    driver.pause(1, 0);
    let before = launches(&world, 1).len();
    run(&mut driver, &mut world, &mut ctx, 300);
    assert_eq!(launches(&world, 1).len(), before);

    driver.resume(1, 1);
    run(&mut driver, &mut world, &mut ctx, 1);
    assert_eq!(launches(&world, 1).len(), before + 1);
}

#[test]
fn home_returns_and_clears_evade() {
    let mut world = world_with(&[(1, Vec3::new(14.0, 0.0, 0.0))]);
    world.set_home_position(1, Position::new(Vec3::ZERO, 1.0));
    world.add_unit_state(1, UnitState::EVADE);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    driver.start(&ctx, &mut world, 1, HomeMovementGenerator::new());

    run(&mut driver, &mut world, &mut ctx, 19);
    assert!(world.unit_state(1).contains(UnitState::EVADE));
    assert_eq!(run(&mut driver, &mut world, &mut ctx, 1), vec![1]);

    assert!(world.events().contains(&SimEvent::ReachedHome { unit: 1 }));
    assert!(!world.unit_state(1).contains(UnitState::EVADE));
    assert!(angle_diff(world.position(1).orientation, 1.0) < 1e-4);
}

#[test]
fn rooted_unit_reaches_home_immediately() {
    let mut world = world_with(&[(1, Vec3::new(14.0, 0.0, 0.0))]);
    world.add_unit_state(1, UnitState::ROOT);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    driver.start(&ctx, &mut world, 1, HomeMovementGenerator::new());

    assert_eq!(run(&mut driver, &mut world, &mut ctx, 1), vec![1]);
    assert!(launches(&world, 1).is_empty());
    assert!(world.events().contains(&SimEvent::ReachedHome { unit: 1 }));
}

#[test]
fn rotate_turns_a_full_circle_per_duration() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    driver.start(&ctx, &mut world, 1, RotateMovementGenerator::new(5, 1000, RotateDirection::Left));
    assert!(world.unit_state(1).contains(UnitState::ROTATING));

    run(&mut driver, &mut world, &mut ctx, 2);
    assert!(angle_diff(world.position(1).orientation, 2.0 * TAU / 10.0) < 1e-4);

    assert!(run(&mut driver, &mut world, &mut ctx, 7).is_empty());
    assert_eq!(run(&mut driver, &mut world, &mut ctx, 1), vec![1]);
    assert!(angle_diff(world.position(1).orientation, 0.0) < 1e-3);
    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::Rotate, 5)]);
    assert!(!world.unit_state(1).contains(UnitState::ROTATING));
}

#[test]
fn rotate_right_turns_clockwise() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    driver.start(
        &ctx,
        &mut world,
        1,
        RotateMovementGenerator::new(5, 4000, RotateDirection::Right),
    );
    run(&mut driver, &mut world, &mut ctx, 10);
    assert!(angle_diff(world.position(1).orientation, TAU - PI / 2.0) < 1e-3);
}

#[test]
fn distract_looks_away_then_back_home() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    driver.start(&ctx, &mut world, 1, DistractMovementGenerator::new(500, 2.0));
    assert!(world.unit_state(1).contains(UnitState::DISTRACTED));
    assert!(angle_diff(world.position(1).orientation, 2.0) < 1e-6);

    assert!(run(&mut driver, &mut world, &mut ctx, 5).is_empty());
    assert_eq!(run(&mut driver, &mut world, &mut ctx, 1), vec![1]);
    assert!(!world.unit_state(1).contains(UnitState::DISTRACTED));
    assert!(angle_diff(world.position(1).orientation, 0.0) < 1e-6);
}

#[test]
fn formation_member_reaches_its_slot() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    let slot = Position::new(Vec3::new(7.0, 0.0, 0.0), 1.5);
    driver.start(
        &ctx,
        &mut world,
        1,
        FormationMovementGenerator::new(3, slot, WaypointMoveType::Walk, true, true),
    );

    assert!(run(&mut driver, &mut world, &mut ctx, 9).is_empty());
    assert_eq!(run(&mut driver, &mut world, &mut ctx, 1), vec![1]);
    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::Formation, 3)]);
    assert!(angle_diff(world.position(1).orientation, 1.5) < 1e-4);
}

#[test]
fn generic_spline_informs_with_its_kind() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    let init = MoveSplineInit::new().move_direct(Vec3::ZERO, Vec3::new(7.0, 0.0, 0.0));
    driver.start(
        &ctx,
        &mut world,
        1,
        GenericMovementGenerator::new(init, MovementGeneratorType::Effect, 9),
    );

    assert!(run(&mut driver, &mut world, &mut ctx, 9).is_empty());
    assert_eq!(run(&mut driver, &mut world, &mut ctx, 1), vec![1]);
    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::Effect, 9)]);
}

#[test]
fn cyclic_generic_spline_never_expires() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    let init = MoveSplineInit::new()
        .move_by_path(vec![
            Vec3::ZERO,
            Vec3::new(7.0, 0.0, 0.0),
            Vec3::new(7.0, 7.0, 0.0),
            Vec3::ZERO,
        ])
        .cyclic();
    driver.start(
        &ctx,
        &mut world,
        1,
        GenericMovementGenerator::new(init, MovementGeneratorType::Effect, 9),
    );
    assert!(run(&mut driver, &mut world, &mut ctx, 200).is_empty());
    assert!(world.is_spline_cyclic(1));
}

#[test]
fn idle_never_moves() {
    let mut world = world_with(&[(1, Vec3::new(1.0, 2.0, 0.0))]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    driver.start(&ctx, &mut world, 1, IdleMovementGenerator::new());
    assert!(run(&mut driver, &mut world, &mut ctx, 50).is_empty());
    assert_eq!(world.position(1).pos, Vec3::new(1.0, 2.0, 0.0));
    assert!(launches(&world, 1).is_empty());
}

#[test]
fn finalize_runs_once() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut ctx = TickContext::new(0, 0, 1);
    let mut generator: MotionGenerator<u64> =
        RotateMovementGenerator::new(8, 100, RotateDirection::Left).into();
    generator.initialize(&ctx, 1, &mut world);
    ctx = ctx.next(STEP_MS);
    assert!(!generator.update(&ctx, 1, &mut world));

    generator.finalize(1, &mut world, true, true);
    generator.finalize(1, &mut world, true, true);
    assert!(generator.is_finalized());
    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::Rotate, 8)]);
}

#[test]
fn replacing_a_generator_finalizes_the_old_one_silently() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    driver.start(
        &ctx,
        &mut world,
        1,
        PointMovementGenerator::<u64>::new(1, Vec3::new(30.0, 0.0, 0.0), false),
    );
    run(&mut driver, &mut world, &mut ctx, 2);

    driver.start(&ctx, &mut world, 1, DistractMovementGenerator::new(1000, 0.5));
    assert!(informs(&world, 1).is_empty());
    assert!(!world.unit_state(1).contains(UnitState::ROAMING));
    assert!(world.unit_state(1).contains(UnitState::DISTRACTED));
    assert_eq!(driver.get(1).map(|g| g.kind()), Some(MovementGeneratorType::Distract));
}

#[test]
fn interrupted_generator_is_reset_once_the_interruption_ends() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let mut ctx = TickContext::new(0, 0, 1);
    driver.start(
        &ctx,
        &mut world,
        1,
        PointMovementGenerator::<u64>::new(5, Vec3::new(35.0, 0.0, 0.0), false),
    );
    run(&mut driver, &mut world, &mut ctx, 10);

    driver.interrupt(
        &ctx,
        &mut world,
        1,
        RotateMovementGenerator::new(9, 500, RotateDirection::Left),
    );
    assert!(driver.suspended(1).is_some_and(|g| g.has_flag(GeneratorFlags::DEACTIVATED)));
    assert!(!world.unit_state(1).intersects(UnitState::ROAMING | UnitState::ROAMING_MOVE));
    assert!(world.unit_state(1).contains(UnitState::ROTATING));
    let held = world.position(1).pos;

    assert_eq!(run(&mut driver, &mut world, &mut ctx, 5), vec![1]);
    assert_eq!(world.position(1).pos, held);
    assert_eq!(informs(&world, 1), vec![(MovementGeneratorType::Rotate, 9)]);
    assert!(!world.unit_state(1).contains(UnitState::ROTATING));

    run(&mut driver, &mut world, &mut ctx, 1);
    assert!(driver.suspended(1).is_none());
    assert!(driver.get(1).is_some_and(|g| !g.has_flag(GeneratorFlags::DEACTIVATED)));
    assert_eq!(launches(&world, 1).len(), 2);
    assert!(world.unit_state(1).contains(UnitState::ROAMING | UnitState::ROAMING_MOVE));

    run(&mut driver, &mut world, &mut ctx, 60);
    assert_eq!(
        informs(&world, 1),
        vec![(MovementGeneratorType::Rotate, 9), (MovementGeneratorType::Point, 5)]
    );
    assert!(world.position(1).pos.distance(Vec3::new(35.0, 0.0, 0.0)) < 1e-3);
    assert!(driver.is_empty());
}

#[test]
fn clearing_a_unit_finalizes_the_suspended_generator_too() {
    let mut world = world_with(&[(1, Vec3::ZERO)]);
    let mut driver = MotionDriver::new();
    let ctx = TickContext::new(0, 0, 1);
    driver.start(
        &ctx,
        &mut world,
        1,
        PointMovementGenerator::<u64>::new(5, Vec3::new(35.0, 0.0, 0.0), false),
    );
    driver.interrupt(&ctx, &mut world, 1, DistractMovementGenerator::new(1000, 0.5));

    driver.clear(&mut world, 1);
    assert!(driver.is_empty());
    assert!(driver.suspended(1).is_none());
    assert!(informs(&world, 1).is_empty());
    assert!(!world.unit_state(1).intersects(UnitState::ROAMING | UnitState::DISTRACTED));
}

#[test]
fn loss_of_control_generators_run_in_controlled_mode() {
    let flee: MotionGenerator<u64> = FleeingMovementGenerator::new(Some(2u64)).into();
    let confused: MotionGenerator<u64> = ConfusedMovementGenerator::new().into();
    let distract: MotionGenerator<u64> = DistractMovementGenerator::new(100, 0.0).into();
    let init = MoveSplineInit::new();
    let generic: MotionGenerator<u64> =
        GenericMovementGenerator::new(init, MovementGeneratorType::Effect, 0).into();
    let point: MotionGenerator<u64> = PointMovementGenerator::new(1, Vec3::ZERO, false).into();

    assert_eq!(flee.mode(), MotionMode::Controlled);
    assert_eq!(confused.mode(), MotionMode::Controlled);
    assert_eq!(distract.mode(), MotionMode::Controlled);
    assert_eq!(generic.mode(), MotionMode::Override);
    assert_eq!(point.mode(), MotionMode::Default);
}
