use core::f32::consts::PI;

use ai_core::{DeterministicRng, TickContext, TimeTracker, UnitId, TAU};
use ai_nav::{PathGenerator, PathType};

use super::{calculate_path, new_path, stream};
use crate::{
    FleeConfig, GeneratorFlags, MotionMode, MotionPriority, MotionWorld, MoveSplineInit,
    MovementGenerator, MovementGeneratorType, TargetRef, UnitState,
};

/// Pick how far and in which direction to run.
///
/// `threat` is the distance and absolute angle from the threat to the fleeing unit.
/// Too close: run directly away. Too far: drift back toward the threat. Inside the quiet
/// band: any direction.
pub fn choose_flee_offset<R: DeterministicRng>(
    config: &FleeConfig,
    threat: Option<(f32, f32)>,
    rng: &mut R,
) -> (f32, f32) {
    let (caster_distance, caster_angle) = match threat {
        Some((distance, angle)) if distance > 0.2 => (distance, angle),
        Some((distance, _)) => (distance, rng.range_f32(0.0, TAU)),
        None => (0.0, rng.range_f32(0.0, TAU)),
    };
    let (min, max) = (config.min_quiet_distance, config.max_quiet_distance);

    if caster_distance < min {
        let distance = rng.range_f32(0.4, 1.3) * (min - caster_distance);
        let angle = caster_angle + rng.range_f32(-PI / 8.0, PI / 8.0);
        (distance, angle)
    } else if caster_distance > max {
        let distance = rng.range_f32(0.4, 1.0) * (max - min);
        let angle = caster_angle + PI + rng.range_f32(-PI / 4.0, PI / 4.0);
        (distance, angle)
    } else {
        let distance = rng.range_f32(0.6, 1.2) * (max - min);
        (distance, rng.range_f32(0.0, TAU))
    }
}

/// Runs from a threat until the quiet band is reached, then keeps wandering inside it.
#[derive(Debug)]
pub struct FleeingMovementGenerator<U> {
    flags: GeneratorFlags,
    threat: Option<TargetRef<U>>,
    timer: TimeTracker,
    total_time: Option<TimeTracker>,
    path: Option<PathGenerator>,
}

impl<U: UnitId> FleeingMovementGenerator<U> {
    pub fn new(threat: Option<U>) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            threat: threat.map(TargetRef::new),
            timer: TimeTracker::new(0),
            total_time: None,
            path: None,
        }
    }

    /// Flee for a fixed time, then end.
    pub fn timed(threat: Option<U>, duration_ms: u32) -> Self {
        let mut generator = Self::new(threat);
        generator.total_time = Some(TimeTracker::new(duration_ms));
        generator
    }

    fn interrupt<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W) {
        self.flags.insert(GeneratorFlags::INTERRUPTED);
        world.stop_moving(owner);
        self.path = None;
    }

    fn set_target_location<W: MotionWorld<Unit = U>>(
        &mut self,
        ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) {
        if !world.is_alive(owner) {
            return;
        }
        if world.is_immobilized(owner) {
            self.interrupt(owner, world);
            return;
        }

        let config = world.motion_config().flee.clone();
        let here = world.position(owner).pos;
        let threat = self.threat.and_then(|t| t.resolve(world)).map(|t| {
            let from = world.position(t).pos;
            (from.distance(here), ai_core::absolute_angle(from, here))
        });
        let mut rng = ctx.rng_for_unit(owner, stream::FLEE);
        let (distance, angle) = choose_flee_offset(&config, threat, &mut rng);
        let dest = world.move_position_to_first_collision(owner, here, distance, angle);

        if !world.is_within_los(here, dest) {
            self.timer.reset(config.los_retry_ms);
            return;
        }

        let mut path = match self.path.take() {
            Some(path) => path,
            None => {
                let mut path = new_path(world, owner);
                path.set_path_length_limit(config.path_length_limit);
                path
            }
        };
        let ok = calculate_path(world, owner, &mut path, dest, false);
        let ty = path.path_type();
        if !ok || ty.intersects(PathType::NOPATH | PathType::SHORTCUT | PathType::FARFROMPOLY) {
            self.path = Some(path);
            self.timer.reset(config.bad_path_retry_ms);
            return;
        }

        world.add_unit_state(owner, UnitState::FLEEING_MOVE);
        let init = MoveSplineInit::new().move_by_path(path.path().to_vec()).walk(false);
        self.path = Some(path);
        let travel = world.launch_spline(owner, init);
        self.timer.reset(travel + rng.range_u32(config.min_wait_ms, config.max_wait_ms));
    }
}

impl<U: UnitId> MovementGenerator<U> for FleeingMovementGenerator<U> {
    fn kind(&self) -> MovementGeneratorType {
        if self.total_time.is_some() {
            MovementGeneratorType::TimedFleeing
        } else {
            MovementGeneratorType::Fleeing
        }
    }

    fn priority(&self) -> MotionPriority {
        MotionPriority::Highest
    }

    fn mode(&self) -> MotionMode {
        MotionMode::Controlled
    }

    fn flags(&self) -> GeneratorFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        &mut self.flags
    }

    fn base_unit_state(&self) -> UnitState {
        UnitState::FLEEING
    }

    fn initialize<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::INITIALIZATION_PENDING | GeneratorFlags::DEACTIVATED);
        self.flags.insert(GeneratorFlags::INITIALIZED);
        if !world.is_alive(owner) {
            return;
        }
        self.path = None;
        self.set_target_location(ctx, owner, world);
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::TRANSITORY | GeneratorFlags::DEACTIVATED);
        self.initialize(ctx, owner, world);
    }

    fn update<W: MotionWorld<Unit = U>>(
        &mut self,
        ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) -> bool {
        if !world.is_alive(owner) {
            return false;
        }
        if let Some(total) = self.total_time.as_mut() {
            total.update(ctx.diff_ms);
            if total.passed() {
                return false;
            }
        }
        if world.is_immobilized(owner) {
            self.interrupt(owner, world);
            return true;
        }
        self.flags.remove(GeneratorFlags::INTERRUPTED);

        self.timer.update(ctx.diff_ms);
        let finalized = world.is_spline_finalized(owner);
        if (self.flags.contains(GeneratorFlags::SPEED_UPDATE_PENDING) && !finalized)
            || (self.timer.passed() && finalized)
        {
            self.flags.remove(GeneratorFlags::TRANSITORY);
            self.set_target_location(ctx, owner, world);
        }
        true
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
        world.clear_unit_state(owner, UnitState::FLEEING_MOVE);
    }

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        active: bool,
        movement_inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
        if !active {
            return;
        }
        world.clear_unit_state(owner, UnitState::FLEEING_MOVE);
        if let Some(victim) = world.victim(owner) {
            world.set_in_front(owner, victim);
        }
        if movement_inform && self.total_time.is_some() {
            world.movement_inform(owner, MovementGeneratorType::TimedFleeing, 0);
        }
    }
}
