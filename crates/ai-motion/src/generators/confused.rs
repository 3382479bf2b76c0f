use ai_core::{DeterministicRng, TickContext, TimeTracker, UnitId, Vec3, TAU};
use ai_nav::{PathGenerator, PathType};

use super::{calculate_path, new_path, stream};
use crate::{
    GeneratorFlags, MotionMode, MotionPriority, MotionWorld, MoveSplineInit, MovementGenerator,
    MovementGeneratorType, UnitState,
};

/// Stumbles around the spot where confusion set in.
#[derive(Debug)]
pub struct ConfusedMovementGenerator {
    flags: GeneratorFlags,
    timer: TimeTracker,
    reference: Vec3,
    path: Option<PathGenerator>,
}

impl Default for ConfusedMovementGenerator {
    fn default() -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            timer: TimeTracker::new(0),
            reference: Vec3::ZERO,
            path: None,
        }
    }
}

impl ConfusedMovementGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference(&self) -> Vec3 {
        self.reference
    }
}

impl<U: UnitId> MovementGenerator<U> for ConfusedMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Confused
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
        UnitState::CONFUSED
    }

    fn initialize<W: MotionWorld<Unit = U>>(
        &mut self,
        _ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) {
        self.flags.remove(
            GeneratorFlags::INITIALIZATION_PENDING
                | GeneratorFlags::TRANSITORY
                | GeneratorFlags::DEACTIVATED,
        );
        self.flags.insert(GeneratorFlags::INITIALIZED);
        if !world.is_alive(owner) {
            return;
        }
        world.stop_moving(owner);
        self.timer.reset(0);
        self.reference = world.position(owner).pos;
        self.path = None;
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
        if world.is_immobilized(owner) {
            self.flags.insert(GeneratorFlags::INTERRUPTED);
            world.stop_moving(owner);
            self.path = None;
            return true;
        }
        self.flags.remove(GeneratorFlags::INTERRUPTED);

        self.timer.update(ctx.diff_ms);
        let finalized = world.is_spline_finalized(owner);
        if !((self.flags.contains(GeneratorFlags::SPEED_UPDATE_PENDING) && !finalized)
            || (self.timer.passed() && finalized))
        {
            return true;
        }
        self.flags.remove(GeneratorFlags::TRANSITORY);

        let config = world.motion_config().confused.clone();
        let mut rng = ctx.rng_for_unit(owner, stream::CONFUSED);
        let distance = rng.range_f32(-config.radius, config.radius);
        let angle = rng.range_f32(0.0, TAU);
        let dest = world.move_position_to_first_collision(owner, self.reference, distance, angle);

        if !world.is_within_los(world.position(owner).pos, dest) {
            self.timer.reset(config.los_retry_ms);
            return true;
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
            return true;
        }

        world.add_unit_state(owner, UnitState::CONFUSED_MOVE);
        let init = MoveSplineInit::new().move_by_path(path.path().to_vec()).walk(true);
        self.path = Some(path);
        let travel = world.launch_spline(owner, init);
        self.timer.reset(travel + rng.range_u32(config.min_wait_ms, config.max_wait_ms));
        true
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
        world.clear_unit_state(owner, UnitState::CONFUSED_MOVE);
    }

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        active: bool,
        _inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
        if active {
            world.clear_unit_state(owner, UnitState::CONFUSED_MOVE);
            world.stop_moving(owner);
            if let Some(victim) = world.victim(owner) {
                world.set_in_front(owner, victim);
            }
        }
    }
}
