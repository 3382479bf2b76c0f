use ai_core::{DeterministicRng, Position, TickContext, TimeTracker, UnitId, Vec3, TAU};
use ai_nav::{PathGenerator, PathType};
use serde::{Deserialize, Serialize};

use super::{calculate_path, new_path, stream};
use crate::{
    GeneratorFlags, MotionWorld, MoveSplineInit, MovementGenerator, MovementGeneratorType,
    UnitState,
};

/// Gait used while wandering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomMoveKind {
    #[default]
    Walk,
    /// Keep whatever gait the unit currently has.
    CanRun,
    AlwaysRun,
}

/// Wanders around the spot it was started at in short bursts.
#[derive(Debug)]
pub struct RandomMovementGenerator {
    flags: GeneratorFlags,
    timer: TimeTracker,
    reference: Position,
    wander_distance: f32,
    steps_left: u32,
    move_kind: RandomMoveKind,
    path: Option<PathGenerator>,
}

impl RandomMovementGenerator {
    pub fn new(wander_distance: f32) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            timer: TimeTracker::new(0),
            reference: Position::default(),
            wander_distance,
            steps_left: 0,
            move_kind: RandomMoveKind::Walk,
            path: None,
        }
    }

    pub fn with_move_kind(mut self, kind: RandomMoveKind) -> Self {
        self.move_kind = kind;
        self
    }

    pub fn reference(&self) -> Position {
        self.reference
    }

    fn interrupt<W: MotionWorld>(&mut self, owner: W::Unit, world: &mut W) {
        self.flags.insert(GeneratorFlags::INTERRUPTED);
        world.stop_moving(owner);
        self.path = None;
    }

    fn set_random_location<W: MotionWorld>(
        &mut self,
        ctx: &TickContext,
        owner: W::Unit,
        world: &mut W,
    ) {
        if world.is_immobilized(owner) || world.has_unit_state(owner, UnitState::LOST_CONTROL) {
            self.interrupt(owner, world);
            return;
        }

        let config = world.motion_config().random.clone();
        let mut rng = ctx.rng_for_unit(owner, stream::RANDOM);
        let distance = rng.range_f32(0.0, self.wander_distance);
        let angle = rng.range_f32(0.0, TAU);
        let dest =
            world.move_position_to_first_collision(owner, self.reference.pos, distance, angle);

        if !world.is_within_los(world.position(owner).pos, dest) {
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
        // far-from-poly is allowed: wandering swimmers are usually off the mesh
        if !ok || ty.intersects(PathType::NOPATH | PathType::SHORTCUT) {
            tracing::trace!(unit = ?owner, path_type = ?ty, "wander destination rejected");
            self.path = Some(path);
            self.timer.reset(config.bad_path_retry_ms);
            return;
        }

        self.flags.remove(GeneratorFlags::TRANSITORY | GeneratorFlags::TIMED_PAUSED);
        world.add_unit_state(owner, UnitState::ROAMING_MOVE);

        let walk = match self.move_kind {
            RandomMoveKind::Walk => true,
            RandomMoveKind::CanRun => world.is_walking(owner),
            RandomMoveKind::AlwaysRun => false,
        };
        let init = MoveSplineInit::new().move_by_path(path.path().to_vec()).walk(walk);
        self.path = Some(path);
        let duration = world.launch_spline(owner, init);

        self.steps_left = self.steps_left.saturating_sub(1);
        if self.steps_left > 0 {
            self.timer.reset(duration);
        } else {
            let rest = rng.range_u32(config.min_pause_secs, config.max_pause_secs) * 1000;
            self.timer.reset(duration + rest);
            self.steps_left = rng.range_u32(config.min_steps, config.max_steps);
        }
    }
}

impl<U: UnitId> MovementGenerator<U> for RandomMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Random
    }

    fn flags(&self) -> GeneratorFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        &mut self.flags
    }

    fn base_unit_state(&self) -> UnitState {
        UnitState::ROAMING
    }

    fn initialize<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(
            GeneratorFlags::INITIALIZATION_PENDING
                | GeneratorFlags::TRANSITORY
                | GeneratorFlags::DEACTIVATED
                | GeneratorFlags::TIMED_PAUSED,
        );
        self.flags.insert(GeneratorFlags::INITIALIZED);

        if !world.is_alive(owner) {
            return;
        }
        self.reference = world.position(owner);
        world.stop_moving(owner);

        let config = &world.motion_config().random;
        let mut rng = ctx.rng_for_unit(owner, stream::RANDOM ^ 0x5EED);
        self.steps_left = rng.range_u32(config.min_steps, config.max_steps);
        self.timer.reset(0);
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
            return true;
        }
        if self.flags.intersects(GeneratorFlags::FINALIZED | GeneratorFlags::PAUSED) {
            return true;
        }
        if world.is_immobilized(owner) || world.has_unit_state(owner, UnitState::LOST_CONTROL) {
            self.interrupt(owner, world);
            return true;
        }
        self.flags.remove(GeneratorFlags::INTERRUPTED);

        self.timer.update(ctx.diff_ms);
        let finalized = world.is_spline_finalized(owner);
        if (self.flags.contains(GeneratorFlags::SPEED_UPDATE_PENDING) && !finalized)
            || (self.timer.passed() && finalized)
        {
            self.set_random_location(ctx, owner, world);
        }
        true
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
        world.clear_unit_state(owner, UnitState::ROAMING_MOVE);
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
            world.clear_unit_state(owner, UnitState::ROAMING_MOVE);
            world.stop_moving(owner);
        }
    }

    fn pause(&mut self, timer_ms: u32) {
        if timer_ms > 0 {
            self.flags.insert(GeneratorFlags::TIMED_PAUSED);
            self.timer.reset(timer_ms);
            self.flags.remove(GeneratorFlags::PAUSED);
        } else {
            self.flags.insert(GeneratorFlags::PAUSED);
            self.flags.remove(GeneratorFlags::TIMED_PAUSED);
        }
    }

    fn resume(&mut self, override_timer_ms: u32) {
        if override_timer_ms > 0 {
            self.timer.reset(override_timer_ms);
        }
        self.flags.remove(GeneratorFlags::PAUSED);
    }

    fn reset_position<W: MotionWorld<Unit = U>>(&self, _owner: U, _world: &W) -> Option<Vec3> {
        Some(self.reference.pos)
    }
}
