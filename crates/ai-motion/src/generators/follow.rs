use ai_core::{normalize_orientation, Position, TickContext, TimeTracker, UnitId};
use ai_nav::{PathGenerator, PathType};

use super::{calculate_path, near_point, new_path, ChaseAngle};
use crate::{
    FollowKind, GeneratorFlags, MotionWorld, MoveSplineInit, MovementGenerator,
    MovementGeneratorType, TargetRef, UnitState,
};

/// Keeps the owner near a target, e.g. a pet at heel or an escort beside its charge.
#[derive(Debug)]
pub struct FollowMovementGenerator<U> {
    flags: GeneratorFlags,
    target: TargetRef<U>,
    range: f32,
    angle: ChaseAngle,
    duration: Option<TimeTracker>,
    check_timer: TimeTracker,
    path: Option<PathGenerator>,
    last_target_position: Option<Position>,
}

impl<U: UnitId> FollowMovementGenerator<U> {
    pub fn new(target: U, range: f32, angle: ChaseAngle) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            target: TargetRef::new(target),
            range,
            angle,
            duration: None,
            check_timer: TimeTracker::new(0),
            path: None,
            last_target_position: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration = Some(TimeTracker::new(duration_ms));
        self
    }

    pub fn target(&self) -> U {
        self.target.unit()
    }

    fn position_okay<W: MotionWorld<Unit = U>>(
        world: &W,
        owner: U,
        target: U,
        range: f32,
        angle: Option<ChaseAngle>,
    ) -> bool {
        let owner_pos = world.position(owner).pos;
        let target_pos = world.position(target);
        let reach = world.combat_reach(owner) + world.combat_reach(target) + range;
        if owner_pos.distance_sq(target_pos.pos) > reach * reach {
            return false;
        }
        angle.map_or(true, |a| a.is_angle_okay(target_pos.relative_angle_to(owner_pos)))
    }

    /// Angle to approach at: the current one if it is inside the window, else the
    /// nearer window edge.
    fn approach_angle(&self, current: f32) -> f32 {
        if self.angle.is_angle_okay(current) {
            return current;
        }
        let upper = self.angle.upper_bound();
        let lower = self.angle.lower_bound();
        let diff_upper = normalize_orientation(current - upper);
        let diff_lower = normalize_orientation(lower - current);
        if diff_upper < diff_lower {
            upper
        } else {
            lower
        }
    }
}

impl<U: UnitId> MovementGenerator<U> for FollowMovementGenerator<U> {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Follow
    }

    fn flags(&self) -> GeneratorFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        &mut self.flags
    }

    fn base_unit_state(&self) -> UnitState {
        UnitState::FOLLOW
    }

    fn initialize<W: MotionWorld<Unit = U>>(
        &mut self,
        _ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) {
        self.flags.remove(GeneratorFlags::INITIALIZATION_PENDING | GeneratorFlags::DEACTIVATED);
        self.flags.insert(GeneratorFlags::INITIALIZED);

        world.stop_moving(owner);
        self.path = None;
        self.last_target_position = None;
        self.check_timer.reset(world.motion_config().follow.check_interval_ms);
        world.followers_mut().register(owner, self.target.unit(), FollowKind::Follow);
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::DEACTIVATED);
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
        let Some(target) = self.target.resolve(world) else {
            return false;
        };

        if world.is_immobilized(owner) {
            self.path = None;
            world.stop_moving(owner);
            self.last_target_position = None;
            return true;
        }

        if let Some(duration) = self.duration.as_mut() {
            duration.update(ctx.diff_ms);
            if duration.passed() {
                return false;
            }
        }

        self.check_timer.update(ctx.diff_ms);
        if self.check_timer.passed() {
            self.check_timer.reset(world.motion_config().follow.check_interval_ms);
            if self.flags.contains(GeneratorFlags::INFORM_ENABLED)
                && Self::position_okay(world, owner, target, self.range, Some(self.angle))
            {
                self.flags.remove(GeneratorFlags::INFORM_ENABLED);
                self.path = None;
                world.stop_moving(owner);
                self.last_target_position = None;
                let id = target.stable_id() as u32;
                world.movement_inform(owner, MovementGeneratorType::Follow, id);
                return true;
            }
        }

        if world.has_unit_state(owner, UnitState::FOLLOW_MOVE) && world.is_spline_finalized(owner) {
            self.flags.remove(GeneratorFlags::INFORM_ENABLED);
            self.path = None;
            world.clear_unit_state(owner, UnitState::FOLLOW_MOVE);
            world.movement_inform(owner, MovementGeneratorType::Follow, target.stable_id() as u32);
        }

        let target_position = world.position(target);
        if self
            .last_target_position
            .is_some_and(|last| last.pos.distance_sq(target_position.pos) <= 0.0)
        {
            return true;
        }
        self.last_target_position = Some(target_position);

        let tolerance = world.motion_config().follow.range_tolerance;
        if !world.has_unit_state(owner, UnitState::FOLLOW_MOVE)
            && Self::position_okay(world, owner, target, self.range + tolerance, None)
        {
            return true;
        }

        let mut path = self.path.take().unwrap_or_else(|| new_path(world, owner));
        let owner_pos = world.position(owner).pos;
        let relative = self.approach_angle(target_position.relative_angle_to(owner_pos));
        let abs_angle = target_position.to_absolute_angle(relative);
        let dest = near_point(world, owner, target, self.range, abs_angle);

        // pets may cut corners to keep up with their owner
        let allow_shortcut = world.is_pet_of(owner, target);
        let ok = calculate_path(world, owner, &mut path, dest, allow_shortcut);
        if !ok || (path.path_type().contains(PathType::NOPATH) && !allow_shortcut) {
            world.stop_moving(owner);
            self.path = Some(path);
            return true;
        }

        world.add_unit_state(owner, UnitState::FOLLOW_MOVE);
        self.flags.insert(GeneratorFlags::INFORM_ENABLED);
        let init = MoveSplineInit::new()
            .move_by_path(path.path().to_vec())
            .walk(world.is_walking(target))
            .face_angle(target_position.orientation);
        self.path = Some(path);
        world.launch_spline(owner, init);
        true
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
        world.clear_unit_state(owner, UnitState::FOLLOW_MOVE);
        world.followers_mut().unregister(owner);
    }

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        active: bool,
        movement_inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
        if active {
            world.clear_unit_state(owner, UnitState::FOLLOW_MOVE);
        }
        if world.followers().target_of(owner) == Some((self.target.unit(), FollowKind::Follow)) {
            world.followers_mut().unregister(owner);
        }
        if movement_inform && self.flags.contains(GeneratorFlags::INFORM_ENABLED) {
            let id = self.target.unit().stable_id() as u32;
            world.movement_inform(owner, MovementGeneratorType::Follow, id);
        }
    }
}
