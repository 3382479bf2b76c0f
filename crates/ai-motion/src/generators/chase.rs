use ai_core::{
    normalize_orientation, Position, TickContext, TimeTracker, UnitId, CONTACT_DISTANCE, TAU,
};
use ai_nav::{PathGenerator, PathType};
use serde::{Deserialize, Serialize};

use super::{calculate_path, near_point, new_path};
use crate::{
    FollowKind, GeneratorFlags, MotionWorld, MoveSplineInit, MovementGenerator,
    MovementGeneratorType, TargetRef, UnitPathAgent, UnitState,
};

/// Acceptable distance band around a target, measured between hitboxes.
///
/// Movement starts when the owner leaves `[min_range, max_range]` and aims for
/// `[min_tolerance, max_tolerance]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaseRange {
    pub min_range: f32,
    pub min_tolerance: f32,
    pub max_range: f32,
    pub max_tolerance: f32,
}

impl ChaseRange {
    /// Hold roughly `range` away.
    pub fn new(range: f32) -> Self {
        Self {
            min_range: if range > CONTACT_DISTANCE { 0.0 } else { range - CONTACT_DISTANCE },
            min_tolerance: range,
            max_range: range + CONTACT_DISTANCE,
            max_tolerance: range,
        }
    }

    pub fn between(min_range: f32, max_range: f32) -> Self {
        let min_tolerance = (min_range + CONTACT_DISTANCE).min((min_range + max_range) / 2.0);
        Self {
            min_range,
            min_tolerance,
            max_range,
            max_tolerance: (max_range - CONTACT_DISTANCE).max(min_tolerance),
        }
    }

    pub fn explicit(
        min_range: f32,
        min_tolerance: f32,
        max_tolerance: f32,
        max_range: f32,
    ) -> Self {
        Self { min_range, min_tolerance, max_range, max_tolerance }
    }
}

/// Angle window relative to the target's facing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaseAngle {
    pub relative_angle: f32,
    pub tolerance: f32,
}

impl ChaseAngle {
    pub fn new(angle: f32) -> Self {
        Self::with_tolerance(angle, core::f32::consts::FRAC_PI_4)
    }

    pub fn with_tolerance(angle: f32, tolerance: f32) -> Self {
        Self { relative_angle: normalize_orientation(angle), tolerance }
    }

    pub fn upper_bound(&self) -> f32 {
        normalize_orientation(self.relative_angle + self.tolerance)
    }

    pub fn lower_bound(&self) -> f32 {
        normalize_orientation(self.relative_angle - self.tolerance)
    }

    pub fn is_angle_okay(&self, relative_angle: f32) -> bool {
        let diff = (relative_angle - self.relative_angle).abs();
        diff.min(TAU - diff) <= self.tolerance
    }
}

/// Closes in on a target and keeps within range of it.
#[derive(Debug)]
pub struct ChaseMovementGenerator<U> {
    flags: GeneratorFlags,
    target: TargetRef<U>,
    range: Option<ChaseRange>,
    angle: Option<ChaseAngle>,
    range_check_timer: TimeTracker,
    path: Option<PathGenerator>,
    last_target_position: Option<Position>,
    moving_towards: bool,
    mutual_chase: bool,
}

impl<U: UnitId> ChaseMovementGenerator<U> {
    pub fn new(target: U) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            target: TargetRef::new(target),
            range: None,
            angle: None,
            range_check_timer: TimeTracker::new(0),
            path: None,
            last_target_position: None,
            moving_towards: true,
            mutual_chase: false,
        }
    }

    pub fn with_range(mut self, range: ChaseRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_angle(mut self, angle: ChaseAngle) -> Self {
        self.angle = Some(angle);
        self
    }

    pub fn target(&self) -> U {
        self.target.unit()
    }

    fn position_okay<W: MotionWorld<Unit = U>>(
        world: &W,
        owner: U,
        target: U,
        min: Option<f32>,
        max: Option<f32>,
        angle: Option<ChaseAngle>,
    ) -> bool {
        let owner_pos = world.position(owner).pos;
        let target_pos = world.position(target);
        let dist_sq = owner_pos.distance_sq(target_pos.pos);
        if min.is_some_and(|m| dist_sq < m * m) {
            return false;
        }
        if max.is_some_and(|m| dist_sq > m * m) {
            return false;
        }
        if angle.is_some_and(|a| !a.is_angle_okay(target_pos.relative_angle_to(owner_pos))) {
            return false;
        }
        world.is_within_los(owner_pos, target_pos.pos)
    }

    fn stop_and_inform<W: MotionWorld<Unit = U>>(&mut self, owner: U, target: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::INFORM_ENABLED);
        self.path = None;
        world.set_cannot_reach_target(owner, false);
        world.set_in_front(owner, target);
        world.movement_inform(owner, MovementGeneratorType::Chase, target.stable_id() as u32);
    }
}

impl<U: UnitId> MovementGenerator<U> for ChaseMovementGenerator<U> {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Chase
    }

    fn flags(&self) -> GeneratorFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        &mut self.flags
    }

    fn base_unit_state(&self) -> UnitState {
        UnitState::CHASE
    }

    fn initialize<W: MotionWorld<Unit = U>>(
        &mut self,
        _ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) {
        self.flags.remove(GeneratorFlags::INITIALIZATION_PENDING | GeneratorFlags::DEACTIVATED);
        self.flags.insert(GeneratorFlags::INITIALIZED);

        self.path = None;
        self.last_target_position = None;
        self.range_check_timer.reset(world.motion_config().chase.range_check_interval_ms);
        world.followers_mut().register(owner, self.target.unit(), FollowKind::Chase);
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

        if world.is_immobilized(owner) || world.victim(owner) != Some(target) {
            world.stop_moving(owner);
            self.last_target_position = None;
            world.set_cannot_reach_target(owner, false);
            return true;
        }

        let mutual_chase = world.followers().is_chasing(target, owner);
        let hitbox_sum = world.combat_reach(owner) + world.combat_reach(target);
        let (min_range, min_target, max_range, max_target) = match self.range {
            Some(r) => (
                r.min_range + hitbox_sum,
                r.min_tolerance + hitbox_sum,
                r.max_range + hitbox_sum,
                r.max_tolerance + hitbox_sum,
            ),
            None => (
                CONTACT_DISTANCE,
                hitbox_sum,
                world.melee_range(owner, target),
                CONTACT_DISTANCE + hitbox_sum,
            ),
        };
        let angle = if mutual_chase { None } else { self.angle };

        self.range_check_timer.update(ctx.diff_ms);
        if self.range_check_timer.passed() {
            self.range_check_timer.reset(world.motion_config().chase.range_check_interval_ms);
            let (min, max) = if self.moving_towards {
                (None, Some(max_target))
            } else {
                (Some(min_target), None)
            };
            if self.flags.contains(GeneratorFlags::INFORM_ENABLED)
                && Self::position_okay(world, owner, target, min, max, angle)
            {
                world.stop_moving(owner);
                self.stop_and_inform(owner, target, world);
                return true;
            }
        }

        if world.has_unit_state(owner, UnitState::CHASE_MOVE) && world.is_spline_finalized(owner) {
            world.clear_unit_state(owner, UnitState::CHASE_MOVE);
            self.stop_and_inform(owner, target, world);
        }

        let target_position = world.position(target);
        if self.last_target_position == Some(target_position) && mutual_chase == self.mutual_chase {
            return true;
        }
        self.last_target_position = Some(target_position);
        self.mutual_chase = mutual_chase;

        if !world.has_unit_state(owner, UnitState::CHASE_MOVE)
            && Self::position_okay(world, owner, target, Some(min_range), Some(max_range), angle)
        {
            return true;
        }

        if !world.is_in_accessible_place_for(target, owner) {
            world.set_cannot_reach_target(owner, true);
            world.stop_moving(owner);
            self.path = None;
            return true;
        }

        let owner_pos = world.position(owner).pos;
        let move_toward = owner_pos.distance_sq(target_position.pos) >= max_range * max_range;
        let mut path = match self.path.take() {
            Some(path) if move_toward == self.moving_towards => path,
            _ => new_path(world, owner),
        };
        self.moving_towards = move_toward;

        let (dest, shorten) = if move_toward && angle.is_none() {
            (target_position.pos, true)
        } else {
            let distance = if move_toward { max_target } else { min_target } - hitbox_sum;
            let abs_angle = match angle {
                Some(a) => target_position.to_absolute_angle(a.relative_angle),
                None => target_position.absolute_angle_to(owner_pos),
            };
            (near_point(world, owner, target, distance, abs_angle), false)
        };
        let can_fly = world.capabilities(owner).can_fly;
        let ok = calculate_path(world, owner, &mut path, dest, can_fly);
        if !ok || path.path_type().contains(PathType::NOPATH) {
            tracing::debug!(
                unit = ?owner,
                target = ?target,
                path_type = ?path.path_type(),
                "chase target unreachable"
            );
            world.set_cannot_reach_target(owner, true);
            world.stop_moving(owner);
            self.path = Some(path);
            return true;
        }
        if shorten {
            let agent = UnitPathAgent::new(world, owner);
            path.shorten_path_until_dist(&agent, target_position.pos, max_target);
        }
        world.set_cannot_reach_target(owner, false);

        world.add_unit_state(owner, UnitState::CHASE_MOVE);
        self.flags.insert(GeneratorFlags::INFORM_ENABLED);
        let init = MoveSplineInit::new()
            .move_by_path(path.path().to_vec())
            .walk(false)
            .face_unit(target);
        self.path = Some(path);
        world.launch_spline(owner, init);
        true
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
        world.clear_unit_state(owner, UnitState::CHASE_MOVE);
        world.set_cannot_reach_target(owner, false);
        world.followers_mut().unregister(owner);
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
            world.clear_unit_state(owner, UnitState::CHASE_MOVE);
            world.set_cannot_reach_target(owner, false);
        }
        if world.followers().is_chasing(owner, self.target.unit()) {
            world.followers_mut().unregister(owner);
        }
    }
}
