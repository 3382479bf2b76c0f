use std::sync::Arc;

use ai_core::{DeterministicRng, Position, TickContext, TimeTracker, UnitId, Vec3};

use super::stream;
use crate::{
    move_to, GeneratorFlags, MotionWorld, MovementGenerator, MovementGeneratorType, SplineAnimation,
    UnitState, WaypointMoveType, WaypointPath,
};

/// Where a waypoint walker is in its route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointState {
    /// Waiting on the timer before heading (again) for the current node.
    WaitingToStart,
    /// A spline towards the current node is running.
    Moving,
    /// Arrived at the current node; the timer runs out the node's delay.
    WaitingAtNode,
    /// The route is over.
    Finished,
}

/// Plays back an authored waypoint path.
#[derive(Debug)]
pub struct WaypointMovementGenerator {
    flags: GeneratorFlags,
    path_id: u32,
    path: Option<Arc<WaypointPath>>,
    state: WaypointState,
    current: usize,
    timer: TimeTracker,
    duration: Option<TimeTracker>,
    speed: Option<f32>,
    repeating: bool,
    follow_backwards: bool,
    returning: bool,
    generate_path: bool,
}

impl WaypointMovementGenerator {
    /// Path resolved through [`MotionWorld::waypoint_path`] on initialize.
    pub fn from_path_id(path_id: u32, repeating: bool) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            path_id,
            path: None,
            state: WaypointState::WaitingToStart,
            current: 0,
            timer: TimeTracker::new(0),
            duration: None,
            speed: None,
            repeating,
            follow_backwards: false,
            returning: false,
            generate_path: true,
        }
    }

    pub fn with_path(path: Arc<WaypointPath>, repeating: bool) -> Self {
        let mut generator = Self::from_path_id(path.id, repeating);
        generator.path = Some(path);
        generator
    }

    /// Walk back along the path at its ends instead of wrapping around.
    pub fn follow_backwards(mut self) -> Self {
        self.follow_backwards = true;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = (speed > 0.0).then_some(speed);
        self
    }

    /// End the generator after this long, wherever the unit is.
    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration = Some(TimeTracker::new(duration_ms));
        self
    }

    pub fn without_pathfinding(mut self) -> Self {
        self.generate_path = false;
        self
    }

    pub fn state(&self) -> WaypointState {
        self.state
    }

    pub fn current_node(&self) -> usize {
        self.current
    }

    pub fn path_id(&self) -> u32 {
        self.path_id
    }

    fn path(&self) -> Option<&Arc<WaypointPath>> {
        self.path.as_ref().filter(|p| !p.nodes.is_empty())
    }

    /// Step to the next node. `false` when a one-way route has run out.
    fn compute_next_node(&mut self, len: usize) -> bool {
        if self.current + 1 == len && !self.repeating {
            return false;
        }
        if !self.follow_backwards || len < 2 {
            self.current = (self.current + 1) % len;
        } else if !self.returning {
            self.current += 1;
            if self.current >= len {
                self.current = len - 2;
                self.returning = true;
            }
        } else if self.current == 0 {
            self.current = 1;
            self.returning = false;
        } else {
            self.current -= 1;
        }
        true
    }

    fn launch<W: MotionWorld>(&mut self, owner: W::Unit, world: &mut W) {
        let Some(path) = self.path().cloned() else {
            return;
        };
        let node = &path.nodes[self.current];

        self.flags.remove(
            GeneratorFlags::TRANSITORY | GeneratorFlags::INFORMED | GeneratorFlags::TIMED_PAUSED,
        );
        world.add_unit_state(owner, UnitState::ROAMING_MOVE);

        let mut init = move_to(world, owner, node.position, self.generate_path, false);
        if let Some(orientation) = node.orientation {
            if node.delay_ms > 0 || self.current + 1 == path.nodes.len() {
                init = init.face_angle(orientation);
            }
        }
        init = match node.move_type {
            WaypointMoveType::Land => init.animation(SplineAnimation::ToGround),
            WaypointMoveType::TakeOff => init.animation(SplineAnimation::ToFly),
            WaypointMoveType::Run => init.walk(false),
            WaypointMoveType::Walk => init.walk(true),
        };
        if let Some(speed) = self.speed {
            init = init.velocity(speed);
        }
        world.launch_spline(owner, init);
        self.state = WaypointState::Moving;
    }

    /// Head for the current node, or for the next one after an arrival.
    fn start_move<W: MotionWorld>(&mut self, owner: W::Unit, world: &mut W) {
        let Some(path) = self.path().cloned() else {
            return;
        };
        if !world.is_alive(owner) || self.flags.contains(GeneratorFlags::FINALIZED) {
            return;
        }
        if world.is_immobilized(owner) {
            self.timer.reset(world.motion_config().waypoint.blocked_retry_ms);
            return;
        }

        if self.flags.contains(GeneratorFlags::INFORMED) {
            if self.compute_next_node(path.nodes.len()) {
                world.waypoint_started(owner, path.nodes[self.current].id, path.id);
            } else {
                let node = &path.nodes[self.current];
                let orientation = world.position(owner).orientation;
                world.set_home_position(owner, Position::new(node.position, orientation));
                world.waypoint_path_ended(owner, node.id, path.id);
                tracing::debug!(unit = ?owner, path_id = path.id, "waypoint path finished");
                self.state = WaypointState::Finished;
                self.flags.insert(GeneratorFlags::INFORM_ENABLED);
                return;
            }
        } else if !self.flags.contains(GeneratorFlags::INITIALIZED) {
            self.flags.insert(GeneratorFlags::INITIALIZED);
            world.waypoint_started(owner, path.nodes[self.current].id, path.id);
        }
        self.launch(owner, world);
    }

    fn on_arrived<W: MotionWorld>(&mut self, ctx: &TickContext, owner: W::Unit, world: &mut W) {
        let Some(path) = self.path().cloned() else {
            return;
        };
        let node = &path.nodes[self.current];
        self.state = WaypointState::WaitingAtNode;
        if node.delay_ms > 0 {
            world.clear_unit_state(owner, UnitState::ROAMING_MOVE);
            self.timer.reset(node.delay_ms);
        } else {
            self.timer.reset(0);
        }
        if let Some(script) = node.event_id {
            let mut rng = ctx.rng_for_unit(owner, stream::WAYPOINT);
            if rng.range_u32(0, 99) < u32::from(node.event_chance) {
                world.start_waypoint_script(owner, script);
            }
        }
        world.movement_inform(owner, MovementGeneratorType::Waypoint, self.current as u32);
        world.waypoint_reached(owner, node.id, path.id);
        self.flags.insert(GeneratorFlags::INFORMED);
    }
}

impl<U: UnitId> MovementGenerator<U> for WaypointMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Waypoint
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
        if self.path.is_none() {
            self.path = world.waypoint_path(self.path_id);
        }
        if self.path().is_none() {
            tracing::error!(
                unit = ?owner,
                path_id = self.path_id,
                "waypoint path missing or empty"
            );
            return;
        }
        world.stop_moving(owner);
        self.state = WaypointState::WaitingToStart;
        self.timer.reset(world.motion_config().waypoint.initial_delay_ms);
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, _ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::TRANSITORY | GeneratorFlags::DEACTIVATED);
        world.stop_moving(owner);
        if !self.flags.contains(GeneratorFlags::FINALIZED) && self.state == WaypointState::Moving {
            self.state = WaypointState::WaitingToStart;
            self.timer.reset(1);
        }
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
        if self.flags.intersects(GeneratorFlags::FINALIZED | GeneratorFlags::PAUSED)
            || self.path().is_none()
        {
            return true;
        }
        if self.state == WaypointState::Finished {
            return false;
        }
        if let Some(duration) = self.duration.as_mut() {
            duration.update(ctx.diff_ms);
            if duration.passed() {
                self.flags.remove(GeneratorFlags::TRANSITORY);
                self.flags.insert(GeneratorFlags::INFORM_ENABLED);
                return false;
            }
        }
        if world.is_immobilized(owner) || world.has_unit_state(owner, UnitState::LOST_CONTROL) {
            self.flags.insert(GeneratorFlags::INTERRUPTED);
            world.stop_moving(owner);
            return true;
        }
        if self.flags.contains(GeneratorFlags::INTERRUPTED) {
            self.flags.remove(GeneratorFlags::INTERRUPTED);
            if self.state == WaypointState::Moving {
                self.launch(owner, world);
                return true;
            }
        }

        match self.state {
            WaypointState::Moving => {
                if world.is_spline_finalized(owner) {
                    self.on_arrived(ctx, owner, world);
                    if self.timer.passed() {
                        self.start_move(owner, world);
                    }
                } else {
                    let here = world.position(owner);
                    world.set_home_position(owner, here);
                    if self.flags.contains(GeneratorFlags::SPEED_UPDATE_PENDING) {
                        self.launch(owner, world);
                    }
                }
            }
            WaypointState::WaitingToStart | WaypointState::WaitingAtNode => {
                if !world.is_spline_finalized(owner) {
                    world.stop_moving(owner);
                }
                self.timer.update(ctx.diff_ms);
                if self.timer.passed() {
                    self.start_move(owner, world);
                }
            }
            WaypointState::Finished => {}
        }
        self.state != WaypointState::Finished
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
        movement_inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
        if active {
            world.clear_unit_state(owner, UnitState::ROAMING_MOVE);
        }
        if movement_inform && self.flags.contains(GeneratorFlags::INFORM_ENABLED) {
            world.movement_inform(owner, MovementGeneratorType::Waypoint, self.path_id);
        }
    }

    fn pause(&mut self, timer_ms: u32) {
        if timer_ms > 0 {
            if self.flags.contains(GeneratorFlags::PAUSED) {
                return;
            }
            self.flags.insert(GeneratorFlags::TIMED_PAUSED);
            self.flags.remove(GeneratorFlags::PAUSED);
            self.timer.reset(timer_ms);
            if self.state == WaypointState::Moving {
                self.state = WaypointState::WaitingToStart;
            }
        } else {
            self.flags.insert(GeneratorFlags::PAUSED);
            self.flags.remove(GeneratorFlags::TIMED_PAUSED);
        }
    }

    fn resume(&mut self, override_timer_ms: u32) {
        if override_timer_ms > 0 {
            self.timer.reset(override_timer_ms);
        }
        if self.timer.passed() && self.state != WaypointState::Moving {
            self.timer.reset(1);
        }
        self.flags.remove(GeneratorFlags::PAUSED);
    }

    fn reset_position<W: MotionWorld<Unit = U>>(&self, _owner: U, _world: &W) -> Option<Vec3> {
        self.path().map(|p| p.nodes[self.current].position)
    }
}
