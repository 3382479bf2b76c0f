//! The owner/world interface generators act through.

use std::sync::Arc;

use ai_core::{absolute_angle, Position, UnitId, Vec3};
use ai_nav::{AgentCapabilities, LiquidKind, NavMesh, PathAgent};

use crate::{
    FollowerRegistry, MotionConfig, MoveSplineInit, MovementGeneratorType, UnitState, WaypointPath,
};

/// Everything a movement generator may ask of, or do to, the simulation.
///
/// Units are addressed by handle. A handle may outlive its unit, so generators check
/// [`MotionWorld::is_in_world`] before acting on anyone other than their owner.
pub trait MotionWorld {
    type Unit: UnitId;

    // --- unit model ---

    fn is_in_world(&self, unit: Self::Unit) -> bool;

    fn is_alive(&self, unit: Self::Unit) -> bool;

    fn position(&self, unit: Self::Unit) -> Position;

    fn set_orientation(&mut self, unit: Self::Unit, orientation: f32);

    fn combat_reach(&self, unit: Self::Unit) -> f32;

    fn capabilities(&self, unit: Self::Unit) -> AgentCapabilities;

    fn unit_state(&self, unit: Self::Unit) -> UnitState;

    fn add_unit_state(&mut self, unit: Self::Unit, state: UnitState);

    fn clear_unit_state(&mut self, unit: Self::Unit, state: UnitState);

    fn has_unit_state(&self, unit: Self::Unit, state: UnitState) -> bool {
        self.unit_state(unit).intersects(state)
    }

    fn is_movement_prevented_by_casting(&self, _unit: Self::Unit) -> bool {
        false
    }

    /// Current melee target.
    fn victim(&self, unit: Self::Unit) -> Option<Self::Unit>;

    fn is_walking(&self, unit: Self::Unit) -> bool;

    fn run_speed(&self, unit: Self::Unit) -> f32;

    /// Whether `unit` is a pet owned by `owner`.
    fn is_pet_of(&self, _unit: Self::Unit, _owner: Self::Unit) -> bool {
        false
    }

    fn home_position(&self, unit: Self::Unit) -> Position;

    fn set_home_position(&mut self, unit: Self::Unit, home: Position);

    fn set_cannot_reach_target(&mut self, _unit: Self::Unit, _cannot_reach: bool) {}

    /// Whether `target` stands somewhere `unit` can get to at all (e.g. not deep water
    /// for a non-swimmer).
    fn is_in_accessible_place_for(&self, _target: Self::Unit, _unit: Self::Unit) -> bool {
        true
    }

    // --- geometry ---

    /// Move `from` by `dist` along `angle`, stopping at the first obstacle.
    fn move_position_to_first_collision(
        &self,
        unit: Self::Unit,
        from: Vec3,
        dist: f32,
        angle: f32,
    ) -> Vec3;

    fn is_within_los(&self, from: Vec3, to: Vec3) -> bool;

    fn ground_height(&self, pos: Vec3) -> Option<f32>;

    fn liquid_at(&self, _pos: Vec3) -> LiquidKind {
        LiquidKind::None
    }

    fn collision_height(&self, _unit: Self::Unit) -> f32 {
        2.0
    }

    fn nav_mesh(&self) -> Option<&NavMesh>;

    // --- spline layer ---

    /// Start a spline, replacing any running one. Returns its duration in milliseconds.
    fn launch_spline(&mut self, unit: Self::Unit, init: MoveSplineInit<Self::Unit>) -> u32;

    fn is_spline_finalized(&self, unit: Self::Unit) -> bool;

    fn is_spline_cyclic(&self, _unit: Self::Unit) -> bool {
        false
    }

    /// Index of the control point last passed, offset by the launch's first point id,
    /// plus one once the spline has finished.
    fn spline_current_index(&self, unit: Self::Unit) -> i32;

    fn spline_final_destination(&self, unit: Self::Unit) -> Option<Vec3>;

    fn spline_id(&self, unit: Self::Unit) -> u32;

    fn spline_velocity(&self, unit: Self::Unit) -> f32;

    /// Halt the running spline and clear the owner's [`UnitState::MOVING`] bits.
    fn stop_moving(&mut self, unit: Self::Unit);

    // --- AI sink ---

    fn movement_inform(&mut self, _unit: Self::Unit, _kind: MovementGeneratorType, _id: u32) {}

    fn waypoint_started(&mut self, _unit: Self::Unit, _node_id: u32, _path_id: u32) {}

    fn waypoint_reached(&mut self, _unit: Self::Unit, _node_id: u32, _path_id: u32) {}

    fn waypoint_path_ended(&mut self, _unit: Self::Unit, _node_id: u32, _path_id: u32) {}

    fn start_waypoint_script(&mut self, _unit: Self::Unit, _script_id: u32) {}

    fn taxi_event(&mut self, _unit: Self::Unit, _event_id: u32, _departure: bool) {}

    /// A route segment was completed; `next_cost` is what the following segment costs.
    fn taxi_segment_completed(&mut self, _unit: Self::Unit, _segment: usize, _next_cost: u32) {}

    fn taxi_landed(&mut self, _unit: Self::Unit, _at: Vec3) {}

    fn just_reached_home(&mut self, _unit: Self::Unit) {}

    // --- shared state ---

    fn followers(&self) -> &FollowerRegistry<Self::Unit>;

    fn followers_mut(&mut self) -> &mut FollowerRegistry<Self::Unit>;

    fn waypoint_path(&self, _path_id: u32) -> Option<Arc<WaypointPath>> {
        None
    }

    fn motion_config(&self) -> &MotionConfig;

    // --- derived helpers ---

    fn path_agent(&self, unit: Self::Unit) -> UnitPathAgent<'_, Self>
    where
        Self: Sized,
    {
        UnitPathAgent::new(self, unit)
    }

    /// Face `target` immediately.
    fn set_in_front(&mut self, unit: Self::Unit, target: Self::Unit) {
        let angle = absolute_angle(self.position(unit).pos, self.position(target).pos);
        self.set_orientation(unit, angle);
    }

    fn is_immobilized(&self, unit: Self::Unit) -> bool {
        self.has_unit_state(unit, UnitState::NOT_MOVE)
            || self.is_movement_prevented_by_casting(unit)
    }

    /// Melee reach between two units, never below the nominal melee range.
    fn melee_range(&self, unit: Self::Unit, target: Self::Unit) -> f32 {
        let range = self.combat_reach(unit) + self.combat_reach(target) + 4.0 / 3.0;
        range.max(ai_core::NOMINAL_MELEE_RANGE)
    }
}

/// [`PathAgent`] view of one unit, borrowed from its world for the duration of a path
/// request.
pub struct UnitPathAgent<'w, W: MotionWorld + ?Sized> {
    world: &'w W,
    unit: W::Unit,
}

impl<'w, W: MotionWorld + ?Sized> UnitPathAgent<'w, W> {
    pub fn new(world: &'w W, unit: W::Unit) -> Self {
        Self { world, unit }
    }
}

impl<W: MotionWorld + ?Sized> PathAgent for UnitPathAgent<'_, W> {
    fn position(&self) -> Vec3 {
        self.world.position(self.unit).pos
    }

    fn capabilities(&self) -> AgentCapabilities {
        self.world.capabilities(self.unit)
    }

    fn liquid_at(&self, pos: Vec3) -> LiquidKind {
        self.world.liquid_at(pos)
    }

    fn is_under_water(&self, pos: Vec3) -> bool {
        self.world.liquid_at(pos).is_liquid()
    }

    fn update_allowed_position_z(&self, pos: &mut Vec3) {
        let caps = self.world.capabilities(self.unit);
        if caps.can_fly {
            return;
        }
        if caps.can_swim && self.world.liquid_at(*pos).is_liquid() {
            return;
        }
        if let Some(h) = self.world.ground_height(*pos) {
            pos.z = h;
        }
    }

    fn collision_height(&self) -> f32 {
        self.world.collision_height(self.unit)
    }

    fn is_in_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        self.world.is_within_los(from, to)
    }
}
