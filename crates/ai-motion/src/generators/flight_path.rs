use std::collections::VecDeque;

use ai_core::{TickContext, UnitId, Vec3};

use crate::{
    GeneratorFlags, MotionPriority, MotionWorld, MoveSplineInit, MovementGenerator,
    MovementGeneratorType, TaxiNode, TaxiRoute, UnitState,
};

/// Last path index of a route segment, and what that segment costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathSwitch {
    path_index: usize,
    cost: u32,
}

/// Flies the owner along a taxi route.
///
/// The route's segments are merged into one node list. Near segment joins, nodes that
/// crowd their neighbours are dropped so the flight does not zig-zag through a
/// destination it only passes.
#[derive(Debug, Clone)]
pub struct FlightPathMovementGenerator {
    flags: GeneratorFlags,
    path: Vec<TaxiNode>,
    switches: VecDeque<PathSwitch>,
    current: usize,
    completed_segments: usize,
}

fn included_in_shortened_path(a: &TaxiNode, b: &TaxiNode, skip_distance: f32) -> bool {
    a.map_id != b.map_id || a.position.distance_2d_sq(b.position) > skip_distance * skip_distance
}

impl FlightPathMovementGenerator {
    pub fn new(route: &TaxiRoute, skip_distance: f32) -> Self {
        let mut path: Vec<TaxiNode> = Vec::new();
        let mut switches: VecDeque<PathSwitch> = VecDeque::new();
        let last_segment = route.segments.len().saturating_sub(1);

        for (segment_index, segment) in route.segments.iter().enumerate() {
            let (Some(start), Some(end)) = (segment.nodes.first(), segment.nodes.last()) else {
                continue;
            };
            let first_segment = segment_index == 0;
            let mut passed_previous_join = false;

            for (i, node) in segment.nodes.iter().enumerate() {
                let keeps_distance = match path.last() {
                    Some(prev) => included_in_shortened_path(prev, node, skip_distance),
                    None => true,
                };
                if passed_previous_join || first_segment || keeps_distance {
                    let after_start = first_segment
                        || (included_in_shortened_path(start, node, skip_distance) && i >= 2);
                    let before_end = segment_index == last_segment
                        || (included_in_shortened_path(end, node, skip_distance)
                            && i + 1 < segment.nodes.len());
                    if after_start && before_end {
                        passed_previous_join = true;
                        path.push(node.clone());
                    }
                } else {
                    // too close to the tail of the previous segment: cut the corner
                    path.pop();
                    if let Some(switch) = switches.back_mut() {
                        switch.path_index = switch.path_index.saturating_sub(1);
                    }
                }
            }

            switches.push_back(PathSwitch {
                path_index: path.len().saturating_sub(1),
                cost: segment.cost,
            });
        }

        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            path,
            switches,
            current: 0,
            completed_segments: 0,
        }
    }

    /// Start from `node` instead of the first node, e.g. when resuming a saved flight.
    pub fn with_start_node(mut self, node: usize) -> Self {
        self.current = node.min(self.path.len().saturating_sub(1));
        self
    }

    pub fn path(&self) -> &[TaxiNode] {
        &self.path
    }

    pub fn current_node(&self) -> usize {
        self.current
    }

    /// First node on a different map than the current one, or the path length.
    fn path_at_map_end(&self) -> usize {
        let Some(here) = self.path.get(self.current) else {
            return self.path.len();
        };
        self.path[self.current..]
            .iter()
            .position(|n| n.map_id != here.map_id)
            .map_or(self.path.len(), |offset| self.current + offset)
    }

    fn launch<W: MotionWorld>(&self, owner: W::Unit, world: &mut W) {
        let end = self.path_at_map_end();
        if self.current >= end {
            tracing::debug!(current = self.current, "flight already at the end of its map");
            return;
        }

        let here = world.position(owner).pos;
        let mut points: Vec<Vec3> = Vec::with_capacity(end - self.current + 1);
        points.push(here);
        points.extend(self.path[self.current..end].iter().map(|n| n.position));

        let init = MoveSplineInit::new()
            .move_by_path(points)
            .first_point_id(self.current as i32)
            .fly()
            .walk(true)
            .velocity(world.motion_config().flight.speed);
        world.launch_spline(owner, init);
    }

    fn fire_node_event<W: MotionWorld>(&self, owner: W::Unit, world: &mut W, departure: bool) {
        let Some(node) = self.path.get(self.current) else {
            return;
        };
        let event = if departure { node.departure_event } else { node.arrival_event };
        if let Some(event_id) = event.filter(|&id| id != 0) {
            world.taxi_event(owner, event_id, departure);
        }
    }

    fn switch_segments<W: MotionWorld>(&mut self, owner: W::Unit, world: &mut W) {
        while self.switches.front().is_some_and(|s| s.path_index <= self.current) {
            self.switches.pop_front();
            let next_cost = self.switches.front().map_or(0, |s| s.cost);
            world.taxi_segment_completed(owner, self.completed_segments, next_cost);
            self.completed_segments += 1;
        }
    }

    fn is_at_last_node(&self) -> bool {
        self.current + 1 >= self.path.len()
    }
}

impl<U: UnitId> MovementGenerator<U> for FlightPathMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Flight
    }

    fn priority(&self) -> MotionPriority {
        MotionPriority::Highest
    }

    fn flags(&self) -> GeneratorFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        &mut self.flags
    }

    fn base_unit_state(&self) -> UnitState {
        UnitState::IN_FLIGHT
    }

    fn initialize<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.reset(ctx, owner, world);
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, _ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::INITIALIZATION_PENDING | GeneratorFlags::DEACTIVATED);
        self.flags.insert(GeneratorFlags::INITIALIZED);
        if self.path.is_empty() {
            tracing::error!("flight route has no nodes");
            return;
        }
        self.launch(owner, world);
    }

    fn update<W: MotionWorld<Unit = U>>(
        &mut self,
        _ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) -> bool {
        if self.path.is_empty() {
            return false;
        }

        // index 0 of the launched spline is the owner's own start position
        let point_id = (world.spline_current_index(owner) - 1).max(0) as usize;
        if point_id > self.current && !self.is_at_last_node() {
            let mut departure = true;
            loop {
                self.fire_node_event(owner, world, departure);
                self.switch_segments(owner, world);
                if point_id == self.current || self.is_at_last_node() {
                    break;
                }
                if departure {
                    self.current += 1;
                }
                departure = !departure;
            }
        }

        if self.is_at_last_node() {
            self.flags.insert(GeneratorFlags::INFORM_ENABLED);
            return false;
        }

        // the spline stopped at the edge of its map; carry on over the next one
        if world.is_spline_finalized(owner) {
            tracing::debug!(node = self.current, "flight crossed to the next map");
            self.launch(owner, world);
        }
        true
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, _owner: U, _world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
    }

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        active: bool,
        _inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
        if !active {
            return;
        }
        world.clear_unit_state(owner, UnitState::IN_FLIGHT);
        if let Some(last) = self.path.last() {
            if self.is_at_last_node() {
                world.taxi_landed(owner, last.position);
            }
        }
        world.stop_moving(owner);
    }

    fn unit_speed_changed(&mut self) {}

    fn reset_position<W: MotionWorld<Unit = U>>(&self, _owner: U, _world: &W) -> Option<Vec3> {
        self.path.get(self.current).map(|n| n.position)
    }
}
