//! In-memory [`MotionWorld`] with linear spline playback.
//!
//! Units are keyed by `u64`. Splines advance only when [`SimWorld::advance`] is called,
//! so a test or the CLI decides exactly how time passes. Everything the generators tell
//! the AI is recorded as [`SimEvent`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use ai_core::{absolute_angle, Position, Vec3, CONTACT_DISTANCE};
use ai_nav::{AgentCapabilities, LiquidKind, NavMesh, NavMeshQuery, QueryFilter};
use serde::Serialize;

use crate::{
    FollowerRegistry, MotionConfig, MotionWorld, MoveSplineInit, MovementGeneratorType,
    SplineFacing, UnitState, WaypointPath,
};

const GROUND_SEARCH_EXTENTS: Vec3 = Vec3::new(3.0, 3.0, 10.0);
const MAX_SURFACE_VISITS: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    SplineLaunched { unit: u64, id: u32, destination: Vec3, duration_ms: u32 },
    Stopped { unit: u64 },
    MovementInform { unit: u64, kind: MovementGeneratorType, id: u32 },
    WaypointStarted { unit: u64, node_id: u32, path_id: u32 },
    WaypointReached { unit: u64, node_id: u32, path_id: u32 },
    WaypointPathEnded { unit: u64, node_id: u32, path_id: u32 },
    WaypointScript { unit: u64, script_id: u32 },
    TaxiEvent { unit: u64, event_id: u32, departure: bool },
    TaxiSegmentCompleted { unit: u64, segment: usize, next_cost: u32 },
    TaxiLanded { unit: u64, at: Vec3 },
    ReachedHome { unit: u64 },
    CannotReachTarget { unit: u64, cannot_reach: bool },
}

#[derive(Debug, Clone)]
struct SimSpline {
    id: u32,
    points: Vec<Vec3>,
    /// Distance travelled when reaching each point.
    distances: Vec<f32>,
    velocity: f32,
    elapsed_ms: u32,
    duration_ms: u32,
    cyclic: bool,
    first_point_id: i32,
    facing: SplineFacing<u64>,
    finalized: bool,
}

impl SimSpline {
    /// Position at `elapsed_ms` and the index of the last point passed.
    fn sample(&self, elapsed_ms: u32) -> (Vec3, usize) {
        let last = self.points.len().saturating_sub(1);
        let travelled = self.velocity * elapsed_ms as f32 / 1000.0;
        let seg = self.distances.partition_point(|&d| d <= travelled).saturating_sub(1);
        if seg >= last {
            return (self.points[last], last);
        }
        let span = self.distances[seg + 1] - self.distances[seg];
        let t = if span > 0.0 { (travelled - self.distances[seg]) / span } else { 1.0 };
        (self.points[seg].lerp(self.points[seg + 1], t.clamp(0.0, 1.0)), seg)
    }

    fn heading(&self, seg: usize) -> Option<f32> {
        let (a, b) = (self.points.get(seg)?, self.points.get(seg + 1)?);
        (a.distance_2d_sq(*b) > 0.0).then(|| absolute_angle(*a, *b))
    }
}

/// A unit as the simulation sees it.
#[derive(Debug, Clone)]
pub struct SimUnit {
    pub position: Position,
    pub capabilities: AgentCapabilities,
    pub state: UnitState,
    pub alive: bool,
    pub in_world: bool,
    pub combat_reach: f32,
    pub run_speed: f32,
    pub walk_speed: f32,
    pub walking: bool,
    pub casting: bool,
    pub victim: Option<u64>,
    pub pet_owner: Option<u64>,
    pub home: Position,
    pub cannot_reach_target: bool,
    spline: Option<SimSpline>,
}

impl SimUnit {
    pub fn new(pos: Vec3) -> Self {
        Self {
            position: Position::at(pos),
            capabilities: AgentCapabilities::walker(),
            state: UnitState::empty(),
            alive: true,
            in_world: true,
            combat_reach: 1.5,
            run_speed: 7.0,
            walk_speed: 2.5,
            walking: false,
            casting: false,
            victim: None,
            pet_owner: None,
            home: Position::at(pos),
            cannot_reach_target: false,
            spline: None,
        }
    }

    pub fn with_capabilities(mut self, capabilities: AgentCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_combat_reach(mut self, reach: f32) -> Self {
        self.combat_reach = reach;
        self
    }

    pub fn with_run_speed(mut self, speed: f32) -> Self {
        self.run_speed = speed;
        self
    }

    pub fn with_orientation(mut self, orientation: f32) -> Self {
        self.position.orientation = orientation;
        self.home.orientation = orientation;
        self
    }

    pub fn pet_of(mut self, owner: u64) -> Self {
        self.pet_owner = Some(owner);
        self
    }

    /// Whether a spline is currently playing.
    pub fn is_moving(&self) -> bool {
        self.spline.as_ref().is_some_and(|s| !s.finalized)
    }
}

/// Axis-aligned liquid volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidRegion {
    pub min: Vec3,
    pub max: Vec3,
    pub kind: LiquidKind,
}

#[derive(Debug, Default)]
pub struct SimWorld {
    units: BTreeMap<u64, SimUnit>,
    mesh: Option<Arc<NavMesh>>,
    walls: Vec<(Vec3, Vec3)>,
    liquids: Vec<LiquidRegion>,
    ground_z: f32,
    paths: BTreeMap<u32, Arc<WaypointPath>>,
    followers: FollowerRegistry<u64>,
    config: MotionConfig,
    next_spline_id: u32,
    events: Vec<SimEvent>,
}

impl SimWorld {
    pub fn new(config: MotionConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn with_mesh(mut self, mesh: Arc<NavMesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Height used for ground queries when no mesh is loaded.
    pub fn with_ground_z(mut self, z: f32) -> Self {
        self.ground_z = z;
        self
    }

    /// A vertical wall along the planar segment `a -> b`. Blocks sight and movement.
    pub fn add_wall(&mut self, a: Vec3, b: Vec3) {
        self.walls.push((a, b));
    }

    pub fn add_liquid(&mut self, region: LiquidRegion) {
        self.liquids.push(region);
    }

    pub fn add_waypoint_path(&mut self, path: WaypointPath) {
        self.paths.insert(path.id, Arc::new(path));
    }

    pub fn spawn(&mut self, id: u64, unit: SimUnit) {
        self.units.insert(id, unit);
    }

    /// Take the unit out of the world. Its handle stays valid but resolves to nothing.
    pub fn despawn(&mut self, id: u64) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.in_world = false;
            unit.spline = None;
        }
        self.followers.remove_unit(id);
    }

    pub fn unit(&self, id: u64) -> Option<&SimUnit> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: u64) -> Option<&mut SimUnit> {
        self.units.get_mut(&id)
    }

    /// Teleport without touching any running spline.
    pub fn place(&mut self, id: u64, pos: Vec3) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.position.pos = pos;
        }
    }

    pub fn config_mut(&mut self) -> &mut MotionConfig {
        &mut self.config
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Play every running spline forward by `diff_ms`.
    pub fn advance(&mut self, diff_ms: u32) {
        let ids: Vec<u64> = self.units.keys().copied().collect();
        for id in ids {
            self.advance_unit(id, diff_ms);
        }
    }

    fn advance_unit(&mut self, id: u64, diff_ms: u32) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let Some(spline) = unit.spline.as_mut() else {
            return;
        };
        if spline.finalized {
            return;
        }

        spline.elapsed_ms = spline.elapsed_ms.saturating_add(diff_ms);
        if spline.cyclic && spline.duration_ms > 0 {
            spline.elapsed_ms %= spline.duration_ms;
        } else if spline.elapsed_ms >= spline.duration_ms {
            spline.finalized = true;
        }

        let (pos, seg) = spline.sample(spline.elapsed_ms);
        unit.position.pos = pos;
        if let Some(heading) = spline.heading(seg) {
            unit.position.orientation = heading;
        }
        if !spline.finalized {
            return;
        }

        let facing = spline.facing;
        let orientation = match facing {
            SplineFacing::None => None,
            SplineFacing::Angle(angle) => Some(angle),
            SplineFacing::Point(p) => Some(absolute_angle(pos, p)),
            SplineFacing::Unit(target) => {
                self.units.get(&target).map(|t| absolute_angle(pos, t.position.pos))
            }
        };
        if let (Some(orientation), Some(unit)) = (orientation, self.units.get_mut(&id)) {
            unit.position.orientation = ai_core::normalize_orientation(orientation);
        }
    }

    fn blocking_fraction(&self, from: Vec3, to: Vec3) -> Option<f32> {
        self.walls
            .iter()
            .filter_map(|&(a, b)| segment_intersection(from, to, a, b))
            .min_by(f32::total_cmp)
    }

    fn push(&mut self, event: SimEvent) {
        tracing::trace!(?event, "sim event");
        self.events.push(event);
    }
}

/// Fraction along `p -> p2` where it crosses `q -> q2` in the plane.
fn segment_intersection(p: Vec3, p2: Vec3, q: Vec3, q2: Vec3) -> Option<f32> {
    let r = p2 - p;
    let s = q2 - q;
    let denom = r.cross_2d(s);
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let qp = q - p;
    let t = qp.cross_2d(s) / denom;
    let u = qp.cross_2d(r) / denom;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some(t)
}

impl MotionWorld for SimWorld {
    type Unit = u64;

    fn is_in_world(&self, unit: u64) -> bool {
        self.units.get(&unit).is_some_and(|u| u.in_world)
    }

    fn is_alive(&self, unit: u64) -> bool {
        self.units.get(&unit).is_some_and(|u| u.alive)
    }

    fn position(&self, unit: u64) -> Position {
        self.units.get(&unit).map(|u| u.position).unwrap_or_default()
    }

    fn set_orientation(&mut self, unit: u64, orientation: f32) {
        if let Some(u) = self.units.get_mut(&unit) {
            u.position.orientation = ai_core::normalize_orientation(orientation);
        }
    }

    fn combat_reach(&self, unit: u64) -> f32 {
        self.units.get(&unit).map_or(0.0, |u| u.combat_reach)
    }

    fn capabilities(&self, unit: u64) -> AgentCapabilities {
        self.units.get(&unit).map(|u| u.capabilities).unwrap_or_default()
    }

    fn unit_state(&self, unit: u64) -> UnitState {
        self.units.get(&unit).map_or(UnitState::empty(), |u| u.state)
    }

    fn add_unit_state(&mut self, unit: u64, state: UnitState) {
        if let Some(u) = self.units.get_mut(&unit) {
            u.state.insert(state);
        }
    }

    fn clear_unit_state(&mut self, unit: u64, state: UnitState) {
        if let Some(u) = self.units.get_mut(&unit) {
            u.state.remove(state);
        }
    }

    fn is_movement_prevented_by_casting(&self, unit: u64) -> bool {
        self.units.get(&unit).is_some_and(|u| u.casting)
    }

    fn victim(&self, unit: u64) -> Option<u64> {
        self.units.get(&unit).and_then(|u| u.victim)
    }

    fn is_walking(&self, unit: u64) -> bool {
        self.units.get(&unit).is_some_and(|u| u.walking)
    }

    fn run_speed(&self, unit: u64) -> f32 {
        self.units.get(&unit).map_or(0.0, |u| u.run_speed)
    }

    fn is_pet_of(&self, unit: u64, owner: u64) -> bool {
        self.units.get(&unit).is_some_and(|u| u.pet_owner == Some(owner))
    }

    fn home_position(&self, unit: u64) -> Position {
        self.units.get(&unit).map(|u| u.home).unwrap_or_default()
    }

    fn set_home_position(&mut self, unit: u64, home: Position) {
        if let Some(u) = self.units.get_mut(&unit) {
            u.home = home;
        }
    }

    fn set_cannot_reach_target(&mut self, unit: u64, cannot_reach: bool) {
        let changed = match self.units.get_mut(&unit) {
            Some(u) if u.cannot_reach_target != cannot_reach => {
                u.cannot_reach_target = cannot_reach;
                true
            }
            _ => false,
        };
        if changed {
            self.push(SimEvent::CannotReachTarget { unit, cannot_reach });
        }
    }

    fn is_in_accessible_place_for(&self, target: u64, unit: u64) -> bool {
        let here = self.position(target).pos;
        let caps = self.capabilities(unit);
        caps.can_fly || caps.can_swim || !self.liquid_at(here).is_liquid()
    }

    fn move_position_to_first_collision(
        &self,
        unit: u64,
        from: Vec3,
        dist: f32,
        angle: f32,
    ) -> Vec3 {
        let target = from.offset_polar(dist, angle);
        let mut dest = target;

        if let Some(mesh) = self.mesh.as_deref() {
            let filter = QueryFilter::all();
            let mut query = NavMeshQuery::default();
            let nearest = query.find_nearest_poly(mesh, from, GROUND_SEARCH_EXTENTS, &filter);
            if let Some((start_ref, start)) = nearest {
                let moved = query.move_along_surface(
                    mesh,
                    start_ref,
                    start,
                    target,
                    &filter,
                    MAX_SURFACE_VISITS,
                );
                if let Some((reached, _)) = moved {
                    dest = reached;
                }
            }
        }

        if let Some(t) = self.blocking_fraction(from, dest) {
            let full = from.distance_2d(dest);
            let keep = if full > 0.0 {
                ((t * full) - CONTACT_DISTANCE).max(0.0) / full
            } else {
                0.0
            };
            dest = from.lerp(dest, keep);
        }

        if !self.capabilities(unit).can_fly {
            if let Some(h) = self.ground_height(dest) {
                dest.z = h;
            }
        }
        dest
    }

    fn is_within_los(&self, from: Vec3, to: Vec3) -> bool {
        self.blocking_fraction(from, to).is_none()
    }

    fn ground_height(&self, pos: Vec3) -> Option<f32> {
        let Some(mesh) = self.mesh.as_deref() else {
            return Some(self.ground_z);
        };
        let mut query = NavMeshQuery::default();
        query
            .find_nearest_poly(mesh, pos, GROUND_SEARCH_EXTENTS, &QueryFilter::all())
            .map(|(_, p)| p.z)
    }

    fn liquid_at(&self, pos: Vec3) -> LiquidKind {
        self.liquids
            .iter()
            .find(|r| {
                (r.min.x..=r.max.x).contains(&pos.x)
                    && (r.min.y..=r.max.y).contains(&pos.y)
                    && (r.min.z..=r.max.z).contains(&pos.z)
            })
            .map_or(LiquidKind::None, |r| r.kind)
    }

    fn nav_mesh(&self) -> Option<&NavMesh> {
        self.mesh.as_deref()
    }

    fn launch_spline(&mut self, unit: u64, init: MoveSplineInit<u64>) -> u32 {
        self.next_spline_id = self.next_spline_id.wrapping_add(1);
        let id = self.next_spline_id;
        let Some(u) = self.units.get_mut(&unit) else {
            return 0;
        };

        let mut points = init.path;
        match points.first_mut() {
            Some(first) => *first = u.position.pos,
            None => points.push(u.position.pos),
        }
        let mut distances = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].distance(*p);
            }
            distances.push(total);
        }

        let velocity = init
            .velocity
            .unwrap_or(if init.walk { u.walk_speed } else { u.run_speed });
        let duration_ms = if velocity > 0.0 {
            (total / velocity * 1000.0).round() as u32
        } else {
            0
        };
        let destination = points.last().copied().unwrap_or(u.position.pos);

        u.spline = Some(SimSpline {
            id,
            points,
            distances,
            velocity,
            elapsed_ms: 0,
            duration_ms,
            cyclic: init.cyclic,
            first_point_id: init.first_point_id,
            facing: init.facing,
            finalized: false,
        });
        self.push(SimEvent::SplineLaunched { unit, id, destination, duration_ms });
        // zero-length moves still resolve their facing
        if duration_ms == 0 {
            self.advance_unit(unit, 0);
        }
        duration_ms
    }

    fn is_spline_finalized(&self, unit: u64) -> bool {
        self.units
            .get(&unit)
            .and_then(|u| u.spline.as_ref())
            .map_or(true, |s| s.finalized)
    }

    fn is_spline_cyclic(&self, unit: u64) -> bool {
        self.units
            .get(&unit)
            .and_then(|u| u.spline.as_ref())
            .is_some_and(|s| s.cyclic && !s.finalized)
    }

    fn spline_current_index(&self, unit: u64) -> i32 {
        let Some(spline) = self.units.get(&unit).and_then(|u| u.spline.as_ref()) else {
            return 0;
        };
        if spline.finalized {
            return spline.points.len() as i32 - 1 + spline.first_point_id + 1;
        }
        let (_, seg) = spline.sample(spline.elapsed_ms);
        seg as i32 + spline.first_point_id
    }

    fn spline_final_destination(&self, unit: u64) -> Option<Vec3> {
        self.units
            .get(&unit)
            .and_then(|u| u.spline.as_ref())
            .and_then(|s| s.points.last().copied())
    }

    fn spline_id(&self, unit: u64) -> u32 {
        self.units
            .get(&unit)
            .and_then(|u| u.spline.as_ref())
            .map_or(0, |s| s.id)
    }

    fn spline_velocity(&self, unit: u64) -> f32 {
        self.units
            .get(&unit)
            .and_then(|u| u.spline.as_ref())
            .map_or(0.0, |s| s.velocity)
    }

    fn stop_moving(&mut self, unit: u64) {
        let was_moving = match self.units.get_mut(&unit) {
            Some(u) => {
                let moving = u.is_moving();
                u.state.remove(UnitState::MOVING);
                if let Some(spline) = u.spline.as_mut() {
                    spline.finalized = true;
                }
                moving
            }
            None => false,
        };
        if was_moving {
            self.push(SimEvent::Stopped { unit });
        }
    }

    fn movement_inform(&mut self, unit: u64, kind: MovementGeneratorType, id: u32) {
        self.push(SimEvent::MovementInform { unit, kind, id });
    }

    fn waypoint_started(&mut self, unit: u64, node_id: u32, path_id: u32) {
        self.push(SimEvent::WaypointStarted { unit, node_id, path_id });
    }

    fn waypoint_reached(&mut self, unit: u64, node_id: u32, path_id: u32) {
        self.push(SimEvent::WaypointReached { unit, node_id, path_id });
    }

    fn waypoint_path_ended(&mut self, unit: u64, node_id: u32, path_id: u32) {
        self.push(SimEvent::WaypointPathEnded { unit, node_id, path_id });
    }

    fn start_waypoint_script(&mut self, unit: u64, script_id: u32) {
        self.push(SimEvent::WaypointScript { unit, script_id });
    }

    fn taxi_event(&mut self, unit: u64, event_id: u32, departure: bool) {
        self.push(SimEvent::TaxiEvent { unit, event_id, departure });
    }

    fn taxi_segment_completed(&mut self, unit: u64, segment: usize, next_cost: u32) {
        self.push(SimEvent::TaxiSegmentCompleted { unit, segment, next_cost });
    }

    fn taxi_landed(&mut self, unit: u64, at: Vec3) {
        self.push(SimEvent::TaxiLanded { unit, at });
    }

    fn just_reached_home(&mut self, unit: u64) {
        self.push(SimEvent::ReachedHome { unit });
    }

    fn followers(&self) -> &FollowerRegistry<u64> {
        &self.followers
    }

    fn followers_mut(&mut self) -> &mut FollowerRegistry<u64> {
        &mut self.followers
    }

    fn waypoint_path(&self, path_id: u32) -> Option<Arc<WaypointPath>> {
        self.paths.get(&path_id).cloned()
    }

    fn motion_config(&self) -> &MotionConfig {
        &self.config
    }
}
