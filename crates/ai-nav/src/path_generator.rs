//! Destination to walkable point path.
//!
//! [`PathGenerator`] never fails hard: every degraded case still produces a two point
//! shortcut and reports what went wrong through [`PathType`].

use ai_core::Vec3;

use crate::agent::{AgentCapabilities, PathAgent};
use crate::config::PathConfig;
use crate::filter::{NavTerrain, QueryFilter};
use crate::mesh::{NavMesh, PolyRef};
use crate::path_type::PathType;
use crate::query::{NavMeshQuery, StraightPathFlags, StraightPoint};

/// Polygons a single surface move may cross.
const MAX_VISIT_POLY: usize = 48;
/// Corners considered when picking a steer target.
const MAX_STEER_POINTS: usize = 3;
const STALL_DISTANCE: f32 = 1e-4;

#[derive(Debug)]
pub struct PathGenerator {
    config: PathConfig,
    query: NavMeshQuery,
    filter: QueryFilter,
    corridor: Vec<PolyRef>,
    points: Vec<Vec3>,
    path_type: PathType,
    use_straight_path: bool,
    use_raycast: bool,
    force_destination: bool,
    point_path_limit: usize,
    start: Vec3,
    end: Vec3,
    actual_end: Vec3,
}

impl PathGenerator {
    pub fn new<A: PathAgent + ?Sized>(agent: &A) -> Self {
        Self::with_config(agent, PathConfig::default())
    }

    pub fn with_config<A: PathAgent + ?Sized>(agent: &A, config: PathConfig) -> Self {
        Self {
            query: NavMeshQuery::new(config.max_search_nodes),
            filter: create_filter(agent.capabilities()),
            corridor: Vec::new(),
            points: Vec::new(),
            path_type: PathType::BLANK,
            use_straight_path: false,
            use_raycast: false,
            force_destination: false,
            point_path_limit: config.max_point_path_length,
            start: Vec3::ZERO,
            end: Vec3::ZERO,
            actual_end: Vec3::ZERO,
            config,
        }
    }

    /// Path from the agent's current position to `dest`.
    ///
    /// Returns false only when a coordinate is outside the map; every other outcome is
    /// described by [`Self::path_type`].
    pub fn calculate_path<A: PathAgent + ?Sized>(
        &mut self,
        agent: &A,
        mesh: Option<&NavMesh>,
        dest: Vec3,
        force_destination: bool,
    ) -> bool {
        self.calculate_path_from(agent, mesh, agent.position(), dest, force_destination)
    }

    pub fn calculate_path_from<A: PathAgent + ?Sized>(
        &mut self,
        agent: &A,
        mesh: Option<&NavMesh>,
        start: Vec3,
        dest: Vec3,
        force_destination: bool,
    ) -> bool {
        if !self.is_valid_point(start) || !self.is_valid_point(dest) {
            return false;
        }

        self.start = start;
        self.end = dest;
        self.actual_end = dest;
        self.force_destination = force_destination;

        let mesh = mesh.filter(|m| {
            !agent.capabilities().ignores_pathfinding && m.has_tile_at(start) && m.has_tile_at(dest)
        });
        let Some(mesh) = mesh else {
            self.build_shortcut(agent);
            self.path_type = PathType::NORMAL | PathType::NOT_USING_PATH;
            return true;
        };

        self.update_filter(agent);
        self.build_poly_path(agent, mesh, start, dest);
        tracing::trace!(
            path_type = ?self.path_type,
            points = self.points.len(),
            polys = self.corridor.len(),
            "path calculated"
        );
        true
    }

    pub fn path(&self) -> &[Vec3] {
        &self.points
    }

    pub fn path_type(&self) -> PathType {
        self.path_type
    }

    pub fn start_position(&self) -> Vec3 {
        self.start
    }

    pub fn end_position(&self) -> Vec3 {
        self.end
    }

    pub fn actual_end_position(&self) -> Vec3 {
        self.actual_end
    }

    pub fn corridor(&self) -> &[PolyRef] {
        &self.corridor
    }

    pub fn filter(&self) -> &QueryFilter {
        &self.filter
    }

    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    /// Sum of the 3D segment lengths of the point path.
    pub fn path_length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    pub fn clear(&mut self) {
        self.corridor.clear();
        self.points.clear();
        self.path_type = PathType::BLANK;
    }

    pub fn set_use_straight_path(&mut self, straight: bool) {
        self.use_straight_path = straight;
    }

    pub fn set_use_raycast(&mut self, raycast: bool) {
        self.use_raycast = raycast;
    }

    /// Cap the point path so it covers roughly `distance` of smoothed travel.
    pub fn set_path_length_limit(&mut self, distance: f32) {
        let steps = (distance.max(0.0) / self.config.smooth_path_step_size) as usize;
        self.point_path_limit = steps.min(self.config.max_point_path_length);
    }

    /// Trim the tail so the path stops `dist` away from `target`.
    ///
    /// Walks backward from the end while the previous point is still inside `dist` and
    /// can see the target, then places the terminal point on the crossing segment at
    /// exactly `dist`. Without a crossing the path collapses to its first two points.
    pub fn shorten_path_until_dist<A: PathAgent + ?Sized>(
        &mut self,
        agent: &A,
        target: Vec3,
        dist: f32,
    ) {
        if self.path_type == PathType::BLANK || self.points.len() < 2 {
            tracing::warn!("shorten_path_until_dist called without a path");
            return;
        }
        let dist_sq = dist * dist;

        let last = self.points.len() - 1;
        if self.points[last].distance_sq(target) >= dist_sq {
            return;
        }
        if self.points[0].distance_sq(target) < dist_sq {
            self.points.truncate(2);
            return;
        }

        let height = Vec3::new(0.0, 0.0, agent.collision_height());
        let mut i = last;
        loop {
            let prev = self.points[i - 1];
            if prev.distance_sq(target) >= dist_sq {
                break;
            }
            if !agent.is_in_line_of_sight(prev + height, target + height) {
                self.points.truncate(i + 1);
                return;
            }
            i -= 1;
            if i == 0 {
                self.points.truncate(2);
                return;
            }
        }

        // points[i] is inside the radius and points[i - 1] is not: solve for the point on
        // the segment at exactly `dist`, measured from points[i] toward points[i - 1].
        let inner = self.points[i];
        let u = self.points[i - 1] - inner;
        let w = inner - target;
        let a = u.dot(u);
        if a > f32::EPSILON {
            let b = 2.0 * w.dot(u);
            let c = w.dot(w) - dist_sq;
            let disc = (b * b - 4.0 * a * c).max(0.0);
            let s = ((-b + disc.sqrt()) / (2.0 * a) + 1e-5).clamp(0.0, 1.0);
            self.points[i] = inner + u * s;
        }
        self.points.truncate(i + 1);
        self.actual_end = self.points[i];
    }

    fn is_valid_point(&self, p: Vec3) -> bool {
        p.is_finite()
            && p.x.abs() <= self.config.map_half_size
            && p.y.abs() <= self.config.map_half_size
    }

    fn update_filter<A: PathAgent + ?Sized>(&mut self, agent: &A) {
        let mut include = self.filter.include();
        let liquid = agent.liquid_at(agent.position());
        if liquid.is_liquid() {
            include |= liquid.terrain();
        }
        if agent.capabilities().in_combat_or_evading {
            include |= NavTerrain::GROUND_STEEP;
        }
        self.filter.set_include(include);
    }

    fn build_shortcut<A: PathAgent + ?Sized>(&mut self, agent: &A) {
        self.clear();
        self.points.push(self.start);
        self.points.push(self.actual_end);
        self.normalize_path(agent);
        self.path_type = PathType::NOPATH;
    }

    fn normalize_path<A: PathAgent + ?Sized>(&mut self, agent: &A) {
        for p in self.points.iter_mut() {
            agent.update_allowed_position_z(p);
        }
    }

    /// Nearest polygon to `point`, preferring polygons of the current corridor.
    fn poly_by_location(&mut self, mesh: &NavMesh, point: Vec3) -> Option<(PolyRef, f32)> {
        if let Some(found) = self.corridor_poly_by_position(mesh, point) {
            return Some(found);
        }

        let [ex, ey, ez] = self.config.nearest_poly_extents;
        let mut extents = Vec3::new(ex, ey, ez);
        if let Some((poly, closest)) =
            self.query.find_nearest_poly(mesh, point, extents, &self.filter)
        {
            return Some((poly, closest.distance(point)));
        }

        extents.z = self.config.nearest_poly_fallback_height;
        self.query
            .find_nearest_poly(mesh, point, extents, &self.filter)
            .map(|(poly, closest)| (poly, closest.distance(point)))
    }

    fn corridor_poly_by_position(&self, mesh: &NavMesh, point: Vec3) -> Option<(PolyRef, f32)> {
        let mut best: Option<(PolyRef, f32)> = None;
        for &poly in &self.corridor {
            if !self.query.is_passable(mesh, poly, &self.filter) || mesh.is_off_mesh_link(poly) {
                continue;
            }
            let Some(closest) = self.query.closest_point_on_poly(mesh, poly, point) else {
                continue;
            };
            let d = closest.distance(point);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((poly, d));
            }
            if d < 1.0 {
                break;
            }
        }
        best.filter(|&(_, d)| d < self.config.corridor_reuse_distance)
    }

    fn build_poly_path<A: PathAgent + ?Sized>(
        &mut self,
        agent: &A,
        mesh: &NavMesh,
        start: Vec3,
        end: Vec3,
    ) {
        let caps = agent.capabilities();
        let start_found = self.poly_by_location(mesh, start);
        let end_found = self.poly_by_location(mesh, end);

        let (Some((start_poly, start_dist)), Some((end_poly, end_dist))) = (start_found, end_found)
        else {
            self.build_shortcut(agent);
            let fly = caps.can_fly;
            let swim = caps.can_swim
                && agent.liquid_at(start).is_liquid()
                && agent.liquid_at(end).is_liquid();
            self.path_type = if fly || swim {
                PathType::NORMAL | PathType::NOT_USING_PATH
            } else {
                PathType::NOPATH
            };
            return;
        };

        let mut far = PathType::empty();
        if start_dist > self.config.far_from_poly_distance {
            far |= PathType::FARFROMPOLY_START;
        }
        if end_dist > self.config.far_from_poly_distance {
            far |= PathType::FARFROMPOLY_END;
        }

        let mut end_point = end;
        let mut base = PathType::empty();
        if !far.is_empty() {
            let p = if far.contains(PathType::FARFROMPOLY_START) { start } else { end };
            let mut shortcut = if agent.is_under_water(p) { caps.can_swim } else { caps.can_fly };
            if caps.is_falling && end.z < start.z {
                shortcut = true;
            }
            if shortcut {
                self.build_shortcut(agent);
                self.path_type = PathType::NORMAL | PathType::NOT_USING_PATH | far;
                return;
            }
            if let Some(closest) = self.query.closest_point_on_poly(mesh, end_poly, end) {
                end_point = closest;
                self.actual_end = closest;
            }
            base = PathType::INCOMPLETE;
        }

        if start_poly == end_poly {
            self.build_shortcut(agent);
            self.corridor.push(start_poly);
            self.path_type = if far.is_empty() {
                PathType::NORMAL
            } else {
                PathType::INCOMPLETE | far
            };
            return;
        }

        let previous = std::mem::take(&mut self.corridor);
        let start_index = previous.iter().position(|&p| p == start_poly);
        let end_index = start_index
            .and_then(|s| previous.iter().rposition(|&p| p == end_poly).filter(|&e| e > s));

        let corridor = match (start_index, end_index) {
            (Some(s), Some(e)) => {
                tracing::trace!(from = s, to = e, "reusing corridor slice");
                previous[s..=e].to_vec()
            }
            (Some(s), None) => {
                match self.splice_corridor(mesh, &previous[s..], end_poly, end_point) {
                    Some(corridor) => corridor,
                    None => {
                        self.build_shortcut(agent);
                        return;
                    }
                }
            }
            _ if self.use_raycast => {
                self.raycast_path(agent, mesh, start_poly, start, end_point, far);
                return;
            }
            _ => {
                let found = self.query.find_path(
                    mesh,
                    start_poly,
                    end_poly,
                    start,
                    end_point,
                    &self.filter,
                    self.config.max_path_length,
                );
                match found {
                    Some(c) if !c.polys.is_empty() => c.polys,
                    _ => {
                        self.build_shortcut(agent);
                        return;
                    }
                }
            }
        };

        let reached = corridor.last() == Some(&end_poly) && !base.contains(PathType::INCOMPLETE);
        self.path_type = far | if reached { PathType::NORMAL } else { PathType::INCOMPLETE };
        self.corridor = corridor;
        self.build_point_path(agent, mesh, start, end_point, far);
    }

    /// Keep a prefix of the old corridor and search the rest from its last polygon.
    fn splice_corridor(
        &mut self,
        mesh: &NavMesh,
        remaining: &[PolyRef],
        end_poly: PolyRef,
        end_point: Vec3,
    ) -> Option<Vec<PolyRef>> {
        let mut prefix_len = ((remaining.len() as f32 * self.config.corridor_reuse_prefix + 0.5)
            as usize)
            .clamp(1, remaining.len());

        let mut suffix_start = remaining[prefix_len - 1];
        if mesh.is_off_mesh_link(suffix_start) {
            prefix_len -= 1;
            if prefix_len == 0 {
                return None;
            }
            suffix_start = remaining[prefix_len - 1];
            if mesh.is_off_mesh_link(suffix_start) {
                return None;
            }
        }
        let suffix_point = self.query.closest_point_on_poly(mesh, suffix_start, end_point)?;

        let mut corridor = remaining[..prefix_len].to_vec();
        let max_suffix = self.config.max_path_length.saturating_sub(prefix_len).max(1) + 1;
        let suffix = self.query.find_path(
            mesh,
            suffix_start,
            end_poly,
            suffix_point,
            end_point,
            &self.filter,
            max_suffix,
        );
        match suffix {
            Some(s) if !s.polys.is_empty() => {
                corridor.pop();
                corridor.extend(s.polys);
            }
            _ => tracing::debug!("corridor suffix search failed, keeping prefix"),
        }
        Some(corridor)
    }

    fn raycast_path<A: PathAgent + ?Sized>(
        &mut self,
        agent: &A,
        mesh: &NavMesh,
        start_poly: PolyRef,
        start: Vec3,
        end_point: Vec3,
        far: PathType,
    ) {
        let hit = self.query.raycast(
            mesh,
            start_poly,
            start,
            end_point,
            &self.filter,
            self.config.max_path_length,
        );
        let Some(hit) = hit.filter(|h| !h.corridor.is_empty()) else {
            self.build_shortcut(agent);
            self.path_type = PathType::NOPATH | far;
            return;
        };
        let last_poly = hit.corridor[hit.corridor.len() - 1];

        let (end, path_type) = if hit.is_clear() {
            let mut p = end_point;
            if let Some(h) = self.query.poly_height(mesh, last_poly, p) {
                p.z = h;
            }
            let t = if far.is_empty() { PathType::NORMAL } else { PathType::INCOMPLETE | far };
            (p, t)
        } else {
            // Back off slightly so the point stays on the mesh.
            let mut p = start.lerp(end_point, hit.t * 0.99);
            match self.query.poly_height(mesh, last_poly, p) {
                Some(h) => p.z = h,
                None => {
                    if let Some(q) = self.query.closest_point_on_poly_boundary(mesh, last_poly, p) {
                        p = q;
                    }
                }
            }
            (p, PathType::INCOMPLETE | far)
        };

        self.corridor = hit.corridor;
        self.points.clear();
        self.points.push(start);
        self.points.push(end);
        self.normalize_path(agent);
        self.actual_end = self.points[1];
        self.path_type = path_type;
    }

    fn build_point_path<A: PathAgent + ?Sized>(
        &mut self,
        agent: &A,
        mesh: &NavMesh,
        start: Vec3,
        end: Vec3,
        far: PathType,
    ) {
        let extracted = if self.use_straight_path {
            self.query
                .find_straight_path(mesh, start, end, &self.corridor, self.point_path_limit)
                .map(|pts| pts.into_iter().map(|p| p.pos).collect::<Vec<_>>())
        } else {
            self.find_smooth_path(mesh, start, end)
        };

        let mut points = extracted.unwrap_or_default();
        if self.corridor.len() == 1 && points.len() == 1 {
            points.push(end);
        } else if points.len() < 2 {
            tracing::debug!("point extraction failed");
            self.build_shortcut(agent);
            self.path_type = PathType::NOPATH | far;
            return;
        } else if points.len() >= self.point_path_limit {
            self.build_shortcut(agent);
            self.path_type = PathType::SHORT | far;
            return;
        }

        self.points = points;
        self.normalize_path(agent);
        if let Some(&last) = self.points.last() {
            self.actual_end = last;
        }

        if self.force_destination
            && (!self.path_type.contains(PathType::NORMAL) || !self.end_in_tolerance())
        {
            let reach = self.actual_end.distance_sq(self.end);
            let total = self.start.distance_sq(self.end);
            self.actual_end = self.end;
            if reach < self.config.force_destination_ratio * total {
                if let Some(last) = self.points.last_mut() {
                    *last = self.end;
                }
            } else {
                self.build_shortcut(agent);
            }
            self.path_type = PathType::NORMAL | PathType::NOT_USING_PATH;
        }
    }

    fn end_in_tolerance(&self) -> bool {
        let tol = self.config.force_destination_tolerance;
        self.end.distance_2d_sq(self.actual_end) <= tol * tol
            && (self.end.z - self.actual_end.z).abs() <= tol
    }

    /// Walk the corridor in fixed steps, steering toward the next straight-path corner.
    fn find_smooth_path(&mut self, mesh: &NavMesh, start: Vec3, end: Vec3) -> Option<Vec<Vec3>> {
        let mut polys = self.corridor.clone();
        let first = *polys.first()?;
        let last = *polys.last()?;
        let mut iter_pos = self.query.closest_point_on_poly_boundary(mesh, first, start)?;
        let target = self.query.closest_point_on_poly_boundary(mesh, last, end)?;

        let step = self.config.smooth_path_step_size;
        let slop = self.config.smooth_path_slop;
        let max_points = self.point_path_limit.max(1);
        let in_range =
            |a: Vec3, b: Vec3| a.distance_2d_sq(b) < slop * slop && (a.z - b.z).abs() < 1.0;

        let mut out = vec![iter_pos];
        while !polys.is_empty() && out.len() < max_points {
            let Some(steer) = self.steer_target(mesh, iter_pos, target, slop, &polys) else {
                break;
            };
            let end_of_path = steer.flags.contains(StraightPathFlags::END);
            let off_mesh = steer.flags.contains(StraightPathFlags::OFFMESH);

            let delta = steer.pos - iter_pos;
            let len = delta.length();
            let scale = if (end_of_path || off_mesh) && len < step { 1.0 } else { step / len };
            let move_target = iter_pos + delta * scale;

            let (mut result, visited) = self.query.move_along_surface(
                mesh,
                polys[0],
                iter_pos,
                move_target,
                &self.filter,
                MAX_VISIT_POLY,
            )?;
            fixup_corridor(&mut polys, self.config.max_path_length, &visited);
            if let Some(h) = self.query.poly_height(mesh, polys[0], result) {
                result.z = h;
            }
            let stalled = result.distance_2d_sq(iter_pos) <= STALL_DISTANCE * STALL_DISTANCE;
            iter_pos = result;

            if stalled && !(end_of_path && in_range(iter_pos, steer.pos)) && !off_mesh {
                // No headway over the surface: finish along the corridor corners.
                tracing::debug!(
                    x = iter_pos.x,
                    y = iter_pos.y,
                    "smoothing stalled, using corridor corners"
                );
                let corners =
                    self.query.find_straight_path(mesh, iter_pos, target, &polys, max_points)?;
                for corner in corners.into_iter().skip(1) {
                    if out.len() >= max_points {
                        break;
                    }
                    out.push(corner.pos);
                }
                break;
            }

            if end_of_path && in_range(iter_pos, steer.pos) {
                out.push(target);
                break;
            } else if off_mesh && in_range(iter_pos, steer.pos) {
                // Advance over the link and continue from its far end.
                let Some(link_at) = polys.iter().position(|&p| p == steer.poly) else {
                    break;
                };
                let prev = if link_at == 0 { polys[0] } else { polys[link_at - 1] };
                let link = polys[link_at];
                polys.drain(..=link_at);
                if let Some((link_start, link_end)) =
                    self.query.off_mesh_link_endpoints(mesh, prev, link)
                {
                    if out.len() < max_points {
                        out.push(link_start);
                    }
                    iter_pos = link_end;
                    if let Some(&next) = polys.first() {
                        if let Some(h) = self.query.poly_height(mesh, next, iter_pos) {
                            iter_pos.z = h;
                        }
                    }
                }
            }

            if out.len() < max_points {
                out.push(iter_pos);
            }
        }
        Some(out)
    }

    fn steer_target(
        &mut self,
        mesh: &NavMesh,
        start: Vec3,
        end: Vec3,
        min_target_dist: f32,
        polys: &[PolyRef],
    ) -> Option<StraightPoint> {
        let corners = self
            .query
            .find_straight_path(mesh, start, end, polys, MAX_STEER_POINTS)?;
        let min_sq = min_target_dist * min_target_dist;
        let mut steer = corners.into_iter().find(|c| {
            c.flags.contains(StraightPathFlags::OFFMESH)
                || c.pos.distance_2d_sq(start) >= min_sq
                || (c.pos.z - start.z).abs() >= 1000.0
        })?;
        steer.pos.z = start.z;
        Some(steer)
    }
}

/// Merge the polygons visited by a surface move into the front of the corridor.
fn fixup_corridor(path: &mut Vec<PolyRef>, max_path: usize, visited: &[PolyRef]) {
    let mut common: Option<(usize, usize)> = None;
    'outer: for i in (0..path.len()).rev() {
        for j in (0..visited.len()).rev() {
            if path[i] == visited[j] {
                common = Some((i, j));
                break 'outer;
            }
        }
    }
    let Some((furthest_path, furthest_visited)) = common else {
        return;
    };

    let mut merged: Vec<PolyRef> = visited[furthest_visited..].iter().rev().copied().collect();
    let keep = max_path.saturating_sub(merged.len());
    merged.extend(path.iter().skip(furthest_path + 1).take(keep).copied());
    *path = merged;
}

fn create_filter(caps: AgentCapabilities) -> QueryFilter {
    let include = if caps.is_player {
        NavTerrain::GROUND | NavTerrain::WATER | NavTerrain::MAGMA_SLIME
    } else {
        let mut include = NavTerrain::empty();
        if caps.can_walk {
            include |= NavTerrain::GROUND;
        }
        if caps.can_swim {
            include |= NavTerrain::WATER | NavTerrain::MAGMA_SLIME;
        }
        include
    };
    QueryFilter::new(include, NavTerrain::empty())
}
