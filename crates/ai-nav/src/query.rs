use core::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use ai_core::Vec3;
use bitflags::bitflags;

use crate::filter::QueryFilter;
use crate::mesh::{
    closest_point_on_segment, closest_point_on_triangle, segment_intersection_t, tri_edges,
    triangle_height, NavMesh, PolyRef, PolyShape, Portal,
};

/// Expansion limit of a single corridor search.
pub const DEFAULT_MAX_NODES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: u32,
    g: u32,
    poly: usize,
    tie: u64,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, usize, u64) {
        (self.f, self.g, self.poly, self.tie)
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered polygons from a start polygon toward an end polygon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolyCorridor {
    pub polys: Vec<PolyRef>,
    /// The corridor stops short of the requested end polygon.
    pub partial: bool,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StraightPathFlags: u8 {
        const START   = 0x01;
        const END     = 0x02;
        /// The point is the entrance of an off-mesh link.
        const OFFMESH = 0x04;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightPoint {
    pub pos: Vec3,
    pub flags: StraightPathFlags,
    /// Polygon entered at this point.
    pub poly: PolyRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RaycastHit {
    /// Fraction of the segment travelled before hitting a wall, `f32::MAX` when clear.
    pub t: f32,
    pub corridor: Vec<PolyRef>,
}

impl RaycastHit {
    pub fn is_clear(&self) -> bool {
        self.t == f32::MAX
    }
}

/// Reusable scratch buffers for navmesh queries.
#[derive(Debug)]
pub struct NavMeshQuery {
    open: BinaryHeap<OpenNode>,
    g_score: Vec<u32>,
    came_from: Vec<Option<usize>>,
    candidates: Vec<usize>,
    portals: Vec<(Vec3, Vec3)>,
    portal_polys: Vec<PolyRef>,
    max_nodes: usize,
}

impl Default for NavMeshQuery {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NODES)
    }
}

impl NavMeshQuery {
    pub fn new(max_nodes: usize) -> Self {
        Self {
            open: BinaryHeap::new(),
            g_score: Vec::new(),
            came_from: Vec::new(),
            candidates: Vec::new(),
            portals: Vec::new(),
            portal_polys: Vec::new(),
            max_nodes: max_nodes.max(1),
        }
    }

    /// Whether the polygon exists, is loaded, and passes the filter. Links always pass.
    pub fn is_passable(&self, mesh: &NavMesh, poly: PolyRef, filter: &QueryFilter) -> bool {
        poly.index().is_some_and(|idx| passable(mesh, idx, filter))
    }

    /// Nearest loaded triangle within the box `center ± half_extents`.
    pub fn find_nearest_poly(
        &mut self,
        mesh: &NavMesh,
        center: Vec3,
        half_extents: Vec3,
        filter: &QueryFilter,
    ) -> Option<(PolyRef, Vec3)> {
        mesh.polys_in_box(center - half_extents, center + half_extents, &mut self.candidates);

        let mut best: Option<(f32, usize, Vec3)> = None;
        for &idx in &self.candidates {
            let poly = mesh.poly_at(idx);
            let PolyShape::Triangle { verts, .. } = &poly.shape else {
                continue;
            };
            if !filter.passes(poly.area) {
                continue;
            }
            let closest = closest_point_on_triangle(center, verts);
            let d2 = center.distance_sq(closest);
            if best.map_or(true, |(best_d2, _, _)| d2 < best_d2) {
                best = Some((d2, idx, closest));
            }
        }
        best.map(|(_, idx, p)| (PolyRef::from_index(idx), p))
    }

    /// Height of a triangle at `pos`; `None` outside it or for links.
    pub fn poly_height(&self, mesh: &NavMesh, poly: PolyRef, pos: Vec3) -> Option<f32> {
        match &mesh.poly(poly)?.shape {
            PolyShape::Triangle { verts, .. } => triangle_height(pos, verts),
            PolyShape::Link(_) => None,
        }
    }

    pub fn closest_point_on_poly(&self, mesh: &NavMesh, poly: PolyRef, pos: Vec3) -> Option<Vec3> {
        match &mesh.poly(poly)?.shape {
            PolyShape::Triangle { verts, .. } => Some(closest_point_on_triangle(pos, verts)),
            PolyShape::Link(link) => Some(closest_point_on_segment(pos, link.start, link.end).1),
        }
    }

    /// Like [`Self::closest_point_on_poly`], but a point already inside keeps its height.
    pub fn closest_point_on_poly_boundary(
        &self,
        mesh: &NavMesh,
        poly: PolyRef,
        pos: Vec3,
    ) -> Option<Vec3> {
        match &mesh.poly(poly)?.shape {
            PolyShape::Triangle { verts, .. } if triangle_height(pos, verts).is_some() => Some(pos),
            _ => self.closest_point_on_poly(mesh, poly, pos),
        }
    }

    pub fn poly_center(&self, mesh: &NavMesh, poly: PolyRef) -> Option<Vec3> {
        mesh.poly(poly).map(|p| p.center)
    }

    /// A* over polygon adjacency.
    ///
    /// When the end polygon is unreachable the corridor leads to the explored polygon
    /// closest to `end` and is flagged partial. `None` only for invalid input.
    #[allow(clippy::too_many_arguments)]
    pub fn find_path(
        &mut self,
        mesh: &NavMesh,
        start_ref: PolyRef,
        end_ref: PolyRef,
        _start: Vec3,
        end: Vec3,
        filter: &QueryFilter,
        max_path: usize,
    ) -> Option<PolyCorridor> {
        let start_idx = start_ref.index()?;
        let end_idx = end_ref.index()?;
        if max_path == 0 || !passable(mesh, start_idx, filter) || !passable(mesh, end_idx, filter)
        {
            return None;
        }
        if start_idx == end_idx {
            return Some(PolyCorridor {
                polys: vec![start_ref],
                partial: false,
            });
        }

        let quant = |d: f32| -> u32 { (d.max(0.0) * 1024.0) as u32 };
        let heuristic = |idx: usize| -> u32 { quant(mesh.poly_at(idx).center.distance(end)) };
        let edge_cost = |a: usize, b: usize| -> u32 {
            quant(mesh.poly_at(a).center.distance(mesh.poly_at(b).center)).saturating_add(1)
        };

        let n = mesh.poly_count();
        self.open.clear();
        self.g_score.clear();
        self.g_score.resize(n, u32::MAX);
        self.came_from.clear();
        self.came_from.resize(n, None);

        self.g_score[start_idx] = 0;
        let start_h = heuristic(start_idx);
        self.open.push(OpenNode {
            f: start_h,
            g: 0,
            poly: start_idx,
            tie: 0,
        });
        let mut tie: u64 = 1;
        let mut best = (start_h, start_idx);
        let mut expanded = 0usize;
        let mut reached = false;

        while let Some(node) = self.open.pop() {
            if node.poly == end_idx {
                reached = true;
                break;
            }
            if node.g != self.g_score[node.poly] {
                continue;
            }
            expanded += 1;
            if expanded > self.max_nodes {
                tracing::debug!(max_nodes = self.max_nodes, "corridor search ran out of nodes");
                break;
            }

            for adj in mesh.poly_at(node.poly).adjacent.iter() {
                let next = adj.poly;
                if !passable(mesh, next, filter) {
                    continue;
                }
                let tentative_g = node.g.saturating_add(edge_cost(node.poly, next));
                if tentative_g >= self.g_score[next] {
                    continue;
                }
                self.came_from[next] = Some(node.poly);
                self.g_score[next] = tentative_g;
                let h = heuristic(next);
                if h < best.0 {
                    best = (h, next);
                }
                self.open.push(OpenNode {
                    f: tentative_g.saturating_add(h),
                    g: tentative_g,
                    poly: next,
                    tie,
                });
                tie += 1;
            }
        }

        let last = if reached { end_idx } else { best.1 };
        let mut polys = vec![PolyRef::from_index(last)];
        let mut current = last;
        while let Some(prev) = self.came_from[current] {
            current = prev;
            polys.push(PolyRef::from_index(current));
        }
        polys.reverse();

        let mut partial = !reached;
        if polys.len() > max_path {
            polys.truncate(max_path);
            partial = true;
        }
        Some(PolyCorridor { polys, partial })
    }

    /// Corner points of the corridor, funnelled per segment and split at off-mesh links.
    ///
    /// The first point carries `START`, the last `END`, and each link entrance `OFFMESH`.
    pub fn find_straight_path(
        &mut self,
        mesh: &NavMesh,
        start: Vec3,
        end: Vec3,
        corridor: &[PolyRef],
        max_points: usize,
    ) -> Option<Vec<StraightPoint>> {
        let (&first, &last) = (corridor.first()?, corridor.last()?);
        if max_points == 0 {
            return None;
        }
        let start = self.closest_point_on_poly_boundary(mesh, first, start)?;
        let end = self.closest_point_on_poly_boundary(mesh, last, end)?;

        let mut out = vec![StraightPoint {
            pos: start,
            flags: StraightPathFlags::START,
            poly: first,
        }];
        let mut apex = start;
        self.portals.clear();
        self.portal_polys.clear();

        let mut i = 0;
        while i + 1 < corridor.len() {
            let (a, b) = (corridor[i], corridor[i + 1]);
            match portal_between(mesh, a, b)? {
                Portal::Edge(p0, p1) => {
                    let ca = mesh.poly(a)?.center;
                    let dir = mesh.poly(b)?.center - ca;
                    let s0 = dir.cross_2d(p0 - ca);
                    let s1 = dir.cross_2d(p1 - ca);
                    let (left, right) = if s0 >= s1 { (p0, p1) } else { (p1, p0) };
                    self.portals.push((left, right));
                    self.portal_polys.push(b);
                    i += 1;
                }
                Portal::Point(entry) => {
                    // Entering a link: finish the segment at its entrance.
                    self.portals.push((entry, entry));
                    self.portal_polys.push(b);
                    string_pull(apex, &self.portals, &self.portal_polys, &mut out);
                    if let Some(p) = out.last_mut() {
                        p.flags |= StraightPathFlags::OFFMESH;
                    }
                    self.portals.clear();
                    self.portal_polys.clear();

                    let Some(&after) = corridor.get(i + 2) else {
                        break;
                    };
                    let Portal::Point(exit) = portal_between(mesh, b, after)? else {
                        return None;
                    };
                    push_point(&mut out, exit, StraightPathFlags::empty(), after);
                    apex = exit;
                    i += 2;
                }
            }
        }

        self.portals.push((end, end));
        self.portal_polys.push(last);
        string_pull(apex, &self.portals, &self.portal_polys, &mut out);
        if out.len() < 2 || out.last().is_some_and(|p| p.pos.distance_sq(end) > 1e-6) {
            out.push(StraightPoint {
                pos: end,
                flags: StraightPathFlags::empty(),
                poly: last,
            });
        }
        if let Some(p) = out.last_mut() {
            p.flags |= StraightPathFlags::END;
        }
        out.truncate(max_points);
        Some(out)
    }

    /// Slide from `start` toward `target` over connected triangles.
    ///
    /// Breadth-first search over the triangles touching the circle spanned by
    /// `start..target`, capped at `max_visited` polygons. Returns `target` when one of
    /// them contains it, otherwise the closest point on a wall edge. The visited list is
    /// the chain of polygons from `start_ref` to the polygon holding the result.
    pub fn move_along_surface(
        &mut self,
        mesh: &NavMesh,
        start_ref: PolyRef,
        start: Vec3,
        target: Vec3,
        filter: &QueryFilter,
        max_visited: usize,
    ) -> Option<(Vec3, Vec<PolyRef>)> {
        let start_idx = start_ref.index()?;
        if !passable(mesh, start_idx, filter) || mesh.poly_at(start_idx).is_link() {
            return None;
        }
        let max_visited = max_visited.max(1);

        let center = start.lerp(target, 0.5);
        let radius_sq = start.distance_sq(target) * 0.25 + 0.001;

        // (polygon, parent node)
        let mut nodes: Vec<(usize, Option<usize>)> = vec![(start_idx, None)];
        let mut open = VecDeque::from([0usize]);
        let mut best_pos = start;
        let mut best_dist = f32::MAX;
        let mut best_node = 0usize;

        while let Some(node) = open.pop_front() {
            let PolyShape::Triangle { verts, edges } = &mesh.poly_at(nodes[node].0).shape else {
                continue;
            };
            if let Some(h) = triangle_height(target, verts) {
                best_pos = target.with_z(h);
                best_node = node;
                break;
            }

            for (k, (a, b)) in tri_edges(verts).into_iter().enumerate() {
                match edges[k].filter(|&n| passable(mesh, n, filter)) {
                    None => {
                        let (_, wall) = closest_point_on_segment(target, a, b);
                        let d = target.distance_2d_sq(wall);
                        if d < best_dist {
                            best_dist = d;
                            best_pos = wall;
                            best_node = node;
                        }
                    }
                    Some(n) => {
                        if nodes.len() >= max_visited || nodes.iter().any(|&(p, _)| p == n) {
                            continue;
                        }
                        let (_, near) = closest_point_on_segment(center, a, b);
                        if center.distance_2d_sq(near) > radius_sq {
                            continue;
                        }
                        nodes.push((n, Some(node)));
                        open.push_back(nodes.len() - 1);
                    }
                }
            }
        }

        let mut visited = Vec::new();
        let mut cursor = Some(best_node);
        while let Some(i) = cursor {
            visited.push(PolyRef::from_index(nodes[i].0));
            cursor = nodes[i].1;
        }
        visited.reverse();
        Some((best_pos, visited))
    }

    /// Walkability test along the straight segment `start -> end`.
    pub fn raycast(
        &mut self,
        mesh: &NavMesh,
        start_ref: PolyRef,
        start: Vec3,
        end: Vec3,
        filter: &QueryFilter,
        max_path: usize,
    ) -> Option<RaycastHit> {
        let mut corridor = vec![start_ref];
        let outcome = walk(mesh, start_ref, start, end, filter, max_path, &mut corridor)?;
        let t = match outcome {
            Walk::Reached(_) => f32::MAX,
            Walk::Blocked { t, .. } => t,
            Walk::Lost(_) => 0.0,
        };
        Some(RaycastHit { t, corridor })
    }

    /// Link endpoints ordered by the direction of travel coming from `prev`.
    pub fn off_mesh_link_endpoints(
        &self,
        mesh: &NavMesh,
        prev: PolyRef,
        link: PolyRef,
    ) -> Option<(Vec3, Vec3)> {
        let PolyShape::Link(l) = &mesh.poly(link)?.shape else {
            return None;
        };
        let Portal::Point(entry) = portal_between(mesh, prev, link)? else {
            return None;
        };
        if entry.distance_sq(l.start) <= entry.distance_sq(l.end) {
            Some((l.start, l.end))
        } else {
            Some((l.end, l.start))
        }
    }
}

fn passable(mesh: &NavMesh, idx: usize, filter: &QueryFilter) -> bool {
    if !mesh.is_poly_loaded(idx) {
        return false;
    }
    let poly = mesh.poly_at(idx);
    poly.is_link() || filter.passes(poly.area)
}

fn portal_between(mesh: &NavMesh, from: PolyRef, to: PolyRef) -> Option<Portal> {
    let to_idx = to.index()?;
    mesh.poly(from)?
        .adjacent
        .iter()
        .find(|adj| adj.poly == to_idx)
        .map(|adj| adj.portal)
}

enum Walk {
    /// Target is inside the last visited triangle, at this height.
    Reached(f32),
    Blocked { t: f32, edge: (Vec3, Vec3) },
    /// The segment does not cross the current triangle.
    Lost(Vec3),
}

fn walk(
    mesh: &NavMesh,
    start_ref: PolyRef,
    start: Vec3,
    target: Vec3,
    filter: &QueryFilter,
    max_visited: usize,
    visited: &mut Vec<PolyRef>,
) -> Option<Walk> {
    let mut current = start_ref.index()?;
    if !passable(mesh, current, filter) {
        return None;
    }
    let dir = target - start;
    let len = dir.length_2d();
    let mut entry_t = 0.0f32;
    loop {
        let PolyShape::Triangle { verts, edges } = &mesh.poly_at(current).shape else {
            return None;
        };
        if let Some(h) = triangle_height(target, verts) {
            return Some(Walk::Reached(h));
        }

        // Exit edge: the crossing farthest along the segment.
        let mut exit: Option<(f32, usize)> = None;
        for (k, (a, b)) in tri_edges(verts).into_iter().enumerate() {
            if let Some(t) = segment_intersection_t(start, dir, a, b - a) {
                if exit.map_or(true, |(best, _)| t > best) {
                    exit = Some((t, k));
                }
            }
        }
        let Some((t, k)) = exit else {
            return Some(Walk::Lost(closest_point_on_triangle(target, verts)));
        };

        // The segment only grazes this triangle at a vertex: continue in whichever
        // triangle of the fan around it lies ahead.
        if t <= entry_t + VERTEX_EPS && len > VERTEX_EPS {
            let ahead = start + dir * (t + VERTEX_STEP / len).min(1.0);
            let pivot = start + dir * t;
            let fan =
                step_through_vertex(mesh, current, pivot, ahead, filter, max_visited, visited);
            if let Some(next) = fan {
                current = next;
                entry_t = t;
                continue;
            }
        }

        let next = edges[k].filter(|&n| {
            visited.len() < max_visited
                && passable(mesh, n, filter)
                && !visited.contains(&PolyRef::from_index(n))
        });
        match next {
            Some(n) => {
                visited.push(PolyRef::from_index(n));
                current = n;
                entry_t = t;
            }
            None => {
                return Some(Walk::Blocked {
                    t,
                    edge: tri_edges(verts)[k],
                })
            }
        }
    }
}

const VERTEX_EPS: f32 = 1e-5;
const VERTEX_STEP: f32 = 1e-2;
const FAN_LIMIT: usize = 16;

/// Breadth-first over the unvisited triangles touching `pivot`, looking for the one that
/// contains `ahead`. Appends the chain of triangles crossed to `visited`.
fn step_through_vertex(
    mesh: &NavMesh,
    from: usize,
    pivot: Vec3,
    ahead: Vec3,
    filter: &QueryFilter,
    max_visited: usize,
    visited: &mut Vec<PolyRef>,
) -> Option<usize> {
    let touches = |idx: usize| match &mesh.poly_at(idx).shape {
        PolyShape::Triangle { verts, .. } => {
            let closest = closest_point_on_triangle(pivot, verts);
            closest.distance_2d_sq(pivot) <= VERTEX_STEP * VERTEX_STEP
        }
        PolyShape::Link(_) => false,
    };

    let mut nodes: Vec<(usize, Option<usize>)> = vec![(from, None)];
    let mut open = VecDeque::from([0usize]);
    let mut found = None;
    while let Some(node) = open.pop_front() {
        let PolyShape::Triangle { edges, .. } = &mesh.poly_at(nodes[node].0).shape else {
            continue;
        };
        for n in edges.iter().flatten().copied() {
            if nodes.len() >= FAN_LIMIT
                || nodes.iter().any(|&(p, _)| p == n)
                || visited.contains(&PolyRef::from_index(n))
                || !passable(mesh, n, filter)
                || !touches(n)
            {
                continue;
            }
            nodes.push((n, Some(node)));
            let PolyShape::Triangle { verts, .. } = &mesh.poly_at(n).shape else {
                continue;
            };
            if triangle_height(ahead, verts).is_some() {
                found = Some(nodes.len() - 1);
                break;
            }
            open.push_back(nodes.len() - 1);
        }
        if found.is_some() {
            break;
        }
    }

    let mut chain = Vec::new();
    let mut cursor = found;
    while let Some(i) = cursor {
        if nodes[i].1.is_some() {
            chain.push(PolyRef::from_index(nodes[i].0));
        }
        cursor = nodes[i].1;
    }
    if chain.is_empty() || visited.len() + chain.len() > max_visited {
        return None;
    }
    chain.reverse();
    let next = chain.last().and_then(|p| p.index());
    visited.extend(chain);
    next
}

fn push_point(out: &mut Vec<StraightPoint>, pos: Vec3, flags: StraightPathFlags, poly: PolyRef) {
    if out.last().is_some_and(|p| p.pos.distance_sq(pos) <= 1e-6) {
        return;
    }
    out.push(StraightPoint { pos, flags, poly });
}

/// Funnel algorithm over plan-view portals `(left, right)`; appends the corners after
/// `apex`, ending with the last portal's point.
fn string_pull(
    apex: Vec3,
    portals: &[(Vec3, Vec3)],
    portal_polys: &[PolyRef],
    out: &mut Vec<StraightPoint>,
) {
    let n = portals.len();
    if n == 0 {
        return;
    }
    let same = |a: Vec3, b: Vec3| a.distance_2d_sq(b) <= 1e-8;

    let mut apex = apex;
    let mut left = apex;
    let mut right = apex;
    let mut left_index = 0usize;
    let mut right_index = 0usize;

    let mut i = 0usize;
    while i < n {
        let (p_left, p_right) = portals[i];

        // Update right vertex.
        if (right - apex).cross_2d(p_right - apex) >= 0.0 {
            if same(apex, right) || (left - apex).cross_2d(p_right - apex) < 0.0 {
                right = p_right;
                right_index = i;
            } else {
                push_point(out, left, StraightPathFlags::empty(), portal_polys[left_index]);
                apex = left;
                right = apex;
                right_index = left_index;
                i = left_index + 1;
                continue;
            }
        }

        // Update left vertex.
        if (left - apex).cross_2d(p_left - apex) <= 0.0 {
            if same(apex, left) || (right - apex).cross_2d(p_left - apex) > 0.0 {
                left = p_left;
                left_index = i;
            } else {
                push_point(out, right, StraightPathFlags::empty(), portal_polys[right_index]);
                apex = right;
                left = apex;
                left_index = right_index;
                i = right_index + 1;
                continue;
            }
        }

        i += 1;
    }

    push_point(out, portals[n - 1].0, StraightPathFlags::empty(), portal_polys[n - 1]);
}
