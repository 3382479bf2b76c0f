use std::collections::BTreeMap;

use ai_core::Vec3;

use crate::error::NavMeshError;
use crate::filter::NavArea;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_TILE_SIZE: f32 = 533.333_3;

pub type TileCoord = (i32, i32);

/// Handle to a navmesh polygon: index + 1, so zero is never a valid polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolyRef(u32);

impl PolyRef {
    pub const INVALID: Self = Self(0);

    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    pub fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A traversable connection between two mesh points that are not joined by walkable
/// triangles (jumps, ladders, drops).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OffMeshLink {
    pub start: Vec3,
    pub end: Vec3,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bidirectional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriangleData {
    pub verts: [Vec3; 3],
    #[cfg_attr(feature = "serde", serde(default))]
    pub area: NavArea,
}

/// Source form of a navmesh. Every conversion into [`NavMesh`] is validated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavMeshData {
    #[cfg_attr(feature = "serde", serde(default))]
    pub origin: Vec3,
    #[cfg_attr(feature = "serde", serde(default = "default_tile_size"))]
    pub tile_size: f32,
    pub triangles: Vec<TriangleData>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub off_mesh_links: Vec<OffMeshLink>,
}

#[cfg(feature = "serde")]
fn default_tile_size() -> f32 {
    DEFAULT_TILE_SIZE
}

impl Default for NavMeshData {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            tile_size: DEFAULT_TILE_SIZE,
            triangles: Vec::new(),
            off_mesh_links: Vec::new(),
        }
    }
}

/// How two adjacent polygons connect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Portal {
    Edge(Vec3, Vec3),
    Point(Vec3),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Adjacent {
    pub poly: usize,
    pub portal: Portal,
}

#[derive(Debug, Clone)]
pub(crate) enum PolyShape {
    Triangle {
        verts: [Vec3; 3],
        /// Neighbor across edge (0,1), (1,2), (2,0).
        edges: [Option<usize>; 3],
    },
    Link(OffMeshLink),
}

#[derive(Debug, Clone)]
pub(crate) struct Poly {
    pub shape: PolyShape,
    pub area: NavArea,
    pub tile: TileCoord,
    pub center: Vec3,
    pub min: Vec3,
    pub max: Vec3,
    /// Outgoing connections in deterministic order: edges first, then links.
    pub adjacent: Vec<Adjacent>,
}

impl Poly {
    pub fn is_link(&self) -> bool {
        matches!(self.shape, PolyShape::Link(_))
    }
}

#[derive(Debug, Clone, Default)]
struct Tile {
    loaded: bool,
    polys: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct NavMeshBuilder {
    data: NavMeshData,
}

impl NavMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: NavMeshData) -> Self {
        Self { data }
    }

    pub fn origin(mut self, origin: Vec3) -> Self {
        self.data.origin = origin;
        self
    }

    pub fn tile_size(mut self, tile_size: f32) -> Self {
        self.data.tile_size = tile_size;
        self
    }

    pub fn triangle(mut self, verts: [Vec3; 3], area: NavArea) -> Self {
        self.data.triangles.push(TriangleData { verts, area });
        self
    }

    pub fn ground_triangles(mut self, tris: impl IntoIterator<Item = [Vec3; 3]>) -> Self {
        self.data.triangles.extend(tris.into_iter().map(|verts| TriangleData {
            verts,
            area: NavArea::Ground,
        }));
        self
    }

    pub fn off_mesh_link(mut self, link: OffMeshLink) -> Self {
        self.data.off_mesh_links.push(link);
        self
    }

    pub fn build(self) -> Result<NavMesh, NavMeshError> {
        NavMesh::from_data(self.data)
    }
}

/// Walkable surface made of triangles plus off-mesh links, bucketed into square tiles.
#[derive(Debug, Clone)]
pub struct NavMesh {
    polys: Vec<Poly>,
    triangle_count: usize,
    origin: Vec3,
    tile_size: f32,
    tiles: BTreeMap<TileCoord, Tile>,
    /// How many tiles beyond its own a polygon may reach.
    tile_reach: i32,
}

impl NavMesh {
    /// Build an all-ground navmesh from non-overlapping triangles.
    ///
    /// Adjacency is inferred from shared edges with bit-identical vertices.
    pub fn from_triangles(tris: Vec<[Vec3; 3]>) -> Result<Self, NavMeshError> {
        NavMeshBuilder::new().ground_triangles(tris).build()
    }

    pub fn from_data(data: NavMeshData) -> Result<Self, NavMeshError> {
        if !(data.tile_size.is_finite() && data.tile_size > 0.0) {
            return Err(NavMeshError::InvalidTileSize(data.tile_size));
        }
        if data.triangles.is_empty() {
            return Err(NavMeshError::Empty);
        }
        for (index, tri) in data.triangles.iter().enumerate() {
            if !tri.verts.iter().all(|v| v.is_finite()) {
                return Err(NavMeshError::NonFiniteVertex { index });
            }
            let [a, b, c] = tri.verts;
            if (b - a).cross_2d(c - a).abs() <= 1e-9 {
                return Err(NavMeshError::DegenerateTriangle { index });
            }
        }

        let edges = triangle_adjacency(&data.triangles);
        let mut polys: Vec<Poly> = data
            .triangles
            .iter()
            .zip(edges)
            .map(|(tri, edges)| {
                let verts = tri.verts;
                let adjacent = tri_edges(&verts)
                    .into_iter()
                    .zip(edges)
                    .filter_map(|((a, b), n)| {
                        n.map(|poly| Adjacent {
                            poly,
                            portal: Portal::Edge(a, b),
                        })
                    })
                    .collect();
                let (min, max) = bounds(&verts);
                Poly {
                    shape: PolyShape::Triangle { verts, edges },
                    area: tri.area,
                    tile: (0, 0),
                    center: tri_centroid(&verts),
                    min,
                    max,
                    adjacent,
                }
            })
            .collect();
        let triangle_count = polys.len();

        for (index, link) in data.off_mesh_links.iter().enumerate() {
            let dangling = |p: Vec3| NavMeshError::DanglingOffMeshLink {
                index,
                x: p.x,
                y: p.y,
                z: p.z,
            };
            if !link.start.is_finite() || !link.end.is_finite() {
                return Err(dangling(if link.start.is_finite() { link.end } else { link.start }));
            }
            let start_tri = containing_triangle(&polys[..triangle_count], link.start)
                .ok_or_else(|| dangling(link.start))?;
            let end_tri = containing_triangle(&polys[..triangle_count], link.end)
                .ok_or_else(|| dangling(link.end))?;

            let link_idx = polys.len();
            let mut adjacent = vec![Adjacent {
                poly: end_tri,
                portal: Portal::Point(link.end),
            }];
            polys[start_tri].adjacent.push(Adjacent {
                poly: link_idx,
                portal: Portal::Point(link.start),
            });
            if link.bidirectional {
                polys[end_tri].adjacent.push(Adjacent {
                    poly: link_idx,
                    portal: Portal::Point(link.end),
                });
                adjacent.push(Adjacent {
                    poly: start_tri,
                    portal: Portal::Point(link.start),
                });
            }
            let (min, max) = bounds(&[link.start, link.end]);
            polys.push(Poly {
                shape: PolyShape::Link(*link),
                area: NavArea::Ground,
                tile: (0, 0),
                center: link.start.lerp(link.end, 0.5),
                min,
                max,
                adjacent,
            });
        }

        let mut mesh = Self {
            polys,
            triangle_count,
            origin: data.origin,
            tile_size: data.tile_size,
            tiles: BTreeMap::new(),
            tile_reach: 0,
        };

        let mut max_extent = 0.0_f32;
        for idx in 0..mesh.polys.len() {
            let anchor = match &mesh.polys[idx].shape {
                PolyShape::Triangle { .. } => mesh.polys[idx].center,
                PolyShape::Link(link) => link.start,
            };
            let tile = mesh.tile_of(anchor);
            let poly = &mut mesh.polys[idx];
            poly.tile = tile;
            max_extent = max_extent
                .max(poly.max.x - poly.min.x)
                .max(poly.max.y - poly.min.y);
            mesh.tiles
                .entry(tile)
                .or_insert_with(|| Tile { loaded: true, polys: Vec::new() })
                .polys
                .push(idx);
        }
        mesh.tile_reach = (max_extent / mesh.tile_size).ceil() as i32;

        tracing::debug!(
            triangles = mesh.triangle_count,
            links = mesh.polys.len() - mesh.triangle_count,
            tiles = mesh.tiles.len(),
            "navmesh built"
        );
        Ok(mesh)
    }

    /// Source form, suitable for serialization.
    pub fn to_data(&self) -> NavMeshData {
        let mut data = NavMeshData {
            origin: self.origin,
            tile_size: self.tile_size,
            ..NavMeshData::default()
        };
        for poly in &self.polys {
            match &poly.shape {
                PolyShape::Triangle { verts, .. } => data.triangles.push(TriangleData {
                    verts: *verts,
                    area: poly.area,
                }),
                PolyShape::Link(link) => data.off_mesh_links.push(*link),
            }
        }
        data
    }

    pub fn poly_count(&self) -> usize {
        self.polys.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn tile_of(&self, pos: Vec3) -> TileCoord {
        (
            ((pos.x - self.origin.x) / self.tile_size).floor() as i32,
            ((pos.y - self.origin.y) / self.tile_size).floor() as i32,
        )
    }

    /// Whether a loaded tile with mesh data covers `pos`.
    pub fn has_tile_at(&self, pos: Vec3) -> bool {
        self.tiles
            .get(&self.tile_of(pos))
            .is_some_and(|tile| tile.loaded)
    }

    /// Returns false when no mesh data exists for the tile.
    pub fn load_tile(&mut self, tile: TileCoord) -> bool {
        self.set_tile_loaded(tile, true)
    }

    pub fn unload_tile(&mut self, tile: TileCoord) -> bool {
        self.set_tile_loaded(tile, false)
    }

    fn set_tile_loaded(&mut self, tile: TileCoord, loaded: bool) -> bool {
        match self.tiles.get_mut(&tile) {
            Some(t) => {
                t.loaded = loaded;
                tracing::debug!(x = tile.0, y = tile.1, loaded, "navmesh tile state changed");
                true
            }
            None => false,
        }
    }

    pub fn is_off_mesh_link(&self, poly: PolyRef) -> bool {
        self.poly(poly).is_some_and(Poly::is_link)
    }

    pub fn triangle(&self, poly: PolyRef) -> Option<[Vec3; 3]> {
        match self.poly(poly)?.shape {
            PolyShape::Triangle { verts, .. } => Some(verts),
            PolyShape::Link(_) => None,
        }
    }

    pub fn area(&self, poly: PolyRef) -> Option<NavArea> {
        self.poly(poly).map(|p| p.area)
    }

    /// Polygon lookup that ignores tile state.
    pub(crate) fn poly(&self, poly: PolyRef) -> Option<&Poly> {
        self.polys.get(poly.index()?)
    }

    pub(crate) fn poly_at(&self, idx: usize) -> &Poly {
        &self.polys[idx]
    }

    pub(crate) fn is_poly_loaded(&self, idx: usize) -> bool {
        self.polys
            .get(idx)
            .and_then(|p| self.tiles.get(&p.tile))
            .is_some_and(|tile| tile.loaded)
    }

    /// Loaded polygons whose bounds may overlap the box, in ascending index order.
    pub(crate) fn polys_in_box(&self, min: Vec3, max: Vec3, out: &mut Vec<usize>) {
        out.clear();
        let (x0, y0) = self.tile_of(min);
        let (x1, y1) = self.tile_of(max);
        let r = self.tile_reach;
        for ((tx, ty), tile) in self.tiles.iter() {
            if !tile.loaded || *tx < x0 - r || *tx > x1 + r || *ty < y0 - r || *ty > y1 + r {
                continue;
            }
            out.extend(tile.polys.iter().copied().filter(|&idx| {
                let p = &self.polys[idx];
                p.min.x <= max.x
                    && p.max.x >= min.x
                    && p.min.y <= max.y
                    && p.max.y >= min.y
                    && p.min.z <= max.z
                    && p.max.z >= min.z
            }));
        }
        out.sort_unstable();
    }
}

#[cfg(feature = "serde")]
impl Serialize for NavMesh {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_data().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for NavMesh {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = NavMeshData::deserialize(deserializer)?;
        NavMesh::from_data(data).map_err(serde::de::Error::custom)
    }
}

fn triangle_adjacency(tris: &[TriangleData]) -> Vec<[Option<usize>; 3]> {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    struct VertexKey(u32, u32, u32);

    impl VertexKey {
        fn from_vec3(p: Vec3) -> Self {
            Self(p.x.to_bits(), p.y.to_bits(), p.z.to_bits())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    struct EdgeKey(VertexKey, VertexKey);

    impl EdgeKey {
        fn new(a: Vec3, b: Vec3) -> Self {
            let ka = VertexKey::from_vec3(a);
            let kb = VertexKey::from_vec3(b);
            if ka <= kb {
                Self(ka, kb)
            } else {
                Self(kb, ka)
            }
        }
    }

    let mut neighbors = vec![[None; 3]; tris.len()];
    let mut edge_map: BTreeMap<EdgeKey, (usize, usize)> = BTreeMap::new();

    for (tri_idx, tri) in tris.iter().enumerate() {
        for (edge_idx, (a, b)) in tri_edges(&tri.verts).into_iter().enumerate() {
            let key = EdgeKey::new(a, b);
            if let Some((other_tri, other_edge)) = edge_map.remove(&key) {
                neighbors[tri_idx][edge_idx] = Some(other_tri);
                neighbors[other_tri][other_edge] = Some(tri_idx);
            } else {
                edge_map.insert(key, (tri_idx, edge_idx));
            }
        }
    }
    neighbors
}

/// Triangle containing `p` in plan view, closest in height when several overlap.
fn containing_triangle(polys: &[Poly], p: Vec3) -> Option<usize> {
    let mut best: Option<(f32, usize)> = None;
    for (idx, poly) in polys.iter().enumerate() {
        let PolyShape::Triangle { verts, .. } = &poly.shape else {
            continue;
        };
        if let Some(h) = triangle_height(p, verts) {
            let dz = (h - p.z).abs();
            if best.map_or(true, |(d, _)| dz < d) {
                best = Some((dz, idx));
            }
        }
    }
    best.map(|(_, idx)| idx)
}

fn bounds(points: &[Vec3]) -> (Vec3, Vec3) {
    let mut min = points[0];
    let mut max = points[0];
    for p in &points[1..] {
        min = Vec3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
        max = Vec3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
    }
    (min, max)
}

pub(crate) fn tri_edges(tri: &[Vec3; 3]) -> [(Vec3, Vec3); 3] {
    [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])]
}

pub(crate) fn tri_centroid(tri: &[Vec3; 3]) -> Vec3 {
    (tri[0] + tri[1] + tri[2]) / 3.0
}

/// Height of the triangle plane at `p`, if `p` lies inside the triangle in plan view.
pub(crate) fn triangle_height(p: Vec3, tri: &[Vec3; 3]) -> Option<f32> {
    const EPS: f32 = 1e-4;
    let [a, b, c] = *tri;
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;
    let denom = v0.cross_2d(v1);
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let u = v2.cross_2d(v1) / denom;
    let v = v0.cross_2d(v2) / denom;
    if u >= -EPS && v >= -EPS && u + v <= 1.0 + EPS {
        Some(a.z + v0.z * u + v1.z * v)
    } else {
        None
    }
}

/// Closest point on a segment in plan view; height is interpolated along the segment.
pub(crate) fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> (f32, Vec3) {
    let ab = b - a;
    let denom = ab.x * ab.x + ab.y * ab.y;
    if denom <= f32::EPSILON {
        return (0.0, a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / denom).clamp(0.0, 1.0);
    (t, a.lerp(b, t))
}

pub(crate) fn closest_point_on_triangle(p: Vec3, tri: &[Vec3; 3]) -> Vec3 {
    if let Some(h) = triangle_height(p, tri) {
        return p.with_z(h);
    }
    let mut best = (f32::MAX, p);
    for (a, b) in tri_edges(tri) {
        let (_, q) = closest_point_on_segment(p, a, b);
        let d2 = p.distance_2d_sq(q);
        if d2 < best.0 {
            best = (d2, q);
        }
    }
    best.1
}

/// Intersection between plan-view segments `p + t*r` and `q + u*s`. Returns `t`.
pub(crate) fn segment_intersection_t(p: Vec3, r: Vec3, q: Vec3, s: Vec3) -> Option<f32> {
    let denom = r.cross_2d(s);
    if denom.abs() <= 1e-8 {
        return None;
    }
    let qp = q - p;
    let t = qp.cross_2d(s) / denom;
    let u = qp.cross_2d(r) / denom;
    if (-1e-6..=1.0 + 1e-6).contains(&t) && (-1e-6..=1.0 + 1e-6).contains(&u) {
        Some(t.clamp(0.0, 1.0))
    } else {
        None
    }
}
