use ai_core::Vec3;
use ai_nav::{
    NavArea, NavMesh, NavMeshBuilder, NavMeshError, NavMeshQuery, NavTerrain, OffMeshLink,
    PolyRef, QueryFilter, StraightPathFlags,
};

fn v(x: f32, y: f32) -> Vec3 {
    Vec3::new(x, y, 0.0)
}

fn l_shape_mesh() -> NavMesh {
    NavMesh::from_triangles(vec![
        // Lower strip.
        [v(0.0, 0.0), v(4.0, 0.0), v(3.0, 1.0)],
        [v(0.0, 0.0), v(3.0, 1.0), v(0.0, 1.0)],
        // Right column.
        [v(4.0, 0.0), v(4.0, 4.0), v(3.0, 4.0)],
        [v(4.0, 0.0), v(3.0, 4.0), v(3.0, 1.0)],
    ])
    .expect("valid mesh")
}

fn square(x0: f32, y0: f32, size: f32) -> [[Vec3; 3]; 2] {
    let (x1, y1) = (x0 + size, y0 + size);
    [
        [v(x0, y0), v(x1, y0), v(x1, y1)],
        [v(x0, y0), v(x1, y1), v(x0, y1)],
    ]
}

fn nearest(mesh: &NavMesh, query: &mut NavMeshQuery, p: Vec3) -> PolyRef {
    query
        .find_nearest_poly(mesh, p, Vec3::new(3.0, 3.0, 5.0), &QueryFilter::all())
        .expect("poly near point")
        .0
}

#[test]
fn builder_rejects_invalid_input() {
    assert_eq!(NavMesh::from_triangles(Vec::new()).unwrap_err(), NavMeshError::Empty);

    let err = NavMesh::from_triangles(vec![[v(0.0, 0.0), v(f32::NAN, 0.0), v(0.0, 1.0)]])
        .unwrap_err();
    assert_eq!(err, NavMeshError::NonFiniteVertex { index: 0 });

    let err = NavMesh::from_triangles(vec![
        [v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)],
        [v(0.0, 0.0), v(1.0, 1.0), v(2.0, 2.0)],
    ])
    .unwrap_err();
    assert_eq!(err, NavMeshError::DegenerateTriangle { index: 1 });

    let err = NavMeshBuilder::new()
        .ground_triangles(square(0.0, 0.0, 4.0))
        .off_mesh_link(OffMeshLink {
            start: v(1.0, 1.0),
            end: v(50.0, 50.0),
            bidirectional: false,
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, NavMeshError::DanglingOffMeshLink { index: 0, .. }));

    let err = NavMeshBuilder::new()
        .tile_size(0.0)
        .ground_triangles(square(0.0, 0.0, 4.0))
        .build()
        .unwrap_err();
    assert_eq!(err, NavMeshError::InvalidTileSize(0.0));
}

#[test]
fn nearest_poly_clamps_points_onto_the_mesh() {
    let mesh = l_shape_mesh();
    let mut query = NavMeshQuery::default();

    let (poly, closest) = query
        .find_nearest_poly(
            &mesh,
            Vec3::new(1.0, 0.5, 2.0),
            Vec3::new(3.0, 3.0, 5.0),
            &QueryFilter::all(),
        )
        .expect("point above the mesh");
    assert!(poly.is_valid());
    assert_eq!(closest, Vec3::new(1.0, 0.5, 0.0));

    let (_, closest) = query
        .find_nearest_poly(&mesh, v(1.0, 2.0), Vec3::new(3.0, 3.0, 5.0), &QueryFilter::all())
        .expect("point next to the lower strip");
    assert!((closest.y - 1.0).abs() < 1e-5);
    assert!((closest.x - 1.0).abs() < 1e-5);

    assert!(query
        .find_nearest_poly(&mesh, v(20.0, 20.0), Vec3::new(3.0, 3.0, 5.0), &QueryFilter::all())
        .is_none());
}

#[test]
fn straight_path_turns_at_the_inner_corner() {
    let mesh = l_shape_mesh();
    let mut query = NavMeshQuery::default();
    let start = v(0.2, 0.2);
    let goal = v(3.8, 3.8);
    let start_ref = nearest(&mesh, &mut query, start);
    let goal_ref = nearest(&mesh, &mut query, goal);

    let corridor = query
        .find_path(&mesh, start_ref, goal_ref, start, goal, &QueryFilter::all(), 74)
        .expect("corridor");
    assert!(!corridor.partial);
    assert_eq!(corridor.polys.first(), Some(&start_ref));
    assert_eq!(corridor.polys.last(), Some(&goal_ref));

    let points = query
        .find_straight_path(&mesh, start, goal, &corridor.polys, 16)
        .expect("straight path");
    let positions: Vec<Vec3> = points.iter().map(|p| p.pos).collect();
    assert_eq!(positions, vec![start, v(3.0, 1.0), goal]);
    assert!(points[0].flags.contains(StraightPathFlags::START));
    assert!(points[2].flags.contains(StraightPathFlags::END));
    assert!(!points[1].flags.contains(StraightPathFlags::OFFMESH));
}

#[test]
fn corridor_search_is_deterministic() {
    let mesh = l_shape_mesh();
    let mut a = NavMeshQuery::default();
    let mut b = NavMeshQuery::default();
    let start = v(0.2, 0.5);
    let goal = v(3.5, 3.0);
    let (s, g) = (nearest(&mesh, &mut a, start), nearest(&mesh, &mut a, goal));

    let first = a.find_path(&mesh, s, g, start, goal, &QueryFilter::all(), 74);
    // Reused scratch buffers must not leak into the next search.
    let again = a.find_path(&mesh, s, g, start, goal, &QueryFilter::all(), 74);
    let fresh = b.find_path(&mesh, s, g, start, goal, &QueryFilter::all(), 74);
    assert_eq!(first, again);
    assert_eq!(first, fresh);
}

#[test]
fn unreachable_goal_yields_partial_corridor() {
    let mut tris = square(0.0, 0.0, 4.0).to_vec();
    tris.extend(square(10.0, 0.0, 4.0));
    let mesh = NavMesh::from_triangles(tris).expect("valid mesh");
    let mut query = NavMeshQuery::default();
    let start = v(1.0, 2.0);
    let goal = v(12.0, 2.0);
    let (s, g) = (nearest(&mesh, &mut query, start), nearest(&mesh, &mut query, goal));

    let corridor = query
        .find_path(&mesh, s, g, start, goal, &QueryFilter::all(), 74)
        .expect("partial corridor");
    assert!(corridor.partial);
    assert_ne!(corridor.polys.last(), Some(&g));
}

#[test]
fn filter_excludes_areas() {
    let [a, b] = square(0.0, 0.0, 4.0);
    let mesh = NavMeshBuilder::new()
        .triangle(a, NavArea::Ground)
        .triangle(b, NavArea::Water)
        .build()
        .expect("valid mesh");
    let mut query = NavMeshQuery::default();
    let ground_only = QueryFilter::new(NavTerrain::GROUND, NavTerrain::empty());

    // (1, 3) lies in the water triangle; the nearest ground point is on the diagonal.
    let (_, closest) = query
        .find_nearest_poly(&mesh, v(1.0, 3.0), Vec3::new(3.0, 3.0, 5.0), &ground_only)
        .expect("ground poly");
    assert!((closest.x - 2.0).abs() < 1e-4 && (closest.y - 2.0).abs() < 1e-4);
    assert_eq!(mesh.area(PolyRef::from_index(1)), Some(NavArea::Water));
}

#[test]
fn raycast_reports_the_wall_fraction() {
    let mesh = l_shape_mesh();
    let mut query = NavMeshQuery::default();
    let start = v(0.2, 0.2);
    let goal = v(3.8, 3.8);
    let s = nearest(&mesh, &mut query, start);

    let hit = query
        .raycast(&mesh, s, start, goal, &QueryFilter::all(), 74)
        .expect("raycast");
    assert!(!hit.is_clear());
    let point = start.lerp(goal, hit.t);
    assert!((point.x - 1.0).abs() < 1e-3);
    assert!((point.y - 1.0).abs() < 1e-3);

    let clear = query
        .raycast(&mesh, s, start, v(3.2, 0.4), &QueryFilter::all(), 74)
        .expect("raycast");
    assert!(clear.is_clear());
    assert!(clear.corridor.len() >= 2);
}

#[test]
fn move_along_surface_slides_on_walls() {
    let mesh = l_shape_mesh();
    let mut query = NavMeshQuery::default();
    let start = v(0.5, 0.5);
    let s = nearest(&mesh, &mut query, start);

    let (pos, visited) = query
        .move_along_surface(&mesh, s, start, v(0.5, 3.0), &QueryFilter::all(), 16)
        .expect("move");
    assert!((pos.x - 0.5).abs() < 1e-4);
    assert!((pos.y - 1.0).abs() < 1e-4);
    assert_eq!(visited.first(), Some(&s));

    let (pos, visited) = query
        .move_along_surface(&mesh, s, start, v(3.4, 0.9), &QueryFilter::all(), 16)
        .expect("move");
    assert!((pos.x - 3.4).abs() < 1e-4 && (pos.y - 0.9).abs() < 1e-4);
    assert_eq!(visited.len(), 3);
}

/// `cells` x `cells` squares of side 4, each split along its rising diagonal.
fn grid(cells: u8) -> NavMesh {
    let mut tris = Vec::new();
    for i in 0..cells {
        for j in 0..cells {
            tris.extend(square(f32::from(i) * 4.0, f32::from(j) * 4.0, 4.0));
        }
    }
    NavMesh::from_triangles(tris).expect("valid grid")
}

#[test]
fn move_along_surface_leaves_a_vertex_in_any_direction() {
    let mesh = grid(4);
    let mut query = NavMeshQuery::default();
    let corner = v(4.0, 4.0);
    let s = nearest(&mesh, &mut query, corner);

    for target in [v(6.0, 1.0), v(1.0, 6.5), v(2.5, 2.0), v(7.0, 7.5), v(0.5, 5.0)] {
        let (pos, visited) = query
            .move_along_surface(&mesh, s, corner, target, &QueryFilter::all(), 48)
            .expect("move");
        assert!(pos.distance(target) < 1e-4, "stuck at {pos:?} heading for {target:?}");
        assert_eq!(visited.first(), Some(&s));
        assert_eq!(visited.last(), Some(&nearest(&mesh, &mut query, target)));
    }
}

#[test]
fn rays_pass_through_mesh_vertices() {
    let mesh = grid(4);
    let mut query = NavMeshQuery::default();
    // crosses the vertices (4, 12), (8, 8) and (12, 4) head on
    let start = v(1.0, 15.0);
    let end = v(15.0, 1.0);
    let s = nearest(&mesh, &mut query, start);

    let hit = query
        .raycast(&mesh, s, start, end, &QueryFilter::all(), 74)
        .expect("raycast");
    assert!(hit.is_clear(), "stopped at t = {}", hit.t);
    assert_eq!(hit.corridor.last(), Some(&nearest(&mesh, &mut query, end)));
    for pair in hit.corridor.windows(2) {
        let a = mesh.triangle(pair[0]).expect("triangle");
        let b = mesh.triangle(pair[1]).expect("triangle");
        let shared = a.iter().filter(|p| b.contains(p)).count();
        assert_eq!(shared, 2, "corridor jumps between {pair:?}");
    }

    let (pos, _) = query
        .move_along_surface(&mesh, s, start, end, &QueryFilter::all(), 64)
        .expect("move");
    assert!(pos.distance(end) < 1e-4);
}

#[test]
fn unloaded_tiles_hide_their_polygons() {
    let mut tris = square(0.0, 0.0, 8.0).to_vec();
    tris.extend(square(20.0, 0.0, 8.0));
    let mut mesh = NavMeshBuilder::new()
        .tile_size(16.0)
        .ground_triangles(tris)
        .build()
        .expect("valid mesh");
    let mut query = NavMeshQuery::default();
    let far = v(24.0, 4.0);

    assert!(mesh.has_tile_at(far));
    assert!(mesh.unload_tile(mesh.tile_of(far)));
    assert!(!mesh.has_tile_at(far));
    assert!(query
        .find_nearest_poly(&mesh, far, Vec3::new(3.0, 3.0, 5.0), &QueryFilter::all())
        .is_none());
    assert!(mesh.has_tile_at(v(4.0, 4.0)));

    assert!(mesh.load_tile(mesh.tile_of(far)));
    assert!(mesh.has_tile_at(far));
    assert!(!mesh.load_tile((40, 40)));
}

#[test]
fn off_mesh_links_join_islands() {
    let mut tris = square(0.0, 0.0, 4.0).to_vec();
    tris.extend(square(10.0, 0.0, 4.0));
    let mesh = NavMeshBuilder::new()
        .ground_triangles(tris)
        .off_mesh_link(OffMeshLink {
            start: v(3.5, 2.0),
            end: v(10.5, 2.0),
            bidirectional: false,
        })
        .build()
        .expect("valid mesh");
    let mut query = NavMeshQuery::default();
    let start = v(1.0, 1.5);
    let goal = v(13.0, 2.5);
    let (s, g) = (nearest(&mesh, &mut query, start), nearest(&mesh, &mut query, goal));

    let corridor = query
        .find_path(&mesh, s, g, start, goal, &QueryFilter::all(), 74)
        .expect("corridor");
    assert!(!corridor.partial);
    let link_at = corridor
        .polys
        .iter()
        .position(|&p| mesh.is_off_mesh_link(p))
        .expect("corridor crosses the link");

    let points = query
        .find_straight_path(&mesh, start, goal, &corridor.polys, 16)
        .expect("straight path");
    let entrance = points
        .iter()
        .find(|p| p.flags.contains(StraightPathFlags::OFFMESH))
        .expect("link entrance");
    assert_eq!(entrance.pos, v(3.5, 2.0));
    assert!(points.iter().any(|p| p.pos == v(10.5, 2.0)));
    assert_eq!(points.last().map(|p| p.pos), Some(goal));

    let prev = corridor.polys[link_at - 1];
    let link = corridor.polys[link_at];
    assert_eq!(
        query.off_mesh_link_endpoints(&mesh, prev, link),
        Some((v(3.5, 2.0), v(10.5, 2.0)))
    );

    // One-way: no route back.
    let back = query
        .find_path(&mesh, g, s, goal, start, &QueryFilter::all(), 74)
        .expect("partial corridor");
    assert!(back.partial);
}
