use ai_core::Vec3;
use ai_nav::{
    AgentCapabilities, NavMesh, NavMeshBuilder, NavMeshQuery, OffMeshLink, PathGenerator, PathType,
    PointAgent, QueryFilter,
};

const CELL: f32 = 4.0;

fn grid_mesh(cells: i32, tile_size: f32, keep: impl Fn(i32, i32) -> bool) -> NavMesh {
    let v = |i: i32, j: i32| Vec3::new(i as f32 * CELL, j as f32 * CELL, 0.0);
    let mut tris = Vec::new();
    for i in 0..cells {
        for j in 0..cells {
            if keep(i, j) {
                tris.push([v(i, j), v(i + 1, j), v(i + 1, j + 1)]);
                tris.push([v(i, j), v(i + 1, j + 1), v(i, j + 1)]);
            }
        }
    }
    NavMeshBuilder::new()
        .tile_size(tile_size)
        .ground_triangles(tris)
        .build()
        .expect("valid grid mesh")
}

fn open_grid() -> NavMesh {
    grid_mesh(10, 533.333, |_, _| true)
}

/// 40x40 square with the upper-left block removed: a corridor along the bottom and up
/// the right side.
fn l_grid() -> NavMesh {
    grid_mesh(10, 533.333, |i, j| j < 2 || i >= 8)
}

fn flyer(position: Vec3) -> PointAgent {
    PointAgent {
        position,
        capabilities: AgentCapabilities {
            can_fly: true,
            ..AgentCapabilities::walker()
        },
    }
}

fn on_mesh(mesh: &NavMesh, p: Vec3) -> bool {
    let mut query = NavMeshQuery::default();
    query
        .find_nearest_poly(mesh, p, Vec3::new(3.0, 3.0, 5.0), &QueryFilter::all())
        .is_some_and(|(_, closest)| closest.distance(p) < 1e-3)
}

#[test]
fn no_mesh_builds_a_direct_shortcut() {
    let start = Vec3::new(1.0, 2.0, 3.0);
    let dest = Vec3::new(10.0, -4.0, 3.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, None, dest, false));
    assert_eq!(path.path_type(), PathType::NORMAL | PathType::NOT_USING_PATH);
    assert_eq!(path.path(), &[start, dest]);
    assert!(path.corridor().is_empty());
}

#[test]
fn out_of_map_coordinates_are_rejected() {
    let mesh = open_grid();
    let agent = PointAgent::walker(Vec3::new(2.0, 3.0, 0.0));
    let mut path = PathGenerator::new(&agent);

    assert!(!path.calculate_path(&agent, Some(&mesh), Vec3::new(20_000.0, 0.0, 0.0), false));
    assert!(!path.calculate_path(&agent, Some(&mesh), Vec3::new(f32::NAN, 0.0, 0.0), false));
    assert_eq!(path.path_type(), PathType::BLANK);
}

#[test]
fn same_polygon_is_a_two_point_path() {
    let mesh = open_grid();
    let start = Vec3::new(1.0, 0.5, 0.0);
    let dest = Vec3::new(3.0, 0.7, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    assert_eq!(path.path_type(), PathType::NORMAL);
    assert_eq!(path.path(), &[start, dest]);
    assert_eq!(path.corridor().len(), 1);
}

#[test]
fn smoothed_path_follows_open_ground() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(37.0, 30.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    assert_eq!(path.path_type(), PathType::NORMAL);

    let points = path.path();
    assert_eq!(points[0], start);
    let last = *points.last().expect("points");
    assert!(last.distance(dest) < 0.31, "ended at {last:?}");
    assert_eq!(path.actual_end_position(), last);

    for w in points.windows(2) {
        assert!(w[0].distance(w[1]) <= 4.0 + 1e-3);
    }
    let direct = start.distance(dest);
    assert!((path.path_length() - direct).abs() < 0.35);
}

#[test]
fn smoothed_diagonals_over_a_large_grid_stay_normal() {
    let mesh = grid_mesh(20, 533.333, |_, _| true);
    let routes = [
        ((10.0, 2.0), (60.0, 70.0)),
        // from a shared vertex, and along the cell diagonals
        ((4.0, 4.0), (76.0, 40.0)),
        ((2.0, 2.0), (58.0, 58.0)),
        // straight through a row of vertices
        ((1.0, 47.0), (47.0, 1.0)),
    ];

    for ((sx, sy), (dx, dy)) in routes {
        let start = Vec3::new(sx, sy, 0.0);
        let dest = Vec3::new(dx, dy, 0.0);
        let agent = PointAgent::walker(start);
        let mut path = PathGenerator::new(&agent);

        assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
        assert_eq!(path.path_type(), PathType::NORMAL, "{start:?} -> {dest:?}");

        let last = *path.path().last().expect("points");
        assert!(last.distance(dest) < 0.31, "{start:?} -> {dest:?} ended at {last:?}");
        for p in path.path() {
            assert!(on_mesh(&mesh, *p), "{p:?} is off the mesh");
        }
        let direct = start.distance(dest);
        let length = path.path_length();
        assert!(
            length > direct - 0.35 && length < direct * 1.02 + 0.35,
            "{start:?} -> {dest:?}: length {length}, direct {direct}"
        );
    }
}

#[test]
fn smoothed_path_crosses_off_mesh_links() {
    let square = |x0: f32| {
        let v = |x: f32, y: f32| Vec3::new(x, y, 0.0);
        [
            [v(x0, 0.0), v(x0 + 4.0, 0.0), v(x0 + 4.0, 4.0)],
            [v(x0, 0.0), v(x0 + 4.0, 4.0), v(x0, 4.0)],
        ]
    };
    let mesh = NavMeshBuilder::new()
        .ground_triangles(square(0.0))
        .ground_triangles(square(10.0))
        .off_mesh_link(OffMeshLink {
            start: Vec3::new(3.5, 2.0, 0.0),
            end: Vec3::new(10.5, 2.0, 0.0),
            bidirectional: false,
        })
        .build()
        .expect("valid mesh");
    let start = Vec3::new(1.0, 1.5, 0.0);
    let dest = Vec3::new(13.0, 2.5, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    assert_eq!(path.path_type(), PathType::NORMAL);

    let points = path.path();
    let near = |a: Vec3, b: Vec3| a.distance(b) < 1e-4;
    let entrance = points
        .iter()
        .position(|&p| near(p, Vec3::new(3.5, 2.0, 0.0)))
        .expect("path reaches the link entrance");
    assert!(near(points[entrance + 1], Vec3::new(10.5, 2.0, 0.0)));
    assert!(near(*points.last().expect("points"), dest));
    // nothing is walked across the gap
    assert!(points.iter().all(|p| p.x <= 4.0 || p.x >= 10.0), "{points:?}");
}

#[test]
fn smoothed_path_bends_around_the_hole() {
    let mesh = l_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(37.0, 38.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    assert_eq!(path.path_type(), PathType::NORMAL);

    let corner = Vec3::new(32.0, 8.0, 0.0);
    let geodesic = start.distance(corner) + corner.distance(dest);
    let length = path.path_length();
    assert!(length > geodesic * 0.97 && length < geodesic * 1.25, "length {length}");
    for p in path.path() {
        assert!(on_mesh(&mesh, *p), "{p:?} is off the mesh");
    }
}

#[test]
fn straight_path_mode_returns_corners() {
    let mesh = l_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(37.0, 38.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);
    path.set_use_straight_path(true);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    assert_eq!(path.path_type(), PathType::NORMAL);
    assert_eq!(path.path(), &[start, Vec3::new(32.0, 8.0, 0.0), dest]);
}

#[test]
fn far_destination_is_clamped_and_flagged() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(21.0, 18.0, 30.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    assert_eq!(
        path.path_type(),
        PathType::INCOMPLETE | PathType::FARFROMPOLY_END
    );
    let end = path.actual_end_position();
    assert!(end.distance(Vec3::new(21.0, 18.0, 0.0)) < 0.31);
    assert_eq!(path.end_position(), dest);
}

#[test]
fn flying_units_shortcut_far_destinations() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(21.0, 18.0, 30.0);
    let agent = flyer(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    assert_eq!(
        path.path_type(),
        PathType::NORMAL | PathType::NOT_USING_PATH | PathType::FARFROMPOLY_END
    );
    assert_eq!(path.path(), &[start, dest]);
}

#[test]
fn missing_polygons_yield_nopath_unless_flying() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(80.0, 81.0, 0.0);

    let walker = PointAgent::walker(start);
    let mut path = PathGenerator::new(&walker);
    assert!(path.calculate_path(&walker, Some(&mesh), dest, false));
    assert_eq!(path.path_type(), PathType::NOPATH);
    assert_eq!(path.path(), &[start, dest]);

    let bird = flyer(start);
    let mut path = PathGenerator::new(&bird);
    assert!(path.calculate_path(&bird, Some(&mesh), dest, false));
    assert_eq!(path.path_type(), PathType::NORMAL | PathType::NOT_USING_PATH);
}

#[test]
fn force_destination_shortcuts_when_far_off() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(21.0, 18.0, 30.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, true));
    assert_eq!(path.path_type(), PathType::NORMAL | PathType::NOT_USING_PATH);
    assert_eq!(path.path(), &[start, dest]);
    assert_eq!(path.actual_end_position(), dest);
}

#[test]
fn force_destination_snaps_the_last_point_when_close() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(41.5, 21.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, true));
    assert_eq!(path.path_type(), PathType::NORMAL | PathType::NOT_USING_PATH);
    assert!(path.path().len() > 2);
    assert_eq!(path.path().last(), Some(&dest));
    assert_eq!(path.actual_end_position(), dest);
}

#[test]
fn raycast_mode_stops_at_walls() {
    let mesh = l_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);
    path.set_use_raycast(true);

    assert!(path.calculate_path(&agent, Some(&mesh), Vec3::new(37.0, 38.0, 0.0), false));
    assert_eq!(path.path_type(), PathType::INCOMPLETE);
    assert_eq!(path.path().len(), 2);
    let hit = path.path()[1];
    assert!(hit.y < 8.0 && hit.y > 7.5, "hit at {hit:?}");
    assert!(on_mesh(&mesh, hit));

    let open = open_grid();
    let dest = Vec3::new(37.0, 30.0, 0.0);
    let mut clear = PathGenerator::new(&agent);
    clear.set_use_raycast(true);
    assert!(clear.calculate_path(&agent, Some(&open), dest, false));
    assert_eq!(clear.path_type(), PathType::NORMAL);
    assert_eq!(clear.path(), &[start, dest]);
}

#[test]
fn unreachable_destination_is_incomplete() {
    let mesh = grid_mesh(10, 533.333, |i, _| i < 4 || i >= 6);
    let start = Vec3::new(2.0, 3.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);

    assert!(path.calculate_path(&agent, Some(&mesh), Vec3::new(30.0, 13.0, 0.0), false));
    assert_eq!(path.path_type(), PathType::INCOMPLETE);
    let end = path.actual_end_position();
    assert!(end.x <= 16.0 + 1e-3, "ended at {end:?}");
}

#[test]
fn path_length_limit_reports_short() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(37.0, 30.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);
    path.set_path_length_limit(8.0);

    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    assert_eq!(path.path_type(), PathType::SHORT);
    assert_eq!(path.path(), &[start, dest]);
}

#[test]
fn corridor_is_reused_when_start_moves_along_it() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(37.0, 30.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);
    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    let first = path.corridor().to_vec();

    let moved = PointAgent::walker(path.path()[3]);
    assert!(path.calculate_path(&moved, Some(&mesh), dest, false));
    let second = path.corridor().to_vec();
    assert!(second.len() < first.len());
    assert!(first.windows(second.len()).any(|w| w == second.as_slice()));
    assert_eq!(path.path_type(), PathType::NORMAL);
}

#[test]
fn corridor_prefix_is_kept_when_the_destination_moves() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);
    assert!(path.calculate_path(&agent, Some(&mesh), Vec3::new(37.0, 30.0, 0.0), false));
    let first = path.corridor().to_vec();

    // Start still on the old corridor, destination well off it.
    let dest = Vec3::new(37.0, 10.0, 0.0);
    let moved = PointAgent::walker(path.path()[3]);
    assert!(path.calculate_path(&moved, Some(&mesh), dest, false));
    let second = path.corridor().to_vec();
    assert_eq!(path.path_type(), PathType::NORMAL);

    let s = first
        .iter()
        .position(|&p| p == second[0])
        .expect("new corridor starts on the old one");
    let keep = ((first.len() - s) as f32 * 0.8 + 0.5) as usize;
    assert!(keep >= 2);
    assert_eq!(&second[..keep], &first[s..s + keep]);

    let mut query = NavMeshQuery::default();
    let (end_poly, _) = query
        .find_nearest_poly(&mesh, dest, Vec3::new(3.0, 3.0, 5.0), &QueryFilter::all())
        .expect("poly under the destination");
    assert_eq!(second.last(), Some(&end_poly));
    let last = *path.path().last().expect("points");
    assert!(last.distance(dest) < 0.31, "ended at {last:?}");
}

#[test]
fn unloaded_tile_falls_back_to_direct_path() {
    let mut mesh = grid_mesh(10, 16.0, |_, _| true);
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(37.0, 30.0, 0.0);
    assert!(mesh.unload_tile(mesh.tile_of(dest)));

    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);
    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    assert_eq!(path.path_type(), PathType::NORMAL | PathType::NOT_USING_PATH);
    assert_eq!(path.path(), &[start, dest]);
}

#[test]
fn shorten_path_stops_at_distance() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(37.0, 30.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);
    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    let original = path.path().to_vec();

    path.shorten_path_until_dist(&agent, dest, 10.0);
    let shortened = path.path();
    let last = *shortened.last().expect("points");
    let d = last.distance(dest);
    assert!(d >= 10.0 - 1e-3 && d < 10.01, "terminal point {d} from target");
    let n = shortened.len();
    assert!(n < original.len());
    assert_eq!(&shortened[..n - 1], &original[..n - 1]);
}

#[test]
fn shorten_with_long_distance_collapses_to_two_points() {
    let mesh = open_grid();
    let start = Vec3::new(2.0, 3.0, 0.0);
    let dest = Vec3::new(37.0, 30.0, 0.0);
    let agent = PointAgent::walker(start);
    let mut path = PathGenerator::new(&agent);
    assert!(path.calculate_path(&agent, Some(&mesh), dest, false));
    let original = path.path().to_vec();

    path.shorten_path_until_dist(&agent, dest, 1_000.0);
    assert_eq!(path.path(), &original[..2]);
}
