use ai_core::Vec3;
use ai_nav::{NavMesh, NavMeshQuery, PathGenerator, PointAgent, QueryFilter};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn grid_mesh(width: usize, height: usize, cell: f32) -> NavMesh {
    let mut tris = Vec::with_capacity(width * height * 2);
    for y in 0..height {
        for x in 0..width {
            let x0 = x as f32 * cell;
            let y0 = y as f32 * cell;
            let x1 = (x + 1) as f32 * cell;
            let y1 = (y + 1) as f32 * cell;

            tris.push([Vec3::new(x0, y0, 0.0), Vec3::new(x1, y0, 0.0), Vec3::new(x1, y1, 0.0)]);
            tris.push([Vec3::new(x0, y0, 0.0), Vec3::new(x1, y1, 0.0), Vec3::new(x0, y1, 0.0)]);
        }
    }
    NavMesh::from_triangles(tris).expect("grid mesh")
}

fn bench_path_generator(c: &mut Criterion) {
    let mesh = grid_mesh(32, 32, 4.0);
    let start = Vec3::new(1.1, 2.3, 0.0);
    let goal = Vec3::new(120.7, 97.9, 0.0);
    let agent = PointAgent::walker(start);

    let mut group = c.benchmark_group("ai-nav/path_generator");

    let mut query = NavMeshQuery::default();
    let extents = Vec3::new(3.0, 3.0, 5.0);
    let filter = QueryFilter::all();
    let (s, _) = query
        .find_nearest_poly(&mesh, start, extents, &filter)
        .expect("start poly");
    let (g, _) = query
        .find_nearest_poly(&mesh, goal, extents, &filter)
        .expect("goal poly");
    group.bench_function("find_path_reuse", |b| {
        b.iter(|| {
            let corridor = query
                .find_path(&mesh, s, g, start, goal, &filter, 256)
                .expect("corridor");
            black_box(corridor.polys.len());
        })
    });

    group.bench_function("smooth_path", |b| {
        let mut path = PathGenerator::new(&agent);
        b.iter(|| {
            path.clear();
            path.calculate_path(&agent, Some(&mesh), goal, false);
            black_box(path.path().len());
        })
    });

    group.bench_function("straight_path", |b| {
        let mut path = PathGenerator::new(&agent);
        path.set_use_straight_path(true);
        b.iter(|| {
            path.clear();
            path.calculate_path(&agent, Some(&mesh), goal, false);
            black_box(path.path().len());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_path_generator);
criterion_main!(benches);
