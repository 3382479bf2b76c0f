//! `motion` - path queries and motion scenario playback.
//!
//! - `motion path` - run the path generator once over a navmesh file
//! - `motion simulate` - play a YAML scenario and print every event as a JSON line

mod scenario;

use std::io::Write;
use std::path::{Path, PathBuf};

use ai_core::Vec3;
use ai_motion::MotionConfig;
use ai_nav::{NavMesh, PathGenerator, PointAgent};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::scenario::Scenario;

#[derive(Parser)]
#[command(name = "motion")]
#[command(about = "Navmesh paths and movement generator playback", version)]
struct Cli {
    /// Motion config (YAML). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one path over a navmesh
    Path {
        /// Navmesh file (JSON or YAML)
        #[arg(long)]
        mesh: PathBuf,

        /// Start position as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        from: Vec3,

        /// Destination as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        to: Vec3,

        /// Return corridor corners instead of a smoothed path
        #[arg(long)]
        straight: bool,

        /// Single raycast along the surface
        #[arg(long)]
        raycast: bool,

        /// Accept the requested destination even if the mesh ends short of it
        #[arg(long)]
        force: bool,

        /// Cut the path after this many yards
        #[arg(long)]
        limit: Option<f32>,
    },

    /// Play a scenario file
    Simulate {
        #[arg(long)]
        scenario: PathBuf,
    },
}

#[derive(Serialize)]
struct PathReport<'a> {
    ok: bool,
    path_type: String,
    length: f32,
    actual_end: Vec3,
    points: &'a [Vec3],
}

fn parse_vec3(text: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z, got {text:?}"));
    };
    let coord = |s: &str| s.parse::<f32>().map_err(|e| format!("bad coordinate {s:?}: {e}"));
    Ok(Vec3::new(coord(x)?, coord(y)?, coord(z)?))
}

pub(crate) fn load_mesh(path: &Path) -> Result<NavMesh> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read navmesh {}", path.display()))?;
    let parse_failed = || format!("failed to parse navmesh {}", path.display());
    let mesh = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text).with_context(parse_failed)?
    } else {
        serde_yaml::from_str(&text).with_context(parse_failed)?
    };
    Ok(mesh)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    let subscriber = fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = match &cli.config {
        Some(path) => MotionConfig::load(path)?,
        None => MotionConfig::default(),
    };

    match cli.command {
        Commands::Path { mesh, from, to, straight, raycast, force, limit } => {
            run_path(&config, &mesh, from, to, straight, raycast, force, limit)
        }
        Commands::Simulate { scenario } => run_simulation(config, &scenario),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_path(
    config: &MotionConfig,
    mesh_path: &Path,
    from: Vec3,
    to: Vec3,
    straight: bool,
    raycast: bool,
    force: bool,
    limit: Option<f32>,
) -> Result<()> {
    let mesh = load_mesh(mesh_path)?;
    tracing::info!(polys = mesh.poly_count(), mesh = %mesh_path.display(), "loaded navmesh");

    let agent = PointAgent::walker(from);
    let mut path = PathGenerator::with_config(&agent, config.path);
    path.set_use_straight_path(straight);
    path.set_use_raycast(raycast);
    if let Some(limit) = limit {
        path.set_path_length_limit(limit);
    }
    let ok = path.calculate_path(&agent, Some(&mesh), to, force);
    tracing::debug!(ok, path_type = ?path.path_type(), points = path.path().len(), "path computed");

    let report = PathReport {
        ok,
        path_type: format!("{:?}", path.path_type()),
        length: path.path_length(),
        actual_end: path.actual_end_position(),
        points: path.path(),
    };
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &report).context("failed to write path")?;
    println!();
    Ok(())
}

fn run_simulation(config: MotionConfig, scenario_path: &Path) -> Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let base_dir = scenario_path.parent().unwrap_or_else(|| Path::new("."));
    tracing::info!(
        units = scenario.units.len(),
        steps = scenario.steps,
        step_ms = scenario.step_ms,
        "starting scenario"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = scenario.run(base_dir, config, |event| {
        serde_json::to_writer(&mut out, &event).context("failed to write event")?;
        writeln!(out).context("failed to write event")?;
        Ok(())
    })?;

    for unit in &summary {
        tracing::info!(
            unit = unit.id,
            x = unit.position.pos.x,
            y = unit.position.pos.y,
            z = unit.position.pos.z,
            generator = unit.generator.as_deref().unwrap_or("none"),
            "final state"
        );
    }
    Ok(())
}
