//! YAML scenario files for `motion simulate`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ai_core::{Position, TickContext, Vec3};
use ai_motion::{
    spline_chain, ChaseAngle, ChaseMovementGenerator, ChaseRange, ConfusedMovementGenerator,
    DistractMovementGenerator, FleeingMovementGenerator, FlightPathMovementGenerator,
    FollowMovementGenerator, HomeMovementGenerator, IdleMovementGenerator, MotionConfig,
    MotionDriver, MotionGenerator, PointMovementGenerator, RandomMoveKind, RandomMovementGenerator,
    RotateDirection, RotateMovementGenerator, SimEvent, SimUnit, SimWorld, SplineChainLink,
    SplineChainMovementGenerator, TaxiRoute, TaxiSegment, WaypointMovementGenerator, WaypointPath,
};
use ai_nav::{AgentCapabilities, NavMesh};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Navmesh file, relative to the scenario file.
    #[serde(default)]
    pub mesh: Option<PathBuf>,
    #[serde(default)]
    pub ground_z: f32,
    #[serde(default = "default_step_ms")]
    pub step_ms: u32,
    pub steps: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub walls: Vec<[Vec3; 2]>,
    #[serde(default)]
    pub waypoint_paths: Vec<WaypointPath>,
    pub units: Vec<UnitSpec>,
}

fn default_step_ms() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitSpec {
    pub id: u64,
    pub position: Vec3,
    #[serde(default)]
    pub orientation: f32,
    #[serde(default)]
    pub run_speed: Option<f32>,
    #[serde(default)]
    pub flying: bool,
    #[serde(default)]
    pub victim: Option<u64>,
    #[serde(default)]
    pub home: Option<Position>,
    #[serde(default)]
    pub generator: Option<GeneratorSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum GeneratorSpec {
    Idle,
    Point {
        #[serde(default)]
        id: u32,
        destination: Vec3,
        #[serde(default = "yes")]
        generate_path: bool,
        #[serde(default)]
        speed: Option<f32>,
    },
    Random {
        distance: f32,
        #[serde(default)]
        move_kind: RandomMoveKind,
    },
    Waypoint {
        path_id: u32,
        #[serde(default = "yes")]
        repeating: bool,
        #[serde(default)]
        backwards: bool,
    },
    Chase {
        target: u64,
        #[serde(default)]
        range: Option<ChaseRange>,
        #[serde(default)]
        angle: Option<ChaseAngle>,
    },
    Follow {
        target: u64,
        range: f32,
        angle: ChaseAngle,
        #[serde(default)]
        duration_ms: Option<u32>,
    },
    Flee {
        #[serde(default)]
        threat: Option<u64>,
        #[serde(default)]
        duration_ms: Option<u32>,
    },
    Confused,
    Home,
    Rotate {
        #[serde(default)]
        id: u32,
        duration_ms: u32,
        direction: RotateDirection,
    },
    Distract {
        timer_ms: u32,
        orientation: f32,
    },
    SplineChain {
        #[serde(default)]
        id: u32,
        links: Vec<SplineChainLink>,
        #[serde(default)]
        walk: bool,
    },
    Flight {
        segments: Vec<TaxiSegment>,
    },
}

fn yes() -> bool {
    true
}

impl GeneratorSpec {
    fn build(&self, config: &MotionConfig) -> Result<MotionGenerator<u64>> {
        let generator = match self {
            Self::Idle => IdleMovementGenerator::new().into(),
            Self::Point { id, destination, generate_path, speed } => {
                let mut point = PointMovementGenerator::new(*id, *destination, *generate_path);
                if let Some(speed) = speed {
                    point = point.with_speed(*speed);
                }
                point.into()
            }
            Self::Random { distance, move_kind } => {
                RandomMovementGenerator::new(*distance).with_move_kind(*move_kind).into()
            }
            Self::Waypoint { path_id, repeating, backwards } => {
                let mut waypoint = WaypointMovementGenerator::from_path_id(*path_id, *repeating);
                if *backwards {
                    waypoint = waypoint.follow_backwards();
                }
                waypoint.into()
            }
            Self::Chase { target, range, angle } => {
                let mut chase = ChaseMovementGenerator::new(*target);
                if let Some(range) = range {
                    chase = chase.with_range(*range);
                }
                if let Some(angle) = angle {
                    chase = chase.with_angle(*angle);
                }
                chase.into()
            }
            Self::Follow { target, range, angle, duration_ms } => {
                let mut follow = FollowMovementGenerator::new(*target, *range, *angle);
                if let Some(duration) = duration_ms {
                    follow = follow.with_duration(*duration);
                }
                follow.into()
            }
            Self::Flee { threat, duration_ms: Some(duration) } => {
                FleeingMovementGenerator::timed(*threat, *duration).into()
            }
            Self::Flee { threat, duration_ms: None } => {
                FleeingMovementGenerator::new(*threat).into()
            }
            Self::Confused => ConfusedMovementGenerator::new().into(),
            Self::Home => HomeMovementGenerator::new().into(),
            Self::Rotate { id, duration_ms, direction } => {
                RotateMovementGenerator::new(*id, *duration_ms, *direction).into()
            }
            Self::Distract { timer_ms, orientation } => {
                DistractMovementGenerator::new(*timer_ms, *orientation).into()
            }
            Self::SplineChain { id, links, walk } => {
                let chain = spline_chain(links.clone()).context("invalid spline chain")?;
                SplineChainMovementGenerator::new(*id, chain, *walk).into()
            }
            Self::Flight { segments } => {
                let route = TaxiRoute::new(segments.clone()).context("invalid taxi route")?;
                FlightPathMovementGenerator::new(&route, config.flight.skip_point_distance).into()
            }
        };
        Ok(generator)
    }
}

/// One line of `simulate` output.
#[derive(Debug, Serialize)]
pub struct TickEvent {
    pub tick: u64,
    pub time_ms: u64,
    #[serde(flatten)]
    pub event: SimEvent,
}

#[derive(Debug, Serialize)]
pub struct UnitSummary {
    pub id: u64,
    pub position: Position,
    pub generator: Option<String>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let scenario: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse scenario {}", path.display()))?;
        if scenario.step_ms == 0 {
            bail!("scenario step_ms must be positive");
        }
        Ok(scenario)
    }

    /// Build the world, start every unit's generator and play the scenario out.
    ///
    /// `on_event` sees every simulation event in order.
    pub fn run(
        &self,
        base_dir: &Path,
        config: MotionConfig,
        mut on_event: impl FnMut(TickEvent) -> Result<()>,
    ) -> Result<Vec<UnitSummary>> {
        let mut world = SimWorld::new(config.clone()).with_ground_z(self.ground_z);
        if let Some(mesh_path) = &self.mesh {
            let mesh = crate::load_mesh(&base_dir.join(mesh_path))?;
            world = world.with_mesh(Arc::new(mesh));
        }
        for [a, b] in &self.walls {
            world.add_wall(*a, *b);
        }
        for path in &self.waypoint_paths {
            path.validate().with_context(|| format!("invalid waypoint path {}", path.id))?;
            world.add_waypoint_path(path.clone());
        }

        for entry in &self.units {
            let mut unit = SimUnit::new(entry.position).with_orientation(entry.orientation);
            if let Some(speed) = entry.run_speed {
                unit = unit.with_run_speed(speed);
            }
            if entry.flying {
                unit = unit.with_capabilities(AgentCapabilities {
                    can_fly: true,
                    ..AgentCapabilities::walker()
                });
            }
            unit.victim = entry.victim;
            if let Some(home) = entry.home {
                unit.home = home;
            }
            world.spawn(entry.id, unit);
        }

        let mut driver = MotionDriver::new();
        let mut ctx = TickContext::new(0, 0, self.seed);
        for entry in &self.units {
            if let Some(generator) = &entry.generator {
                let generator = generator
                    .build(&config)
                    .with_context(|| format!("unit {}", entry.id))?;
                driver.start(&ctx, &mut world, entry.id, generator);
            }
        }
        emit(&mut world, &ctx, self.step_ms, &mut on_event)?;

        for _ in 0..self.steps {
            ctx = ctx.next(self.step_ms);
            world.advance(self.step_ms);
            for unit in driver.update(&ctx, &mut world) {
                tracing::debug!(unit, tick = ctx.tick, "generator finished");
            }
            emit(&mut world, &ctx, self.step_ms, &mut on_event)?;
        }

        let summary = self
            .units
            .iter()
            .filter_map(|entry| {
                let unit = world.unit(entry.id)?;
                Some(UnitSummary {
                    id: entry.id,
                    position: unit.position,
                    generator: driver
                        .get(entry.id)
                        .map(|g| format!("{:?}", ai_motion::MovementGenerator::kind(g))),
                })
            })
            .collect();
        Ok(summary)
    }
}

fn emit(
    world: &mut SimWorld,
    ctx: &TickContext,
    step_ms: u32,
    on_event: &mut impl FnMut(TickEvent) -> Result<()>,
) -> Result<()> {
    for event in world.take_events() {
        on_event(TickEvent { tick: ctx.tick, time_ms: ctx.tick * u64::from(step_ms), event })?;
    }
    Ok(())
}
