//! Per-unit movement generators on top of `ai-nav` path generation.
//!
//! A [`MovementGenerator`] decides where its owner goes next and expresses every move as
//! a [`MoveSplineInit`] handed to the owner's [`MotionWorld`]. The world owns units, the
//! spline layer and the navmesh. Generators own only their per-unit state.
//!
//! [`MotionGenerator`] is the closed set of built-in strategies and [`MotionDriver`]
//! runs one of them per unit. [`SimWorld`] is an in-memory world used by tests, benches
//! and the CLI.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod data;
pub mod driver;
pub mod follower;
pub mod generator;
pub mod generators;
pub mod sim;
pub mod spline;
pub mod state;
pub mod world;

pub use config::{
    ChaseConfig, ConfusedConfig, FleeConfig, FlightConfig, FollowConfig, MotionConfig, RandomConfig,
    WaypointConfig,
};
pub use data::{
    spline_chain, MotionDataError, SplineChainLink, SplineChainResumeInfo, TaxiNode, TaxiRoute,
    TaxiSegment, WaypointMoveType, WaypointNode, WaypointPath,
};
pub use driver::MotionDriver;
pub use follower::{FollowKind, FollowerRegistry, TargetRef};
pub use generator::{
    GeneratorFlags, MotionMode, MotionPriority, MovementGenerator, MovementGeneratorType,
};
pub use generators::{
    choose_flee_offset, ChaseAngle, ChaseMovementGenerator, ChaseRange, ConfusedMovementGenerator,
    DistractMovementGenerator, FleeingMovementGenerator, FlightPathMovementGenerator,
    FollowMovementGenerator, FormationMovementGenerator, GenericMovementGenerator,
    HomeMovementGenerator, IdleMovementGenerator, MotionGenerator, PointMovementGenerator,
    RandomMoveKind, RandomMovementGenerator, RotateDirection, RotateMovementGenerator,
    SplineChainMovementGenerator, WaypointMovementGenerator, WaypointState,
};
pub use sim::{LiquidRegion, SimEvent, SimUnit, SimWorld};
pub use spline::{move_to, MoveSplineInit, SplineAnimation, SplineFacing};
pub use state::UnitState;
pub use world::{MotionWorld, UnitPathAgent};
