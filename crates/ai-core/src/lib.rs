//! Deterministic, engine-agnostic primitives shared by the navigation and motion crates.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod math;
pub mod rng;
pub mod tick;
pub mod timer;
pub mod unit;

pub use math::{
    absolute_angle, normalize_orientation, Position, Vec3, CONTACT_DISTANCE, NOMINAL_MELEE_RANGE,
    TAU,
};
pub use rng::{DeterministicRng, SplitMix64};
pub use tick::TickContext;
pub use timer::TimeTracker;
pub use unit::UnitId;
