//! Umbrella crate that re-exports the motion building blocks.
//!
//! - [`core`]: math, deterministic RNG, tick context and unit handles.
//! - [`nav`]: navmesh queries and the per-unit path generator.
//! - [`motion`]: movement generators and the in-memory simulation world.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use ai_core as core;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use ai_nav as nav;

#[cfg(feature = "motion")]
#[cfg_attr(docsrs, doc(cfg(feature = "motion")))]
pub use ai_motion as motion;

/// Everything needed to run generators against a world.
#[cfg(feature = "motion")]
#[cfg_attr(docsrs, doc(cfg(feature = "motion")))]
pub mod prelude {
    pub use ai_core::{Position, TickContext, UnitId, Vec3};
    pub use ai_motion::{
        MotionConfig, MotionDriver, MotionGenerator, MotionWorld, MovementGenerator,
        MovementGeneratorType, UnitState,
    };
    pub use ai_nav::{NavMesh, PathGenerator, PathType};
}
