//! Navigation mesh queries and path generation.
//!
//! [`NavMesh`] is immutable once built and can be shared by every unit of an instance.
//! Each request owns its own [`NavMeshQuery`] scratch space, so queries never mutate
//! shared state.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod config;
pub mod error;
pub mod filter;
pub mod mesh;
pub mod path_generator;
pub mod path_type;
pub mod query;

pub use agent::{AgentCapabilities, PathAgent, PointAgent};
pub use config::PathConfig;
pub use error::NavMeshError;
pub use filter::{LiquidKind, NavArea, NavTerrain, QueryFilter};
pub use mesh::{
    NavMesh, NavMeshBuilder, NavMeshData, OffMeshLink, PolyRef, TileCoord, TriangleData,
    DEFAULT_TILE_SIZE,
};
pub use path_generator::PathGenerator;
pub use path_type::PathType;
pub use query::{NavMeshQuery, PolyCorridor, RaycastHit, StraightPathFlags, StraightPoint};
