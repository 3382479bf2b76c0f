use thiserror::Error;

/// Problems found while building a [`crate::NavMesh`] from source data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavMeshError {
    #[error("navmesh has no triangles")]
    Empty,

    #[error("triangle {index} has a non-finite vertex")]
    NonFiniteVertex { index: usize },

    #[error("triangle {index} has zero area")]
    DegenerateTriangle { index: usize },

    #[error("off-mesh link {index} endpoint ({x}, {y}, {z}) is not on any triangle")]
    DanglingOffMeshLink { index: usize, x: f32, y: f32, z: f32 },

    #[error("tile size must be positive, got {0}")]
    InvalidTileSize(f32),
}
