use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// Terrain classes a path query may include or exclude.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NavTerrain: u16 {
        const GROUND       = 0x01;
        const GROUND_STEEP = 0x02;
        const WATER        = 0x04;
        const MAGMA_SLIME  = 0x08;
    }
}

/// Area tag baked into each navmesh triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NavArea {
    #[default]
    Ground,
    GroundSteep,
    Water,
    MagmaSlime,
}

impl NavArea {
    pub fn terrain(self) -> NavTerrain {
        match self {
            NavArea::Ground => NavTerrain::GROUND,
            NavArea::GroundSteep => NavTerrain::GROUND_STEEP,
            NavArea::Water => NavTerrain::WATER,
            NavArea::MagmaSlime => NavTerrain::MAGMA_SLIME,
        }
    }
}

/// Liquid sampled at a point of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LiquidKind {
    #[default]
    None,
    Water,
    Ocean,
    Magma,
    Slime,
}

impl LiquidKind {
    pub fn is_liquid(self) -> bool {
        self != LiquidKind::None
    }

    /// Terrain class a unit standing in this liquid moves through.
    pub fn terrain(self) -> NavTerrain {
        match self {
            LiquidKind::None => NavTerrain::GROUND,
            LiquidKind::Water | LiquidKind::Ocean => NavTerrain::WATER,
            LiquidKind::Magma | LiquidKind::Slime => NavTerrain::MAGMA_SLIME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryFilter {
    include: NavTerrain,
    exclude: NavTerrain,
}

impl QueryFilter {
    pub fn new(include: NavTerrain, exclude: NavTerrain) -> Self {
        Self { include, exclude }
    }

    /// Accepts every area.
    pub fn all() -> Self {
        Self::new(NavTerrain::all(), NavTerrain::empty())
    }

    pub fn include(&self) -> NavTerrain {
        self.include
    }

    pub fn exclude(&self) -> NavTerrain {
        self.exclude
    }

    pub fn set_include(&mut self, include: NavTerrain) {
        self.include = include;
    }

    pub fn set_exclude(&mut self, exclude: NavTerrain) {
        self.exclude = exclude;
    }

    pub fn passes(&self, area: NavArea) -> bool {
        let t = area.terrain();
        self.include.intersects(t) && !self.exclude.intersects(t)
    }
}
