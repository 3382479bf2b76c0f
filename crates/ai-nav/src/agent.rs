use ai_core::Vec3;

use crate::filter::LiquidKind;

/// Movement capabilities that decide how a unit is allowed to path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgentCapabilities {
    pub can_walk: bool,
    pub can_swim: bool,
    pub can_fly: bool,
    pub is_player: bool,
    pub is_falling: bool,
    /// Units in combat or evading may cross steep ground.
    pub in_combat_or_evading: bool,
    /// Controlled by scripts that bypass the navmesh entirely.
    pub ignores_pathfinding: bool,
}

impl AgentCapabilities {
    pub fn walker() -> Self {
        Self { can_walk: true, ..Self::default() }
    }

    pub fn player() -> Self {
        Self { can_walk: true, can_swim: true, is_player: true, ..Self::default() }
    }
}

/// The view of a unit that [`crate::PathGenerator`] needs.
///
/// Everything except [`PathAgent::position`] and [`PathAgent::capabilities`] has a
/// permissive default so tests can path a bare point.
pub trait PathAgent {
    fn position(&self) -> Vec3;

    fn capabilities(&self) -> AgentCapabilities;

    fn liquid_at(&self, _pos: Vec3) -> LiquidKind {
        LiquidKind::None
    }

    fn is_under_water(&self, _pos: Vec3) -> bool {
        false
    }

    /// Snap a mesh-less destination to the height the unit can actually stand at.
    fn update_allowed_position_z(&self, _pos: &mut Vec3) {}

    fn collision_height(&self) -> f32 {
        2.0
    }

    fn is_in_line_of_sight(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

/// A point-sized agent used by tools and tests.
#[derive(Debug, Clone, Copy)]
pub struct PointAgent {
    pub position: Vec3,
    pub capabilities: AgentCapabilities,
}

impl PointAgent {
    pub fn walker(position: Vec3) -> Self {
        Self { position, capabilities: AgentCapabilities::walker() }
    }
}

impl PathAgent for PointAgent {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn capabilities(&self) -> AgentCapabilities {
        self.capabilities
    }
}
