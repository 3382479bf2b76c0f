//! Spline launch descriptions.
//!
//! Generators never interpolate positions themselves. They describe a movement with
//! [`MoveSplineInit`] and hand it to [`MotionWorld::launch_spline`], which answers with
//! the expected duration.

use ai_core::{UnitId, Vec3};
use ai_nav::{PathGenerator, PathType};
use serde::{Deserialize, Serialize};

use crate::{MotionWorld, UnitPathAgent};

/// What the unit faces once the spline ends.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplineFacing<U> {
    /// Face the direction of travel.
    #[default]
    None,
    Angle(f32),
    Point(Vec3),
    Unit(U),
}

/// Optional animation tier change carried by authored moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplineAnimation {
    #[default]
    None,
    ToGround,
    ToFly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveSplineInit<U> {
    /// Control points. The first point is replaced by the unit's position at launch.
    pub path: Vec<Vec3>,
    pub walk: bool,
    /// Overrides the unit's run/walk speed when set.
    pub velocity: Option<f32>,
    pub facing: SplineFacing<U>,
    pub cyclic: bool,
    pub fly: bool,
    pub animation: SplineAnimation,
    /// Offset added to the reported point index, used by routes that launch mid-path.
    pub first_point_id: i32,
}

impl<U> Default for MoveSplineInit<U> {
    fn default() -> Self {
        Self {
            path: Vec::new(),
            walk: false,
            velocity: None,
            facing: SplineFacing::None,
            cyclic: false,
            fly: false,
            animation: SplineAnimation::None,
            first_point_id: 0,
        }
    }
}

impl<U: UnitId> MoveSplineInit<U> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_by_path(mut self, path: impl Into<Vec<Vec3>>) -> Self {
        self.path = path.into();
        self
    }

    /// Straight line from `from` (replaced at launch) to `dest`.
    pub fn move_direct(mut self, from: Vec3, dest: Vec3) -> Self {
        self.path = vec![from, dest];
        self
    }

    pub fn walk(mut self, walk: bool) -> Self {
        self.walk = walk;
        self
    }

    pub fn velocity(mut self, velocity: f32) -> Self {
        if velocity > 0.0 {
            self.velocity = Some(velocity);
        }
        self
    }

    pub fn facing(mut self, facing: SplineFacing<U>) -> Self {
        self.facing = facing;
        self
    }

    pub fn face_angle(self, angle: f32) -> Self {
        self.facing(SplineFacing::Angle(angle))
    }

    pub fn face_unit(self, unit: U) -> Self {
        self.facing(SplineFacing::Unit(unit))
    }

    pub fn cyclic(mut self) -> Self {
        self.cyclic = true;
        self
    }

    pub fn fly(mut self) -> Self {
        self.fly = true;
        self
    }

    pub fn animation(mut self, animation: SplineAnimation) -> Self {
        self.animation = animation;
        self
    }

    pub fn first_point_id(mut self, id: i32) -> Self {
        self.first_point_id = id;
        self
    }

    /// Destination of the last control point.
    pub fn destination(&self) -> Option<Vec3> {
        self.path.last().copied()
    }

    /// Planar-plus-height length of the control polygon.
    pub fn length(&self) -> f32 {
        self.path.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Build a move towards `dest`, pathfinding when `generate_path` is set.
///
/// A path that comes back `NOPATH` degrades to a straight line, matching what the spline
/// layer would do with a bare destination.
pub fn move_to<W: MotionWorld>(
    world: &W,
    owner: W::Unit,
    dest: Vec3,
    generate_path: bool,
    force_destination: bool,
) -> MoveSplineInit<W::Unit> {
    let from = world.position(owner).pos;
    if generate_path {
        let agent = UnitPathAgent::new(world, owner);
        let mut path = PathGenerator::with_config(&agent, world.motion_config().path);
        let ok = path.calculate_path(&agent, world.nav_mesh(), dest, force_destination);
        if ok && !path.path_type().contains(PathType::NOPATH) {
            return MoveSplineInit::new().move_by_path(path.path().to_vec());
        }
    }
    MoveSplineInit::new().move_direct(from, dest)
}
