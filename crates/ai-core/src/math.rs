//! Vector and angle helpers.
//!
//! World space is z-up: the walkable plane is x/y and `z` is height. Orientations are
//! radians counter-clockwise from +x, normalized to `[0, 2π)`.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const TAU: f32 = core::f32::consts::TAU;

/// Distance at which two bodies are considered touching.
pub const CONTACT_DISTANCE: f32 = 0.5;
/// Minimum melee reach regardless of body size.
pub const NOMINAL_MELEE_RANGE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    pub fn length_2d(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    pub fn distance_sq(self, other: Self) -> f32 {
        (other - self).length_sq()
    }

    pub fn distance_2d(self, other: Self) -> f32 {
        (other - self).length_2d()
    }

    pub fn distance_2d_sq(self, other: Self) -> f32 {
        let d = other - self;
        d.x * d.x + d.y * d.y
    }

    /// 2D cross product of the xy components.
    pub fn cross_2d(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Unit vector, or zero for a (near) zero vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            return Self::ZERO;
        }
        self / len
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Point `distance` away from `self` along the planar angle `angle`.
    pub fn offset_polar(self, distance: f32, angle: f32) -> Self {
        Self::new(
            self.x + distance * angle.cos(),
            self.y + distance * angle.sin(),
            self.z,
        )
    }

    pub fn with_z(self, z: f32) -> Self {
        Self::new(self.x, self.y, z)
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Normalize an angle into `[0, 2π)`.
pub fn normalize_orientation(angle: f32) -> f32 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Planar angle of the direction `from -> to`.
pub fn absolute_angle(from: Vec3, to: Vec3) -> f32 {
    normalize_orientation((to.y - from.y).atan2(to.x - from.x))
}

/// A point in the world plus a facing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub pos: Vec3,
    pub orientation: f32,
}

impl Position {
    pub fn new(pos: Vec3, orientation: f32) -> Self {
        Self {
            pos,
            orientation: normalize_orientation(orientation),
        }
    }

    pub fn at(pos: Vec3) -> Self {
        Self::new(pos, 0.0)
    }

    pub fn absolute_angle_to(&self, to: Vec3) -> f32 {
        absolute_angle(self.pos, to)
    }

    /// Angle towards `to` measured from this position's facing.
    pub fn relative_angle_to(&self, to: Vec3) -> f32 {
        normalize_orientation(self.absolute_angle_to(to) - self.orientation)
    }

    pub fn to_absolute_angle(&self, relative: f32) -> f32 {
        normalize_orientation(relative + self.orientation)
    }

    /// True when `to` lies inside the cone of width `arc` centered on the facing.
    pub fn has_in_arc(&self, arc: f32, to: Vec3) -> bool {
        let rel = self.relative_angle_to(to);
        let rel = if rel > core::f32::consts::PI {
            rel - TAU
        } else {
            rel
        };
        rel.abs() <= arc / 2.0
    }
}

impl From<Vec3> for Position {
    fn from(pos: Vec3) -> Self {
        Self::at(pos)
    }
}
