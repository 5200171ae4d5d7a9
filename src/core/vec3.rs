//! Arena Geometry
//!
//! World positions are 3D (`y` is height), but every gameplay query
//! (range checks, movement, projectile travel) works on the x/z ground plane.

use std::fmt;
use serde::{Serialize, Deserialize};

/// 3D world position. `y` is vertical and ignored by gameplay logic.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component (ground plane)
    pub x: f32,
    /// Y component (height)
    pub y: f32,
    /// Z component (ground plane)
    pub z: f32,
}

impl Vec3 {
    /// Origin
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a new position.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared planar (x/z) distance to another point.
    #[inline]
    pub fn planar_distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    /// Planar (x/z) Euclidean distance to another point.
    #[inline]
    pub fn planar_distance(self, other: Self) -> f32 {
        self.planar_distance_squared(other).sqrt()
    }

    /// Planar vector pointing from `self` towards `other` (not normalized).
    #[inline]
    pub fn planar_delta(self, other: Self) -> PlanarVec {
        PlanarVec::new(other.x - self.x, other.z - self.z)
    }

    /// Move along the ground plane, keeping height.
    #[inline]
    pub fn offset_planar(self, delta: PlanarVec) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y,
            z: self.z + delta.z,
        }
    }

    /// True when all components are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec3({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

// =============================================================================
// PLANAR VECTOR
// =============================================================================

/// Direction or displacement on the x/z ground plane.
///
/// Serializes as `{ "x": .., "z": .. }`, the shape clients send for aimed skills.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanarVec {
    /// X component
    pub x: f32,
    /// Z component
    pub z: f32,
}

impl PlanarVec {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, z: 0.0 };

    /// Create a new planar vector.
    #[inline]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Unit vector for a yaw angle, pointing the way a dash pushes the player:
    /// `(-sin(yaw), -cos(yaw))`.
    #[inline]
    pub fn backward_from_yaw(yaw: f32) -> Self {
        Self::new(-yaw.sin(), -yaw.cos())
    }

    /// Squared length.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.z * self.z
    }

    /// Length (magnitude).
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.z * scalar)
    }

    /// Normalize to unit length.
    ///
    /// Returns `None` for zero-length or non-finite vectors, which cannot
    /// describe a direction.
    #[inline]
    pub fn normalize(self) -> Option<Self> {
        let len = self.length();
        if !len.is_finite() || len <= f32::EPSILON {
            return None;
        }
        Some(Self::new(self.x / len, self.z / len))
    }
}

// =============================================================================
// TESTS
// =============================================================================
