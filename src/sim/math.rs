//! Vector helpers and the body transform
//!
//! `glam::Vec2` carries the algebra. The helpers here add the tolerances the
//! collision code relies on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Tolerance for nearly-equal comparisons (half a millimeter)
pub const SMALL_AMOUNT: f32 = 0.0005;

/// Magnitude below which a vector is treated as zero when normalizing
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Unit vector in the direction of `v`, or zero when `v` is (nearly) zero
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    let magnitude = v.length();
    if magnitude < NORMALIZE_EPSILON {
        return Vec2::ZERO;
    }
    v / magnitude
}

/// 2D cross product (z component of the 3D cross)
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

#[inline]
pub fn nearly_equal(a: f32, b: f32) -> bool {
    (a - b).abs() < SMALL_AMOUNT
}

#[inline]
pub fn nearly_equal_vec(a: Vec2, b: Vec2) -> bool {
    a.distance_squared(b) < SMALL_AMOUNT * SMALL_AMOUNT
}

/// Position plus precomputed sine/cosine of a rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub position: Vec2,
    pub sin: f32,
    pub cos: f32,
}

impl Transform2D {
    pub fn new(position: Vec2, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { position, sin, cos }
    }

    /// Map a body-local point to world space (rotate, then translate)
    #[inline]
    pub fn apply(&self, local: Vec2) -> Vec2 {
        Vec2::new(
            self.cos * local.x - self.sin * local.y + self.position.x,
            self.sin * local.x + self.cos * local.y + self.position.y,
        )
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }
}
