//! Axis-aligned bounding boxes for the broad phase

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// World-space bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    /// Smallest box containing every point (empty input gives an inverted box)
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(-f32::MAX);
        for &p in points {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Overlap test; boxes that only share an edge do not intersect
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Aabb::new(0.0, 0.0, 1.0, 1.0);
        let b = Aabb::new(1.0, 0.0, 2.0, 1.0);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));

        let above = Aabb::new(0.0, 1.0, 1.0, 2.0);
        assert!(!a.intersects(&above));
        assert!(!above.intersects(&a));
    }

    #[test]
    fn test_overlap_and_containment() {
        let a = Aabb::new(0.0, 0.0, 2.0, 2.0);
        assert!(a.intersects(&Aabb::new(1.9, 1.9, 3.0, 3.0)));
        assert!(a.intersects(&Aabb::new(0.5, 0.5, 1.0, 1.0)));
        assert!(!a.intersects(&Aabb::new(2.5, 0.0, 3.0, 2.0)));
    }

    #[test]
    fn test_from_points() {
        let aabb = Aabb::from_points(&[
            Vec2::new(1.0, -2.0),
            Vec2::new(-3.0, 4.0),
            Vec2::new(0.5, 0.5),
        ]);
        assert_eq!(aabb, Aabb::new(-3.0, -2.0, 1.0, 4.0));
        assert_eq!(aabb.width(), 4.0);
        assert_eq!(aabb.height(), 6.0);
    }

    proptest! {
        #[test]
        fn prop_intersects_is_symmetric(
            ax in -50.0f32..50.0, ay in -50.0f32..50.0, aw in 0.0f32..20.0, ah in 0.0f32..20.0,
            bx in -50.0f32..50.0, by in -50.0f32..50.0, bw in 0.0f32..20.0, bh in 0.0f32..20.0,
        ) {
            let a = Aabb::new(ax, ay, ax + aw, ay + ah);
            let b = Aabb::new(bx, by, bx + bw, by + bh);
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        #[test]
        fn prop_shared_vertical_edge_never_intersects(
            x in -50.0f32..50.0, y in -50.0f32..50.0, w in 0.1f32..20.0, h in 0.1f32..20.0,
        ) {
            let a = Aabb::new(x - w, y, x, y + h);
            let b = Aabb::new(x, y, x + w, y + h);
            prop_assert!(!a.intersects(&b));
        }
    }
}
