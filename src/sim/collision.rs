//! Narrow-phase collision detection (Separating Axis Theorem)
//!
//! Every test answers two questions at once: do the shapes overlap, and if so,
//! what is the minimum translation that separates them. The returned normal
//! always points from the first shape toward the second.

use glam::Vec2;

use super::aabb::Aabb;
use super::body::{Body, Shape};
use super::math::normalize;

/// Minimum translation separating two overlapping shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    /// Unit normal pointing from the first shape toward the second
    pub normal: Vec2,
    /// Overlap along the normal (>= 0)
    pub depth: f32,
}

impl Collision {
    /// Translation that pushes the second shape out of the first
    pub fn mtv(&self) -> Vec2 {
        self.normal * self.depth
    }
}

/// Broad-phase overlap test, see [`Aabb::intersects`]
#[inline]
pub fn intersect_aabb(a: &Aabb, b: &Aabb) -> bool {
    a.intersects(b)
}

/// Project every vertex onto `axis`, returning (min, max)
fn project_vertices(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    let mut min = f32::MAX;
    let mut max = -f32::MAX;
    for v in vertices {
        let projection = v.dot(axis);
        min = min.min(projection);
        max = max.max(projection);
    }
    (min, max)
}

fn project_circle(center: Vec2, radius: f32, axis: Vec2) -> (f32, f32) {
    let offset = normalize(axis) * radius;
    let a = (center + offset).dot(axis);
    let b = (center - offset).dot(axis);
    if a > b { (b, a) } else { (a, b) }
}

/// Index of the vertex closest to `point`
fn closest_vertex(point: Vec2, vertices: &[Vec2]) -> Option<usize> {
    let mut result = None;
    let mut min_distance = f32::MAX;
    for (i, v) in vertices.iter().enumerate() {
        let distance = v.distance(point);
        if distance < min_distance {
            min_distance = distance;
            result = Some(i);
        }
    }
    result
}

/// Outward-or-inward edge normals of a polygon; zero-length edges are skipped
fn edge_axes(vertices: &[Vec2]) -> impl Iterator<Item = Vec2> + '_ {
    let n = vertices.len();
    (0..n).filter_map(move |i| {
        let edge = vertices[(i + 1) % n] - vertices[i];
        let axis = normalize(edge.perp());
        (axis != Vec2::ZERO).then_some(axis)
    })
}

/// Running minimum-overlap axis for a SAT scan
struct AxisTracker {
    normal: Vec2,
    depth: f32,
}

impl AxisTracker {
    fn new() -> Self {
        Self {
            normal: Vec2::ZERO,
            depth: f32::MAX,
        }
    }

    /// Record one axis. Returns false if the projections are disjoint.
    fn test(&mut self, axis: Vec2, (min_a, max_a): (f32, f32), (min_b, max_b): (f32, f32)) -> bool {
        if min_a >= max_b || min_b >= max_a {
            return false;
        }
        let axis_depth = (max_b - min_a).min(max_a - min_b);
        if axis_depth < self.depth {
            self.depth = axis_depth;
            self.normal = axis;
        }
        true
    }

    /// Orient the best axis along `direction` and finish
    fn finish(self, direction: Vec2) -> Collision {
        let normal = if direction.dot(self.normal) < 0.0 {
            -self.normal
        } else {
            self.normal
        };
        Collision {
            normal,
            depth: self.depth,
        }
    }
}

/// Circle vs circle
pub fn intersect_circles(
    center_a: Vec2,
    radius_a: f32,
    center_b: Vec2,
    radius_b: f32,
) -> Option<Collision> {
    let distance = center_a.distance(center_b);
    let radii = radius_a + radius_b;
    if distance >= radii {
        return None;
    }

    let mut normal = normalize(center_b - center_a);
    if normal == Vec2::ZERO {
        // Coincident centers: any axis separates them, pick +x
        normal = Vec2::X;
    }
    Some(Collision {
        normal,
        depth: radii - distance,
    })
}

/// Convex polygon vs convex polygon
pub fn intersect_polygons(
    center_a: Vec2,
    vertices_a: &[Vec2],
    center_b: Vec2,
    vertices_b: &[Vec2],
) -> Option<Collision> {
    let mut tracker = AxisTracker::new();

    for axis in edge_axes(vertices_a).chain(edge_axes(vertices_b)) {
        let a = project_vertices(vertices_a, axis);
        let b = project_vertices(vertices_b, axis);
        if !tracker.test(axis, a, b) {
            return None;
        }
    }

    Some(tracker.finish(center_b - center_a))
}

/// Circle vs convex polygon. The normal points from the circle to the polygon.
pub fn intersect_circle_polygon(
    circle_center: Vec2,
    circle_radius: f32,
    polygon_center: Vec2,
    vertices: &[Vec2],
) -> Option<Collision> {
    let mut tracker = AxisTracker::new();

    for axis in edge_axes(vertices) {
        let a = project_vertices(vertices, axis);
        let b = project_circle(circle_center, circle_radius, axis);
        if !tracker.test(axis, a, b) {
            return None;
        }
    }

    // Edge normals miss the gap at a corner; test the axis toward the nearest vertex too
    let nearest = closest_vertex(circle_center, vertices)?;
    let axis = normalize(vertices[nearest] - circle_center);
    if axis != Vec2::ZERO {
        let a = project_vertices(vertices, axis);
        let b = project_circle(circle_center, circle_radius, axis);
        if !tracker.test(axis, a, b) {
            return None;
        }
    }

    Some(tracker.finish(polygon_center - circle_center))
}

/// Test two bodies for overlap. The normal points from `a` toward `b`.
pub fn collide(a: &Body, b: &Body) -> Option<Collision> {
    match (*a.shape(), *b.shape()) {
        (Shape::Circle { radius: radius_a }, Shape::Circle { radius: radius_b }) => {
            intersect_circles(a.position(), radius_a, b.position(), radius_b)
        }
        (Shape::Circle { radius }, Shape::Box { .. }) => {
            let vertices = b.transformed_vertices()?;
            intersect_circle_polygon(a.position(), radius, b.position(), &vertices)
        }
        (Shape::Box { .. }, Shape::Circle { radius }) => {
            let vertices = a.transformed_vertices()?;
            // The test runs circle-first, so flip to keep a -> b
            intersect_circle_polygon(b.position(), radius, a.position(), &vertices).map(
                |collision| Collision {
                    normal: -collision.normal,
                    depth: collision.depth,
                },
            )
        }
        (Shape::Box { .. }, Shape::Box { .. }) => {
            let vertices_a = a.transformed_vertices()?;
            let vertices_b = b.transformed_vertices()?;
            intersect_polygons(a.position(), &vertices_a, b.position(), &vertices_b)
        }
    }
}
