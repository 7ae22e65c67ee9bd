//! Contact points and collision manifolds
//!
//! Once two bodies are known to overlap (and have been pushed apart), the
//! solver needs the point(s) where they touch. Circles give one point; two
//! boxes give one point for a corner contact and two for flush edges.

use glam::Vec2;

use super::body::{Body, Shape};
use super::collision::Collision;
use super::math::{nearly_equal, nearly_equal_vec, normalize};

/// Up to two contact points between a pair of bodies
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactSet {
    points: [Vec2; 2],
    count: usize,
}

impl ContactSet {
    pub fn one(point: Vec2) -> Self {
        Self {
            points: [point, Vec2::ZERO],
            count: 1,
        }
    }

    pub fn two(first: Vec2, second: Vec2) -> Self {
        Self {
            points: [first, second],
            count: 2,
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points[..self.count]
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Everything the solver needs to know about one collision in one sub-step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Manifold {
    /// Unit normal pointing from body A toward body B
    pub normal: Vec2,
    /// Penetration depth before separation
    pub depth: f32,
    pub contacts: ContactSet,
}

impl Manifold {
    pub fn new(collision: Collision, contacts: ContactSet) -> Self {
        Self {
            normal: collision.normal,
            depth: collision.depth,
            contacts,
        }
    }

    pub fn contact_points(&self) -> &[Vec2] {
        self.contacts.points()
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }
}

/// Closest point on segment `a`-`b` to `p`, as (squared distance, point)
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> (f32, Vec2) {
    let ab = b - a;
    let ap = p - a;
    let length_sq = ab.length_squared();

    let closest = if length_sq <= 0.0 {
        a
    } else {
        let t = (ap.dot(ab) / length_sq).clamp(0.0, 1.0);
        a + ab * t
    };
    (p.distance_squared(closest), closest)
}

/// Contact point of two overlapping circles: on A's surface toward B
pub fn circle_contact(center_a: Vec2, radius_a: f32, center_b: Vec2) -> Vec2 {
    center_a + normalize(center_b - center_a) * radius_a
}

/// Contact point of a circle and a polygon: the polygon boundary point nearest the center
pub fn circle_polygon_contact(circle_center: Vec2, vertices: &[Vec2]) -> Vec2 {
    let n = vertices.len();
    let mut min_distance_sq = f32::MAX;
    let mut contact = circle_center;

    for i in 0..n {
        let (distance_sq, point) =
            point_segment_distance(circle_center, vertices[i], vertices[(i + 1) % n]);
        if distance_sq < min_distance_sq {
            min_distance_sq = distance_sq;
            contact = point;
        }
    }
    contact
}

/// Running best candidates for polygon-polygon contacts
struct ClosestPoints {
    min_distance_sq: f32,
    first: Vec2,
    second: Vec2,
    count: usize,
}

impl ClosestPoints {
    fn new() -> Self {
        Self {
            min_distance_sq: f32::MAX,
            first: Vec2::ZERO,
            second: Vec2::ZERO,
            count: 0,
        }
    }

    fn offer(&mut self, distance_sq: f32, point: Vec2) {
        if nearly_equal(distance_sq, self.min_distance_sq) {
            if !nearly_equal_vec(point, self.first) {
                self.second = point;
                self.count = 2;
            }
        } else if distance_sq < self.min_distance_sq {
            self.min_distance_sq = distance_sq;
            self.first = point;
            self.count = 1;
        }
    }

    /// Every vertex of `vertices` against every edge of `edges`
    fn scan(&mut self, vertices: &[Vec2], edges: &[Vec2]) {
        let n = edges.len();
        for &p in vertices {
            for j in 0..n {
                let (distance_sq, point) = point_segment_distance(p, edges[j], edges[(j + 1) % n]);
                self.offer(distance_sq, point);
            }
        }
    }

    fn into_set(self) -> ContactSet {
        match self.count {
            0 => ContactSet::default(),
            1 => ContactSet::one(self.first),
            _ => ContactSet::two(self.first, self.second),
        }
    }
}

/// Contact points of two overlapping convex polygons (one or two points)
pub fn polygon_contacts(vertices_a: &[Vec2], vertices_b: &[Vec2]) -> ContactSet {
    let mut closest = ClosestPoints::new();
    closest.scan(vertices_a, vertices_b);
    closest.scan(vertices_b, vertices_a);
    closest.into_set()
}

/// Contact points between two bodies (the same regardless of argument order
/// for circle/box pairs)
pub fn find_contact_points(a: &Body, b: &Body) -> ContactSet {
    match (*a.shape(), *b.shape()) {
        (Shape::Circle { radius }, Shape::Circle { .. }) => {
            ContactSet::one(circle_contact(a.position(), radius, b.position()))
        }
        (Shape::Circle { .. }, Shape::Box { .. }) => match b.transformed_vertices() {
            Some(vertices) => ContactSet::one(circle_polygon_contact(a.position(), &vertices)),
            None => ContactSet::default(),
        },
        (Shape::Box { .. }, Shape::Circle { .. }) => match a.transformed_vertices() {
            Some(vertices) => ContactSet::one(circle_polygon_contact(b.position(), &vertices)),
            None => ContactSet::default(),
        },
        (Shape::Box { .. }, Shape::Box { .. }) => {
            match (a.transformed_vertices(), b.transformed_vertices()) {
                (Some(vertices_a), Some(vertices_b)) => polygon_contacts(&vertices_a, &vertices_b),
                _ => ContactSet::default(),
            }
        }
    }
}
