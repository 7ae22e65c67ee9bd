//! Rigid bodies: shape, mass properties, pose and cached world geometry
//!
//! Bodies are built through [`Body::create_circle`] / [`Body::create_box`],
//! which validate size and density and derive mass and inertia. The world-space
//! vertices and bounding box are cached and recomputed lazily after any pose
//! change, so readers never see geometry from before the latest move.

use std::cell::Cell;
use std::f32::consts::PI;
use std::ops::RangeInclusive;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::math::{Transform2D, cross};
use crate::consts::*;
use crate::error::{PhysicsError, PhysicsResult};

/// Corners in a box shape
pub const BOX_VERTEX_COUNT: usize = 4;

/// Two triangles covering a box, indexing into its vertex list (rendering only)
pub const BOX_TRIANGLES: [usize; 6] = [0, 1, 2, 0, 2, 3];

/// Collision shape in body-local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle {
        radius: f32,
    },
    Box {
        width: f32,
        height: f32,
        /// Corners centered on the origin, counter-clockwise
        vertices: [Vec2; BOX_VERTEX_COUNT],
    },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    pub fn rectangle(width: f32, height: f32) -> Self {
        let left = -width / 2.0;
        let right = left + width;
        let bottom = -height / 2.0;
        let top = bottom + height;
        Shape::Box {
            width,
            height,
            vertices: [
                Vec2::new(left, bottom),
                Vec2::new(right, bottom),
                Vec2::new(right, top),
                Vec2::new(left, top),
            ],
        }
    }

    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => PI * radius * radius,
            Shape::Box { width, height, .. } => width * height,
        }
    }

    /// Moment of inertia about the center for the given mass
    pub fn inertia(&self, mass: f32) -> f32 {
        match *self {
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Box { width, height, .. } => mass * (width * width + height * height) / 12.0,
        }
    }

    /// Triangle indices for filling the shape (empty for circles)
    pub fn triangles(&self) -> &'static [usize] {
        match self {
            Shape::Circle { .. } => &[],
            Shape::Box { .. } => &BOX_TRIANGLES,
        }
    }

    pub fn is_circle(&self) -> bool {
        matches!(self, Shape::Circle { .. })
    }

    /// Every dimension must be positive and finite
    pub fn validate(&self) -> PhysicsResult<()> {
        let valid = |d: f32| d.is_finite() && d > 0.0;
        match *self {
            Shape::Circle { radius } if !valid(radius) => {
                Err(PhysicsError::InvalidShape(format!("radius {radius}")))
            }
            Shape::Box { width, height, .. } if !valid(width) || !valid(height) => Err(
                PhysicsError::InvalidShape(format!("width {width}, height {height}")),
            ),
            _ => Ok(()),
        }
    }

    /// Same shape with its local geometry rebuilt from the dimensions
    fn rebuilt(&self) -> Self {
        match *self {
            Shape::Circle { radius } => Shape::circle(radius),
            Shape::Box { width, height, .. } => Shape::rectangle(width, height),
        }
    }
}

/// A rigid body
///
/// Mass properties are derived from shape and density, so snapshots only
/// store the inputs and rebuild the rest through the factory checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BodySnapshot")]
pub struct Body {
    shape: Shape,
    is_static: bool,
    density: f32,
    #[serde(skip_serializing)]
    area: f32,
    #[serde(skip_serializing)]
    mass: f32,
    #[serde(skip_serializing)]
    inv_mass: f32,
    #[serde(skip_serializing)]
    inertia: f32,
    #[serde(skip_serializing)]
    inv_inertia: f32,
    restitution: f32,
    static_friction: f32,
    dynamic_friction: f32,

    position: Vec2,
    angle: f32,
    linear_velocity: Vec2,
    angular_velocity: f32,
    /// Pending force, folded into velocity on the next step
    force: Vec2,

    /// World-space box corners; `None` means stale
    #[serde(skip)]
    transformed_vertices: Cell<Option<[Vec2; BOX_VERTEX_COUNT]>>,
    /// World-space bounds; `None` means stale
    #[serde(skip)]
    aabb: Cell<Option<Aabb>>,
}

fn check_range(value: f32, range: RangeInclusive<f32>) -> bool {
    range.contains(&value)
}

/// Serialized form of a [`Body`]
#[derive(Deserialize)]
struct BodySnapshot {
    shape: Shape,
    is_static: bool,
    density: f32,
    restitution: f32,
    static_friction: f32,
    dynamic_friction: f32,
    position: Vec2,
    angle: f32,
    linear_velocity: Vec2,
    angular_velocity: f32,
    force: Vec2,
}

impl TryFrom<BodySnapshot> for Body {
    type Error = PhysicsError;

    fn try_from(snapshot: BodySnapshot) -> PhysicsResult<Self> {
        if !check_range(snapshot.restitution, 0.0..=1.0) {
            return Err(PhysicsError::InvalidSnapshot(format!(
                "restitution {} outside [0, 1]",
                snapshot.restitution
            )));
        }
        let friction_ok = |f: f32| f.is_finite() && f >= 0.0;
        if !friction_ok(snapshot.static_friction) || !friction_ok(snapshot.dynamic_friction) {
            return Err(PhysicsError::InvalidSnapshot(format!(
                "friction {}/{} must be finite and non-negative",
                snapshot.static_friction, snapshot.dynamic_friction
            )));
        }
        let state_finite = snapshot.position.is_finite()
            && snapshot.angle.is_finite()
            && snapshot.linear_velocity.is_finite()
            && snapshot.angular_velocity.is_finite()
            && snapshot.force.is_finite();
        if !state_finite {
            return Err(PhysicsError::InvalidSnapshot(
                "non-finite position, velocity or force".to_string(),
            ));
        }

        let mut body = Self::create(
            snapshot.shape.rebuilt(),
            snapshot.position,
            snapshot.density,
            snapshot.is_static,
            snapshot.restitution,
        )?;
        body.static_friction = snapshot.static_friction;
        body.dynamic_friction = snapshot.dynamic_friction;
        body.angle = snapshot.angle;
        body.linear_velocity = snapshot.linear_velocity;
        body.angular_velocity = snapshot.angular_velocity;
        body.force = snapshot.force;
        Ok(body)
    }
}

impl Body {
    /// Create a circle body. Fails if its area or density is out of bounds.
    pub fn create_circle(
        radius: f32,
        position: Vec2,
        density: f32,
        is_static: bool,
        restitution: f32,
    ) -> PhysicsResult<Self> {
        Self::create(Shape::circle(radius), position, density, is_static, restitution)
    }

    /// Create a box body. Fails if its area or density is out of bounds.
    pub fn create_box(
        width: f32,
        height: f32,
        position: Vec2,
        density: f32,
        is_static: bool,
        restitution: f32,
    ) -> PhysicsResult<Self> {
        Self::create(
            Shape::rectangle(width, height),
            position,
            density,
            is_static,
            restitution,
        )
    }

    fn create(
        shape: Shape,
        position: Vec2,
        density: f32,
        is_static: bool,
        restitution: f32,
    ) -> PhysicsResult<Self> {
        shape.validate()?;
        let area = shape.area();
        if !check_range(area, MIN_BODY_SIZE..=MAX_BODY_SIZE) {
            return Err(PhysicsError::InvalidBodySize {
                area,
                min: MIN_BODY_SIZE,
                max: MAX_BODY_SIZE,
            });
        }
        if !check_range(density, MIN_DENSITY..=MAX_DENSITY) {
            return Err(PhysicsError::InvalidDensity {
                density,
                min: MIN_DENSITY,
                max: MAX_DENSITY,
            });
        }

        let (mass, inertia) = if is_static {
            (0.0, 0.0)
        } else {
            let mass = area * density;
            (mass, shape.inertia(mass))
        };
        let (inv_mass, inv_inertia) = if is_static {
            (0.0, 0.0)
        } else {
            (1.0 / mass, 1.0 / inertia)
        };

        Ok(Self {
            shape,
            is_static,
            density,
            area,
            mass,
            inv_mass,
            inertia,
            inv_inertia,
            restitution: restitution.clamp(0.0, 1.0),
            static_friction: DEFAULT_STATIC_FRICTION,
            dynamic_friction: DEFAULT_DYNAMIC_FRICTION,
            position,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            transformed_vertices: Cell::new(None),
            aabb: Cell::new(None),
        })
    }

    /// Override the friction coefficients (negative values become zero)
    pub fn with_friction(mut self, static_friction: f32, dynamic_friction: f32) -> Self {
        self.static_friction = static_friction.max(0.0);
        self.dynamic_friction = dynamic_friction.max(0.0);
        self
    }

    // === Accessors ===

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn static_friction(&self) -> f32 {
        self.static_friction
    }

    pub fn dynamic_friction(&self) -> f32 {
        self.dynamic_friction
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Orientation in radians
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn transform(&self) -> Transform2D {
        Transform2D::new(self.position, self.angle)
    }

    // === Velocity and force ===

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.angular_velocity = angular_velocity;
    }

    /// Accumulate a force, applied and cleared on the next step
    pub fn add_force(&mut self, amount: Vec2) {
        self.force += amount;
    }

    /// Velocity of a point offset by `r` from the center of mass
    #[inline]
    pub fn velocity_at(&self, r: Vec2) -> Vec2 {
        self.linear_velocity + r.perp() * self.angular_velocity
    }

    /// Apply an impulse at offset `r` from the center of mass
    #[inline]
    pub(crate) fn apply_impulse(&mut self, impulse: Vec2, r: Vec2) {
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += cross(r, impulse) * self.inv_inertia;
    }

    // === Pose ===

    pub fn move_by(&mut self, amount: Vec2) {
        self.position += amount;
        self.invalidate();
    }

    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
        self.invalidate();
    }

    pub fn rotate(&mut self, amount: f32) {
        self.angle += amount;
        self.invalidate_rotation();
    }

    pub fn rotate_to(&mut self, angle: f32) {
        self.angle = angle;
        self.invalidate_rotation();
    }

    /// Integrate one sub-step of `dt / iterations`. Static bodies do not move.
    pub fn step(&mut self, gravity: Vec2, iterations: u32, dt: f32) {
        if self.is_static {
            return;
        }

        let dt = dt / iterations.max(1) as f32;

        self.linear_velocity += self.force * self.inv_mass * dt;
        self.linear_velocity += gravity * dt;

        self.position += self.linear_velocity * dt;
        self.angle += self.angular_velocity * dt;

        self.force = Vec2::ZERO;
        self.invalidate();
    }

    fn invalidate(&self) {
        self.transformed_vertices.set(None);
        self.aabb.set(None);
    }

    /// A circle's bounds do not depend on its angle
    fn invalidate_rotation(&self) {
        self.transformed_vertices.set(None);
        if !self.shape.is_circle() {
            self.aabb.set(None);
        }
    }

    // === Cached geometry ===

    /// World-space corners of a box body (`None` for circles)
    pub fn transformed_vertices(&self) -> Option<[Vec2; BOX_VERTEX_COUNT]> {
        let Shape::Box { vertices, .. } = self.shape else {
            return None;
        };
        if let Some(cached) = self.transformed_vertices.get() {
            return Some(cached);
        }

        let transform = self.transform();
        let transformed = vertices.map(|v| transform.apply(v));
        self.transformed_vertices.set(Some(transformed));
        Some(transformed)
    }

    /// World-space bounding box
    pub fn aabb(&self) -> Aabb {
        if let Some(cached) = self.aabb.get() {
            return cached;
        }

        let aabb = match self.shape {
            Shape::Circle { radius } => Aabb {
                min: self.position - Vec2::splat(radius),
                max: self.position + Vec2::splat(radius),
            },
            Shape::Box { .. } => match self.transformed_vertices() {
                Some(vertices) => Aabb::from_points(&vertices),
                None => Aabb::from_points(&[]),
            },
        };
        self.aabb.set(Some(aabb));
        aabb
    }
}
