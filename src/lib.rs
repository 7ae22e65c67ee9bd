//! Flat Physics - A 2D rigid-body physics kernel
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, collisions, contacts, world stepping)
//! - `settings`: World configuration (gravity, solver choice)
//! - `error`: Validation and lookup errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{PhysicsError, PhysicsResult};
pub use settings::{SolverKind, WorldSettings};
pub use sim::{Aabb, Body, BodyHandle, Manifold, Shape, World};

/// World configuration constants
pub mod consts {
    use glam::Vec2;

    /// Smallest allowed body area (world units², 1cm x 1cm)
    pub const MIN_BODY_SIZE: f32 = 0.01 * 0.01;
    /// Largest allowed body area (world units²)
    pub const MAX_BODY_SIZE: f32 = 64.0 * 64.0;

    /// Density bounds (g/cm³)
    pub const MIN_DENSITY: f32 = 0.5;
    pub const MAX_DENSITY: f32 = 21.4;

    /// Sub-iteration bounds for a single world step
    pub const MIN_ITERATIONS: u32 = 1;
    pub const MAX_ITERATIONS: u32 = 128;

    /// Friction coefficients given to every new body
    pub const DEFAULT_STATIC_FRICTION: f32 = 0.6;
    pub const DEFAULT_DYNAMIC_FRICTION: f32 = 0.4;

    /// Earth gravity, y axis pointing up
    pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, -9.81);

    /// Frame timestep used by the demo runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Sub-iterations per frame used by the demo runner
    pub const DEFAULT_ITERATIONS: u32 = 20;
}

