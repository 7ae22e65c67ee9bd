//! Deterministic simulation module
//!
//! Everything that moves bodies lives here. Given the same bodies (inserted
//! in the same order), iteration count and timestep, a step is reproducible:
//! - Fixed timestep only
//! - Seeded RNG only (see [`spawn`])
//! - Stable pair order (by insertion order)
//! - No rendering or platform dependencies

pub mod aabb;
pub mod body;
pub mod collision;
pub mod contact;
pub mod math;
pub mod spawn;
pub mod world;

pub use aabb::Aabb;
pub use body::{BOX_TRIANGLES, BOX_VERTEX_COUNT, Body, Shape};
pub use collision::{Collision, collide, intersect_aabb};
pub use contact::{ContactSet, Manifold, find_contact_points};
pub use math::Transform2D;
pub use spawn::{Spawner, demo_world};
pub use world::{BodyHandle, World};
