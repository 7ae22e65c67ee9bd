//! Seeded body spawning and the demo scene
//!
//! Randomness goes through a seeded PCG so a run can be replayed from its seed.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::Body;
use super::world::World;
use crate::error::PhysicsResult;
use crate::settings::WorldSettings;

/// Density of spawned bodies (roughly water)
const SPAWN_DENSITY: f32 = 1.0;
/// Restitution of spawned bodies
const SPAWN_RESTITUTION: f32 = 0.5;

/// Height of the demo ground strip
const GROUND_HEIGHT: f32 = 3.0;
/// Gap between the view edge and the ground strip ends
const GROUND_MARGIN: f32 = 2.0;

/// Produces randomly sized dynamic bodies from a fixed seed
#[derive(Debug, Clone)]
pub struct Spawner {
    seed: u64,
    rng: Pcg32,
    spawned: u64,
}

impl Spawner {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            spawned: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Bodies produced so far
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Box with whole-unit sides of 1 or 2
    pub fn random_box(&mut self, position: Vec2) -> PhysicsResult<Body> {
        let width = self.rng.random_range(1..=2u32) as f32;
        let height = self.rng.random_range(1..=2u32) as f32;
        let body = Body::create_box(width, height, position, SPAWN_DENSITY, false, SPAWN_RESTITUTION)?;
        self.spawned += 1;
        Ok(body)
    }

    /// Circle with radius 0.5 or 1.5
    pub fn random_circle(&mut self, position: Vec2) -> PhysicsResult<Body> {
        let radius = self.rng.random_range(0..=1u32) as f32 + 0.5;
        let body = Body::create_circle(radius, position, SPAWN_DENSITY, false, SPAWN_RESTITUTION)?;
        self.spawned += 1;
        Ok(body)
    }

    /// Either a box or a circle, with even odds
    pub fn random_body(&mut self, position: Vec2) -> PhysicsResult<Body> {
        if self.rng.random_bool(0.5) {
            self.random_box(position)
        } else {
            self.random_circle(position)
        }
    }

    /// Uniform point in `[min, max)` on both axes
    pub fn random_point(&mut self, min: Vec2, max: Vec2) -> Vec2 {
        Vec2::new(
            self.rng.random_range(min.x..max.x),
            self.rng.random_range(min.y..max.y),
        )
    }
}

/// Static scene for a view `view_width` wide centered on the origin:
/// a ground strip below the origin and two tilted ledges above it.
pub fn demo_world(view_width: f32, settings: WorldSettings) -> PhysicsResult<World> {
    let mut world = World::new(settings);

    let ground_width = view_width - 2.0 * GROUND_MARGIN;
    let ground = Body::create_box(
        ground_width,
        GROUND_HEIGHT,
        Vec2::new(0.0, -10.0),
        SPAWN_DENSITY,
        true,
        SPAWN_RESTITUTION,
    )?;
    world.add_body(ground);

    let mut left_ledge = Body::create_box(
        20.0,
        2.0,
        Vec2::new(-10.0, 3.0),
        SPAWN_DENSITY,
        true,
        SPAWN_RESTITUTION,
    )?;
    left_ledge.rotate(-TAU / 20.0);
    world.add_body(left_ledge);

    let mut right_ledge = Body::create_box(
        15.0,
        2.0,
        Vec2::new(10.0, 10.0),
        SPAWN_DENSITY,
        true,
        SPAWN_RESTITUTION,
    )?;
    right_ledge.rotate(TAU / 20.0);
    world.add_body(right_ledge);

    log::debug!(
        "Demo world ready: {} static bodies, ground {:.1} wide",
        world.body_count(),
        ground_width
    );
    Ok(world)
}
