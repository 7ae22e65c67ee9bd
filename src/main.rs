//! Flat Physics headless demo
//!
//! Builds the demo scene, drops a seeded stream of boxes and circles onto it
//! and logs step timing once per simulated second. Run with
//! `RUST_LOG=info cargo run --release -- [settings.json]`.

use std::time::{Duration, Instant};

use glam::Vec2;

use flat_physics::consts::{DEFAULT_ITERATIONS, SIM_DT};
use flat_physics::sim::{Spawner, World, demo_world};
use flat_physics::{PhysicsResult, WorldSettings};

/// Width of the (virtual) camera view in world units
const VIEW_WIDTH: f32 = 64.0;
/// Bodies whose top falls below this are culled
const CULL_Y: f32 = -40.0;
/// Frames between spawns
const SPAWN_INTERVAL: u64 = 15;
/// Simulated run length
const RUN_SECONDS: u64 = 30;
const FRAMES_PER_SECOND: u64 = 60;
const SEED: u64 = 0x5eed;

/// Running step timings, reported and reset once per simulated second
#[derive(Default)]
struct StepStats {
    total: Duration,
    samples: u32,
}

impl StepStats {
    fn record(&mut self, elapsed: Duration) {
        self.total += elapsed;
        self.samples += 1;
    }

    fn take_average_ms(&mut self) -> f64 {
        let average = if self.samples == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / self.samples as f64
        };
        *self = Self::default();
        average
    }
}

fn load_settings() -> PhysicsResult<WorldSettings> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(WorldSettings::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(json) => WorldSettings::from_json(&json),
        Err(e) => {
            log::warn!("Could not read {}: {}, using defaults", path, e);
            Ok(WorldSettings::default())
        }
    }
}

fn run() -> PhysicsResult<World> {
    let settings = load_settings()?;
    log::info!(
        "Solver: {} (rotation: {}), gravity: {:?}",
        settings.solver.as_str(),
        settings.solver.uses_rotation(),
        settings.gravity
    );

    let mut world = demo_world(VIEW_WIDTH, settings)?;
    let mut spawner = Spawner::new(SEED);
    let mut stats = StepStats::default();
    let half_width = VIEW_WIDTH / 2.0 - 4.0;

    for frame in 0..RUN_SECONDS * FRAMES_PER_SECOND {
        if frame % SPAWN_INTERVAL == 0 {
            let position =
                spawner.random_point(Vec2::new(-half_width, 18.0), Vec2::new(half_width, 24.0));
            world.add_body(spawner.random_body(position)?);
        }

        let started = Instant::now();
        world.step(DEFAULT_ITERATIONS, SIM_DT);
        stats.record(started.elapsed());

        let culled = world.retain_bodies(|body| body.is_static() || body.aabb().max.y > CULL_Y);
        if culled > 0 {
            log::debug!("Frame {}: culled {} bodies", frame, culled);
        }

        if (frame + 1) % FRAMES_PER_SECOND == 0 {
            log::info!(
                "t={:>3}s  step {:.3} ms  bodies {:>3}  contacts {:>3}",
                (frame + 1) / FRAMES_PER_SECOND,
                stats.take_average_ms(),
                world.body_count(),
                world.contact_points().len()
            );
        }
    }

    log::info!("Spawned {} bodies from seed {:#x}", spawner.spawned(), spawner.seed());
    Ok(world)
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Flat Physics (headless) starting...");

    match run() {
        Ok(world) => log::info!("Finished with {} bodies", world.body_count()),
        Err(e) => {
            log::error!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Headless runner is native only; the library itself has no platform code
}
