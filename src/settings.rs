//! World settings
//!
//! Loaded from JSON by the front end; every field falls back to its default.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_GRAVITY;
use crate::error::PhysicsResult;

/// Collision response used by the world after bodies are separated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SolverKind {
    /// Single impulse through the centers of mass, no rotation
    Linear,
    /// Per-contact impulses that also change angular velocity
    Rotation,
    /// Rotational impulses followed by a Coulomb friction pass
    #[default]
    RotationAndFriction,
}

impl SolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Linear => "Linear",
            SolverKind::Rotation => "Rotation",
            SolverKind::RotationAndFriction => "RotationAndFriction",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" | "basic" => Some(SolverKind::Linear),
            "rotation" => Some(SolverKind::Rotation),
            "rotationandfriction" | "friction" | "full" => Some(SolverKind::RotationAndFriction),
            _ => None,
        }
    }

    /// Whether impulses are applied at contact points (and so spin bodies)
    pub fn uses_rotation(&self) -> bool {
        match self {
            SolverKind::Linear => false,
            SolverKind::Rotation => true,
            SolverKind::RotationAndFriction => true,
        }
    }
}

/// Simulation settings owned by a [`World`](crate::World)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Constant acceleration applied to every dynamic body
    pub gravity: Vec2,
    /// Collision response
    pub solver: SolverKind,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            solver: SolverKind::default(),
        }
    }
}

impl WorldSettings {
    /// Default settings with a different solver
    pub fn with_solver(solver: SolverKind) -> Self {
        Self {
            solver,
            ..Self::default()
        }
    }

    /// Parse settings from JSON
    pub fn from_json(json: &str) -> PhysicsResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        log::debug!(
            "Loaded world settings: gravity={:?}, solver={}",
            settings.gravity,
            settings.solver.as_str()
        );
        Ok(settings)
    }

    /// Serialize settings to JSON
    pub fn to_json(&self) -> PhysicsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
