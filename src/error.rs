//! Error types for body creation, lookup and configuration

use thiserror::Error;

/// Result alias used across the crate
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// Errors returned by body factories, world lookups and settings parsing.
///
/// None of these are fatal to a [`World`](crate::World): a failed lookup or a
/// rejected body leaves the simulation untouched.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Body area falls outside the allowed range
    #[error("body area {area} is outside [{min}, {max}]")]
    InvalidBodySize { area: f32, min: f32, max: f32 },

    /// Body density falls outside the allowed range
    #[error("body density {density} is outside [{min}, {max}]")]
    InvalidDensity { density: f32, min: f32, max: f32 },

    /// Shape dimensions must be positive and finite
    #[error("invalid shape dimensions: {0}")]
    InvalidShape(String),

    /// No live body at the given index or handle
    #[error("body not found")]
    BodyNotFound,

    /// A deserialized world or body breaks an arena or body invariant
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Settings JSON could not be parsed or written
    #[error("invalid world settings: {0}")]
    Settings(#[from] serde_json::Error),
}
