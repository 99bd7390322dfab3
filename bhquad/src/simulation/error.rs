//! Error types for the simulation core.

use thiserror::Error;

use crate::simulation::states::NVec2;

/// Failures while building the spatial index
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    /// Subdivision reached the configured depth bound, usually because two
    /// bodies share (or nearly share) a position
    #[error("quadtree depth {depth} exceeded while inserting body at ({}, {})", .position.x, .position.y)]
    MaxDepthExceeded { depth: usize, position: NVec2 },
}

/// Invalid scenario or parameter values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid body {index}: {reason}")]
    InvalidBody { index: usize, reason: String },

    #[error("expected a 2-component vector for {field}, got {len} components")]
    BadVector { field: String, len: usize },

    #[error("scenario defines neither `bodies` nor `population`")]
    NoBodies,
}

/// Failures surfaced by the step driver
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("spatial index error: {0}")]
    Index(#[from] IndexError),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
