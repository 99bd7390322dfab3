//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - integration step size and number of frames for a headless run,
//! - softening length and gravitational constant (`eps`, `G`),
//! - the opening angle `theta` and the tree depth bound `max_depth`
//!
//! A `Parameters` value is passed explicitly into the index and the
//! integrator; nothing here is process-wide state.

use crate::simulation::error::ConfigError;

/// Default opening angle, ~1 per Barnes & Hut
pub const DEFAULT_THETA: f64 = 1.25;

/// Default bound on quadtree depth before insertion gives up
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Parameters {
    pub dt: f64, // time step
    pub steps: usize, // frames to run
    pub eps: f64, // softening length
    pub G: f64, // gravitational constant
    pub theta: f64, // opening angle threshold
    pub max_depth: usize, // deepest subdivision allowed
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            dt: 0.25,
            steps: 1000,
            eps: 25_000.0,
            G: 6.6743e-11,
            theta: DEFAULT_THETA,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Parameters {
    /// Reject values the integrator and force law cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(ConfigError::InvalidParameter(format!("dt must be positive, got {}", self.dt)));
        }
        if !(self.theta > 0.0) {
            return Err(ConfigError::InvalidParameter(format!("theta must be positive, got {}", self.theta)));
        }
        if !(self.eps >= 0.0) {
            return Err(ConfigError::InvalidParameter(format!("eps must be non-negative, got {}", self.eps)));
        }
        if !self.G.is_finite() {
            return Err(ConfigError::InvalidParameter(format!("G must be finite, got {}", self.G)));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidParameter("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }
}
