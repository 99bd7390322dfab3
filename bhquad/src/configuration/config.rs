//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – integration scheme, opening angle, universe region
//! - [`ParametersConfig`] – time step and physical constants
//! - [`BodyConfig`]       – initial state for each explicit body
//! - [`PopulationConfig`] – parameters for a randomly seeded cluster
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example scenario YAML matching these types:
//!
//! ```yaml
//! engine:
//!   integrator: "leapfrog"  # or "kdk"
//!   theta: 1.25             # opening angle
//!   max_depth: 64           # quadtree depth bound
//!   universe:
//!     center: [0.0, 0.0]
//!     length: 1.0e6
//!
//! parameters:
//!   dt: 0.25                # fixed step size
//!   steps: 2000             # frames for a headless run
//!   eps: 25000.0            # softening length
//!   G: 6.6743e-11           # gravitational constant
//!   log_every: 100          # frames between summaries
//!
//! bodies:
//!   - m: 1.0e16
//!     x: [ -1.0e5, 0.0 ]
//!     v: [ 0.0, 0.0 ]
//! ```
//!
//! Instead of (or in addition to) `bodies`, a `population` section seeds a
//! random cluster; see [`PopulationConfig`].

use serde::Deserialize;

use crate::simulation::region::Region;

/// Which integration scheme the engine uses
/// `integrator: "leapfrog"` or `integrator: "kdk"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegratorConfig {
    #[default]
    #[serde(rename = "leapfrog")] // Two-stage leapfrog reusing one tree per frame, second kick based on the start-of-frame velocity
    Leapfrog,

    #[serde(rename = "kdk")] // Textbook kick-drift-kick, tree rebuilt after the drift
    KickDriftKick,
}

impl std::str::FromStr for IntegratorConfig {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leapfrog" => Ok(IntegratorConfig::Leapfrog),
            "kdk" => Ok(IntegratorConfig::KickDriftKick),
            other => Err(format!("unknown integrator `{other}`, expected `leapfrog` or `kdk`")),
        }
    }
}

/// High-level engine configuration
#[derive(Deserialize, Debug, Clone, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub integrator: IntegratorConfig, // Time integrator used for advancing the system state
    pub theta: Option<f64>, // Node side / distance below which a subtree is replaced by its center of mass
    pub max_depth: Option<usize>, // Deepest subdivision before insertion fails
    pub universe: Option<Region>, // Square the tree covers; derived from `population.radius` when absent
}

/// Global numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub dt: f64, // time step size
    pub steps: usize, // frames to run
    pub eps: f64, // softening length
    pub G: f64, // gravitational constant
    pub log_every: Option<usize>, // frames between log summaries
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub m: f64, // Mass of the body
    pub x: Vec<f64>, // Initial position vector `x` in simulation units
    pub v: Vec<f64>, // Initial velocity vector `v` in simulation units per time unit
}

/// Random cluster: one heavy central body plus `count - 1` bodies scattered
/// around it with a heavy-tailed radial profile
#[derive(Deserialize, Debug, Clone)]
pub struct PopulationConfig {
    pub count: usize, // total bodies including the central one
    pub radius: f64, // length scale of the cluster
    pub min_mass: f64,
    pub max_mass: f64,
    pub min_velocity: f64,
    pub max_velocity: f64,
    pub seed: u64, // deterministic seed to make runs reproducible
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig, // Engine-level configuration
    pub parameters: ParametersConfig, // Global numerical and physical parameters
    #[serde(default)]
    pub bodies: Vec<BodyConfig>, // Explicit bodies
    pub population: Option<PopulationConfig>, // Randomly seeded bodies
}

impl ScenarioConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}
