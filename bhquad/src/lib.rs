pub mod simulation;
pub mod configuration;
pub mod benchmark;

pub use simulation::states::{Body, System, NVec2, StepOrigin};
pub use simulation::params::Parameters;
pub use simulation::engine::Engine;
pub use simulation::region::{Region, Quadrant};
pub use simulation::barnes_hut::{SpatialIndex, IndexNode, NodeKind};
pub use simulation::forces::{pairwise_force, direct_forces};
pub use simulation::integrator::{advance, leapfrog_step, kick_drift_kick_step, StepStats};
pub use simulation::scenario::{Scenario, random_population};
pub use simulation::error::{IndexError, ConfigError, SimulationError};

pub use configuration::config::{IntegratorConfig, EngineConfig, ParametersConfig, BodyConfig, PopulationConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_forces, bench_steps};
