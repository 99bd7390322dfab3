//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! `Scenario` containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - system state (`System` with bodies at t = 0)
//!
//! Bodies come from the explicit `bodies` list, from a randomly seeded
//! `population`, or both. The configuration is kept so the population can be
//! replaced wholesale by [`Scenario::reinitialize`].

use std::f64::consts::PI;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::config::{BodyConfig, PopulationConfig, ScenarioConfig};
use crate::simulation::engine::Engine;
use crate::simulation::error::ConfigError;
use crate::simulation::params::{Parameters, DEFAULT_MAX_DEPTH, DEFAULT_THETA};
use crate::simulation::region::Region;
use crate::simulation::states::{Body, NVec2, System};

/// Fully-initialized simulation scenario
///
/// This is the main "runtime bundle" constructed from a [`ScenarioConfig`]:
/// the engine settings, parameters and current system state
#[derive(Debug, Clone)]
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub system: System,
    config: ScenarioConfig,
    generation: u64, // number of reinitializations, perturbs the seed
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, ConfigError> {
        // Parameters (runtime) from ParametersConfig + engine knobs
        let p_cfg = &cfg.parameters;
        let parameters = Parameters {
            dt: p_cfg.dt,
            steps: p_cfg.steps,
            eps: p_cfg.eps,
            G: p_cfg.G,
            theta: cfg.engine.theta.unwrap_or(DEFAULT_THETA),
            max_depth: cfg.engine.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        };
        parameters.validate()?;

        let bodies = initial_bodies(&cfg, 0)?;

        // Universe: explicit, else sized from the population, else around the bodies
        let universe = match (cfg.engine.universe, &cfg.population) {
            (Some(universe), _) => universe,
            (None, Some(pop)) => Region::new(NVec2::zeros(), pop.radius * 4.0),
            (None, None) => enclosing_region(&bodies),
        };

        let engine = Engine {
            integrator: cfg.engine.integrator,
            universe,
        };

        info!(
            "scenario built: {} bodies, {:?} integrator, universe side {} at ({}, {})",
            bodies.len(),
            engine.integrator,
            universe.length(),
            universe.center().x,
            universe.center().y
        );

        Ok(Self {
            engine,
            parameters,
            system: System::new(bodies),
            config: cfg,
            generation: 0,
        })
    }

    /// Replace every body with a freshly seeded population and reset time.
    pub fn reinitialize(&mut self) -> Result<(), ConfigError> {
        self.generation += 1;
        let bodies = initial_bodies(&self.config, self.generation)?;
        info!("simulation reinitialized with {} bodies", bodies.len());
        self.system = System::new(bodies);
        Ok(())
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }
}

/// Explicit bodies followed by the random population, if any
fn initial_bodies(cfg: &ScenarioConfig, generation: u64) -> Result<Vec<Body>, ConfigError> {
    let mut bodies = cfg
        .bodies
        .iter()
        .enumerate()
        .map(|(i, bc)| body_from_config(i, bc))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(pop) = &cfg.population {
        validate_population(pop)?;
        let mut rng = StdRng::seed_from_u64(pop.seed.wrapping_add(generation));
        bodies.extend(random_population(pop, &mut rng));
    }

    if bodies.is_empty() {
        return Err(ConfigError::NoBodies);
    }
    Ok(bodies)
}

// Bodies: map `BodyConfig` -> runtime `Body` using nalgebra vectors
fn body_from_config(index: usize, bc: &BodyConfig) -> Result<Body, ConfigError> {
    if !(bc.m > 0.0) || !bc.m.is_finite() {
        return Err(ConfigError::InvalidBody {
            index,
            reason: format!("mass must be positive, got {}", bc.m),
        });
    }
    let x = vec2(&bc.x, &format!("bodies[{index}].x"))?;
    let v = vec2(&bc.v, &format!("bodies[{index}].v"))?;
    Ok(Body::new(bc.m, x, v))
}

fn vec2(values: &[f64], field: &str) -> Result<NVec2, ConfigError> {
    match values {
        [x, y] => Ok(NVec2::new(*x, *y)),
        _ => Err(ConfigError::BadVector {
            field: field.to_string(),
            len: values.len(),
        }),
    }
}

fn validate_population(pop: &PopulationConfig) -> Result<(), ConfigError> {
    if !(pop.min_mass > 0.0) || pop.max_mass < pop.min_mass {
        return Err(ConfigError::InvalidParameter(format!(
            "population masses must satisfy 0 < min_mass <= max_mass, got [{}, {}]",
            pop.min_mass, pop.max_mass
        )));
    }
    if pop.max_velocity < pop.min_velocity {
        return Err(ConfigError::InvalidParameter(format!(
            "population velocity range is empty: [{}, {}]",
            pop.min_velocity, pop.max_velocity
        )));
    }
    if !(pop.radius > 0.0) {
        return Err(ConfigError::InvalidParameter(format!("population radius must be positive, got {}", pop.radius)));
    }
    Ok(())
}

/// Seed a cluster around the origin.
///
/// The first body is a heavy center (`1.25 * max_mass`) at the origin moving
/// with `(max_velocity, min_velocity)`. The remaining `count - 1` bodies get
/// a uniform mass and velocity and a heavy-tailed radial distance
/// `r = ((1 / (u1 u2 + 1e-7))² - 1)^(-1/2) * radius` at a uniform angle, with
/// `u1, u2, u3` uniform in `[-1, 1)`.
pub fn random_population<R: Rng>(cfg: &PopulationConfig, rng: &mut R) -> Vec<Body> {
    let mut bodies = Vec::with_capacity(cfg.count);
    if cfg.count == 0 {
        return bodies;
    }

    bodies.push(Body::new(
        1.25 * cfg.max_mass,
        NVec2::zeros(),
        NVec2::new(cfg.max_velocity, cfg.min_velocity),
    ));

    for _ in 1..cfg.count {
        let m = uniform(rng, cfg.min_mass, cfg.max_mass);

        let u1: f64 = rng.gen_range(-1.0..1.0);
        let u2: f64 = rng.gen_range(-1.0..1.0);
        let r = ((1.0 / (u1 * u2 + 1e-7)).powi(2) - 1.0).powf(-0.5);
        let phi = rng.gen_range(-1.0f64..1.0) * 2.0 * PI;
        let x = NVec2::new(r * phi.cos() * cfg.radius, r * phi.sin() * cfg.radius);

        let v = NVec2::new(
            uniform(rng, cfg.min_velocity, cfg.max_velocity),
            uniform(rng, cfg.min_velocity, cfg.max_velocity),
        );

        bodies.push(Body::new(m, x, v));
    }

    bodies
}

// gen_range panics on an empty range, so a degenerate one yields its bound
fn uniform<R: Rng>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

/// Square centered on the bodies' bounding box, four times its larger half-extent
fn enclosing_region(bodies: &[Body]) -> Region {
    let mut min = NVec2::new(f64::INFINITY, f64::INFINITY);
    let mut max = NVec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);

    for b in bodies {
        min.x = min.x.min(b.x.x);
        min.y = min.y.min(b.x.y);
        max.x = max.x.max(b.x.x);
        max.y = max.y.max(b.x.y);
    }

    let center = (min + max) * 0.5;
    let half = (max - min) * 0.5;
    let max_half = half.x.max(half.y);
    let length = if max_half > 0.0 { max_half * 4.0 } else { 1.0 };

    Region::new(center, length)
}
