//! Fixed-step time integrators for the N-body system
//!
//! Every frame builds a fresh quadtree from the live bodies, evaluates forces
//! against it, advances the bodies and then drops the tree. Two schemes are
//! provided:
//!
//! - [`leapfrog_step`]: two force passes against the *same* tree; the
//!   second kick starts again from the start-of-frame velocity
//! - [`kick_drift_kick_step`]: textbook kick-drift-kick, rebuilding the tree
//!   after the drift and kicking from the half-step velocity
//!
//! Bodies outside the universe region are left out of the tree and receive
//! no force that frame; they keep drifting with their current velocity.

use log::trace;

use crate::configuration::config::IntegratorConfig;
use crate::simulation::barnes_hut::SpatialIndex;
use crate::simulation::engine::Engine;
use crate::simulation::error::Result;
use crate::simulation::params::Parameters;
use crate::simulation::region::Region;
use crate::simulation::states::{Body, StepOrigin, System};

/// What one frame did, for logging and benchmarks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub indexed: usize, // bodies inserted into the tree
    pub excluded: usize, // bodies outside the universe
    pub nodes: usize, // tree nodes
    pub depth: usize, // deepest tree level
    pub interactions: usize, // force-law evaluations over both passes
}

/// Advance `sys` by one frame with the scheme chosen in `engine`
pub fn advance(sys: &mut System, engine: &Engine, params: &Parameters) -> Result<StepStats> {
    match engine.integrator {
        IntegratorConfig::Leapfrog => leapfrog_step(sys, engine.universe, params),
        IntegratorConfig::KickDriftKick => kick_drift_kick_step(sys, engine.universe, params),
    }
}

/// Advance the system by one frame with the two-stage leapfrog.
///
/// 1. Build the tree and evaluate F(x_n).
/// 2. v' = v_n + F/m * dt/2, x_{n+1} = x_n + v' dt.
/// 3. Evaluate F again at x_{n+1} against the tree from step 1. Leaves see
///    the drifted bodies, internal aggregates still hold x_n.
/// 4. v_{n+1} = v_n + F/m * dt/2, position stays x_{n+1}.
///
/// # Errors
/// Propagates [`crate::simulation::error::IndexError`] from tree construction.
pub fn leapfrog_step(sys: &mut System, universe: Region, params: &Parameters) -> Result<StepStats> {
    if sys.bodies.is_empty() { // no bodies, return
        return Ok(StepStats::default());
    }
    let dt = params.dt;

    let members = membership(&sys.bodies, &universe);
    let index = SpatialIndex::build(universe, &sys.bodies, params.max_depth)?;

    // forces at time t
    let mut interactions = evaluate_forces(&index, &members, &mut sys.bodies, params);

    // half kick + full drift, keeping v_n for the second stage
    let origins: Vec<StepOrigin> = sys.bodies.iter_mut().map(|b| b.step(dt)).collect();

    // forces at the drifted positions, same tree
    interactions += evaluate_forces(&index, &members, &mut sys.bodies, params);

    // second kick from v_n; the drift computed here is discarded
    for (b, origin) in sys.bodies.iter_mut().zip(origins.iter()) {
        b.v = origin.velocity;
        let drifted = b.step(dt);
        b.x = drifted.position;
    }

    sys.t += dt;

    let stats = StepStats {
        indexed: index.len(),
        excluded: sys.bodies.len() - index.len(),
        nodes: index.node_count(),
        depth: index.depth(),
        interactions,
    };
    trace!("leapfrog frame t = {}: {:?}", sys.t, stats);
    Ok(stats)
}

/// Advance the system by one frame with kick-drift-kick.
///
/// v_{n+1/2} = v_n + F(x_n)/m * dt/2
/// x_{n+1}   = x_n + v_{n+1/2} dt
/// v_{n+1}   = v_{n+1/2} + F(x_{n+1})/m * dt/2
///
/// The tree is rebuilt from x_{n+1} before the second evaluation. If that
/// rebuild fails, positions and velocities are restored to frame n before
/// the error is returned.
pub fn kick_drift_kick_step(sys: &mut System, universe: Region, params: &Parameters) -> Result<StepStats> {
    if sys.bodies.is_empty() {
        return Ok(StepStats::default());
    }
    let dt = params.dt;
    let half_dt = 0.5 * dt;

    let members = membership(&sys.bodies, &universe);
    let mut index = SpatialIndex::build(universe, &sys.bodies, params.max_depth)?;
    let mut interactions = evaluate_forces(&index, &members, &mut sys.bodies, params);

    // kick + drift
    let origins: Vec<StepOrigin> = sys.bodies.iter_mut().map(|b| b.step(dt)).collect();

    let members = membership(&sys.bodies, &universe);
    if let Err(err) = index.rebuild(&sys.bodies) {
        for (b, origin) in sys.bodies.iter_mut().zip(origins) {
            b.x = origin.position;
            b.v = origin.velocity;
        }
        return Err(err.into());
    }
    interactions += evaluate_forces(&index, &members, &mut sys.bodies, params);

    // second kick from the half-step velocity
    for b in sys.bodies.iter_mut() {
        b.v += (b.f / b.m) * half_dt;
    }

    sys.t += dt;

    let stats = StepStats {
        indexed: index.len(),
        excluded: sys.bodies.len() - index.len(),
        nodes: index.node_count(),
        depth: index.depth(),
        interactions,
    };
    trace!("kdk frame t = {}: {:?}", sys.t, stats);
    Ok(stats)
}

// helpers ==============================================================================

/// Which bodies the tree built from the current positions will hold
fn membership(bodies: &[Body], universe: &Region) -> Vec<bool> {
    bodies.iter().map(|b| universe.contains(&b.x)).collect()
}

/// Reset every accumulator, then let each tree member query the tree
fn evaluate_forces(index: &SpatialIndex, members: &[bool], bodies: &mut [Body], params: &Parameters) -> usize {
    let mut interactions = 0;

    for i in 0..bodies.len() {
        bodies[i].reset_force();
        if members[i] {
            interactions += index.apply_forces(i, bodies, params);
        }
    }

    interactions
}
