//! Gravitational force law for the n-body engine
//!
//! Softened Newtonian gravity between two point masses, plus an exact
//! all-pairs evaluation used as the reference the quadtree approximates.

use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec2};

/// Force on a body of mass `m_target` at `x_target` due to a mass `m_other`
/// at `x_other`:
///
/// F = G * m_t * m_o / (d² + eps²)^1.5 * (x_o - x_t)
///
/// The softening length `eps` keeps the magnitude bounded as d -> 0.
#[allow(non_snake_case)]
pub fn pairwise_force(G: f64, eps: f64, m_target: f64, x_target: NVec2, m_other: f64, x_other: NVec2) -> NVec2 {
    let dx = x_target.x - x_other.x;
    let dy = x_target.y - x_other.y;
    let distance = (dx * dx + dy * dy).sqrt();

    let grav = G * (m_target * m_other) / (distance * distance + eps * eps).powf(1.5);

    grav * (x_other - x_target)
}

impl Body {
    /// Accumulate the force `other` exerts on this body
    pub fn apply_force(&mut self, other: &Body, params: &Parameters) {
        self.f += pairwise_force(params.G, params.eps, self.m, self.x, other.m, other.x);
    }
}

/// Exact O(N²) forces on every body, in body order
///
/// Each entry is the sum over all other bodies of [`pairwise_force`]. Body
/// accumulators are left untouched.
pub fn direct_forces(bodies: &[Body], params: &Parameters) -> Vec<NVec2> {
    let n = bodies.len();
    let mut out = vec![NVec2::zeros(); n];

    for i in 0..n {
        let bi = &bodies[i];
        for (j, bj) in bodies.iter().enumerate() {
            if i == j {
                continue;
            }
            out[i] += pairwise_force(params.G, params.eps, bi.m, bi.x, bj.m, bj.x);
        }
    }

    out
}
