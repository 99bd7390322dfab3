//! Core state types for the N-body simulation.
//!
//! Defines the 2D body/system structs:
//! - `Body`   one point mass with its force accumulator
//! - `System` the live, ordered collection of bodies plus the time `t`
//!
//! Bodies are created once when a scenario is built and mutated in place by
//! the integrator every frame. Aggregate bodies (see
//! [`Body::combine_as_center_of_mass`]) only ever live inside a spatial index.

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub m: f64, // mass
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub f: NVec2, // accumulated force
}

/// Position and velocity saved by [`Body::step`] before it moved the body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOrigin {
    pub velocity: NVec2,
    pub position: NVec2,
}

impl Body {
    /// New body at rest with respect to forces (accumulator zeroed)
    pub fn new(m: f64, x: NVec2, v: NVec2) -> Self {
        Self {
            m,
            x,
            v,
            f: NVec2::zeros(),
        }
    }

    pub fn mass(&self) -> f64 {
        self.m
    }

    pub fn position(&self) -> NVec2 {
        self.x
    }

    pub fn velocity(&self) -> NVec2 {
        self.v
    }

    pub fn force(&self) -> NVec2 {
        self.f
    }

    pub fn reset_force(&mut self) {
        self.f = NVec2::zeros();
    }

    /// Merge this body with `other` into a synthetic body at their center of mass.
    ///
    /// Mass is summed, position and velocity are mass-weighted averages and the
    /// force is zero. With no `other` the body is returned unchanged.
    pub fn combine_as_center_of_mass(&self, other: Option<&Body>) -> Body {
        let Some(other) = other else {
            return self.clone();
        };

        let m = self.m + other.m;
        let x = (self.x * self.m + other.x * other.m) / m;
        let v = (self.v * self.m + other.v * other.m) / m;

        Body {
            m,
            x,
            v,
            f: NVec2::zeros(),
        }
    }

    /// Euclidean distance between the two bodies' positions
    pub fn distance_to(&self, other: &Body) -> f64 {
        (self.x - other.x).norm()
    }

    /// Half kick followed by a full drift.
    ///
    /// v <- v + (f / m) * dt / 2
    /// x <- x + v * dt
    ///
    /// Returns the velocity and position the body had before the update so
    /// the integrator can rewind either of them.
    pub fn step(&mut self, dt: f64) -> StepOrigin {
        let origin = StepOrigin {
            velocity: self.v,
            position: self.x,
        };

        self.v += (self.f / self.m) * dt * 0.5;
        self.x = self.v * dt + origin.position;

        origin
    }
}

#[derive(Debug, Clone)]
pub struct System {
    pub bodies: Vec<Body>, // live collection of bodies
    pub t: f64, // time
}

impl System {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self { bodies, t: 0.0 }
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(|b| b.m).sum()
    }

    pub fn total_momentum(&self) -> NVec2 {
        self.bodies
            .iter()
            .fold(NVec2::zeros(), |acc, b| acc + b.v * b.m)
    }

    /// Mass-weighted mean position, `None` for an empty system
    pub fn center_of_mass(&self) -> Option<NVec2> {
        let m = self.total_mass();
        if self.bodies.is_empty() || m <= 0.0 {
            return None;
        }
        let weighted = self
            .bodies
            .iter()
            .fold(NVec2::zeros(), |acc, b| acc + b.x * b.m);
        Some(weighted / m)
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .map(|b| 0.5 * b.m * b.v.norm_squared())
            .sum()
    }
}
