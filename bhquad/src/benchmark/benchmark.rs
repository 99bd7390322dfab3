use std::hint::black_box;
use std::time::Instant;

use log::info;

use crate::simulation::barnes_hut::SpatialIndex;
use crate::simulation::error::Result;
use crate::simulation::forces::direct_forces;
use crate::simulation::integrator::leapfrog_step;
use crate::simulation::params::Parameters;
use crate::simulation::region::Region;
use crate::simulation::states::{Body, NVec2, System};

/// Time one force evaluation, direct O(N²) vs quadtree, for growing N
pub fn bench_forces() -> Result<()> {
    // Different system sizes to test
    let ns = [200, 400, 800, 1600, 3200, 6400];

    for n in ns {
        let mut sys = make_system(n);
        let params = make_params();
        let universe = make_universe();

        // Warm up
        black_box(direct_forces(black_box(&sys.bodies), &params));

        // Time direct
        let t0 = Instant::now();
        black_box(direct_forces(black_box(&sys.bodies), &params));
        let dt_direct = t0.elapsed().as_secs_f64();

        // Time barnes-hut, including the tree build
        let t1 = Instant::now();
        let index = SpatialIndex::build(universe, &sys.bodies, params.max_depth)?;
        let mut interactions = 0;
        for i in 0..sys.bodies.len() {
            sys.bodies[i].reset_force();
            interactions += index.apply_forces(i, &mut sys.bodies, &params);
        }
        black_box(&sys.bodies);
        let dt_bh = t1.elapsed().as_secs_f64();

        info!(
            "N = {n:5}, direct = {:8.6} s, BH = {:8.6} s, nodes = {}, interactions = {}",
            dt_direct,
            dt_bh,
            index.node_count(),
            interactions
        );
    }
    Ok(())
}

/// Time whole leapfrog frames for growing N
pub fn bench_steps() -> Result<()> {
    let ns = [200, 400, 800, 1600, 3200, 6400, 12800];
    let steps = 2; // frames per size

    for n in ns {
        let mut sys = make_system(n);
        let params = make_params();
        let universe = make_universe();

        // Warm-up
        leapfrog_step(&mut sys, universe, &params)?;

        let t0 = Instant::now();
        for _ in 0..steps {
            leapfrog_step(&mut sys, universe, &params)?;
        }
        let per_step = t0.elapsed().as_secs_f64() / steps as f64;

        info!("N = {:5}, BH step = {:8.6} s", n, per_step);
    }
    Ok(())
}

/// Helper to build a manual System of size `n`
fn make_system(n: usize) -> System {
    let mut bodies = Vec::with_capacity(n);

    for i in 0..n {
        let i_f = i as f64;
        // deterministic positions, no rand needed
        let x = NVec2::new((i_f * 0.37).sin() * 5.0, (i_f * 0.13).cos() * 5.0);
        bodies.push(Body::new(1.0, x, NVec2::zeros()));
    }

    System::new(bodies)
}

fn make_params() -> Parameters {
    Parameters {
        dt: 0.001,
        steps: 0,
        eps: 1e-2,
        G: 0.1,
        theta: 0.7,
        max_depth: 64,
    }
}

fn make_universe() -> Region {
    Region::new(NVec2::zeros(), 20.0)
}
