use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use bhquad::{
    advance, direct_forces, kick_drift_kick_step, leapfrog_step, pairwise_force, random_population, Body, Engine,
    IndexError, IntegratorConfig, NVec2, NodeKind, Parameters, PopulationConfig, Quadrant, Region, Scenario,
    ScenarioConfig, SimulationError, SpatialIndex, System,
};

/// Build a simple 2-body System separated along the x-axis, both at rest
pub fn two_body_system(dist: f64, m1: f64, m2: f64) -> System {
    let b1 = Body::new(m1, NVec2::new(-dist / 2.0, 0.0), NVec2::zeros());
    let b2 = Body::new(m2, NVec2::new(dist / 2.0, 0.0), NVec2::zeros());
    System::new(vec![b1, b2])
}

/// Default physics parameters for tests
pub fn test_params() -> Parameters {
    Parameters {
        dt: 0.001,
        steps: 100,
        eps: 0.0,
        G: 0.1,
        theta: 0.5,
        max_depth: 64,
    }
}

pub fn test_universe() -> Region {
    Region::new(NVec2::zeros(), 16.0)
}

/// Random cluster inside `radius`-scaled units
pub fn cluster(count: usize, seed: u64) -> Vec<Body> {
    let cfg = PopulationConfig {
        count,
        radius: 1.0,
        min_mass: 0.5,
        max_mass: 2.0,
        min_velocity: -0.1,
        max_velocity: 0.1,
        seed,
    };
    random_population(&cfg, &mut StdRng::seed_from_u64(seed))
}

/// Tree forces on every body, accumulators reset first
fn tree_forces(index: &SpatialIndex, bodies: &mut [Body], params: &Parameters) -> Vec<NVec2> {
    for i in 0..bodies.len() {
        bodies[i].reset_force();
        index.apply_forces(i, bodies, params);
    }
    bodies.iter().map(|b| b.f).collect()
}

/// Sum of real body masses in the leaves below `node_idx`
fn subtree_mass(index: &SpatialIndex, node_idx: usize, bodies: &[Body]) -> f64 {
    let node = index.node(node_idx).unwrap();
    match &node.kind {
        NodeKind::Empty => 0.0,
        NodeKind::Leaf(i) => bodies[*i].m,
        NodeKind::Internal { children, .. } => children.iter().map(|&c| subtree_mass(index, c, bodies)).sum(),
    }
}

/// Mass-weighted position sum of real bodies below `node_idx`
fn subtree_moment(index: &SpatialIndex, node_idx: usize, bodies: &[Body]) -> NVec2 {
    let node = index.node(node_idx).unwrap();
    match &node.kind {
        NodeKind::Empty => NVec2::zeros(),
        NodeKind::Leaf(i) => bodies[*i].x * bodies[*i].m,
        NodeKind::Internal { children, .. } => children
            .iter()
            .fold(NVec2::zeros(), |acc, &c| acc + subtree_moment(index, c, bodies)),
    }
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let mut sys = two_body_system(1.0, 2.0, 3.0);
    let p = test_params();
    let index = SpatialIndex::build(test_universe(), &sys.bodies, p.max_depth).unwrap();

    let f = tree_forces(&index, &mut sys.bodies, &p);
    let net = f[0] + f[1];

    assert!(net.norm() < 1e-12, "Net force not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let mut sys = two_body_system(2.0, 1.0, 1.0);
    let p = test_params();
    let index = SpatialIndex::build(test_universe(), &sys.bodies, p.max_depth).unwrap();

    let f = tree_forces(&index, &mut sys.bodies, &p);
    let dx = sys.bodies[1].x - sys.bodies[0].x;

    assert!(f[0].dot(&dx) > 0.0, "Force is not toward second body");
    assert_eq!(f[0].y, 0.0);
}

#[test]
fn gravity_inverse_square_law() {
    let p = test_params();
    let mut sys_r = two_body_system(1.0, 1.0, 1.0);
    let mut sys_2r = two_body_system(2.0, 1.0, 1.0);

    let index_r = SpatialIndex::build(test_universe(), &sys_r.bodies, p.max_depth).unwrap();
    let index_2r = SpatialIndex::build(test_universe(), &sys_2r.bodies, p.max_depth).unwrap();

    let f_r = tree_forces(&index_r, &mut sys_r.bodies, &p);
    let f_2r = tree_forces(&index_2r, &mut sys_2r.bodies, &p);

    let ratio = f_r[0].norm() / f_2r[0].norm();
    assert_relative_eq!(ratio, 4.0, max_relative = 1e-12);
}

#[test]
fn gravity_softening_prevents_blowup() {
    let mut p = test_params();
    p.eps = 0.3;

    let mut sys = two_body_system(1e-9, 1.0, 1.0);
    let index = SpatialIndex::build(test_universe(), &sys.bodies, p.max_depth).unwrap();
    let f = tree_forces(&index, &mut sys.bodies, &p);

    assert!(f[0].norm() < 1e-6, "Softening failed; force too large");
}

// ==================================================================================
// Barnes-Hut tests
// ==================================================================================

#[test]
fn center_of_mass_of_asymmetric_pair() {
    let bodies = vec![
        Body::new(1.0, NVec2::new(0.0, 0.0), NVec2::zeros()),
        Body::new(3.0, NVec2::new(4.0, 0.0), NVec2::zeros()),
    ];
    let universe = Region::new(NVec2::new(2.0, 0.0), 8.0);
    let index = SpatialIndex::build(universe, &bodies, 64).unwrap();

    let aggregate = index.root().body(&bodies).unwrap();
    assert_eq!(aggregate.m, 4.0);
    assert_relative_eq!(aggregate.x.x, 3.0);
    assert_relative_eq!(aggregate.x.y, 0.0);
}

#[test]
fn aggregates_conserve_mass_and_center_of_mass() {
    let bodies = cluster(300, 11);
    let universe = Region::new(NVec2::zeros(), 4.0);
    let index = SpatialIndex::build(universe, &bodies, 64).unwrap();

    let inserted: f64 = bodies.iter().filter(|b| universe.contains(&b.x)).map(|b| b.m).sum();
    assert_relative_eq!(subtree_mass(&index, 0, &bodies), inserted, max_relative = 1e-12);

    let mut internal = 0;
    for (i, node) in index.nodes().iter().enumerate() {
        if let NodeKind::Internal { aggregate, .. } = &node.kind {
            internal += 1;
            let mass = subtree_mass(&index, i, &bodies);
            assert_relative_eq!(aggregate.m, mass, max_relative = 1e-12);

            let com = subtree_moment(&index, i, &bodies) / mass;
            assert_relative_eq!(aggregate.x.x, com.x, epsilon = 1e-9, max_relative = 1e-9);
            assert_relative_eq!(aggregate.x.y, com.y, epsilon = 1e-9, max_relative = 1e-9);
            assert_eq!(aggregate.f, NVec2::zeros());
        }
    }
    assert!(internal > 0);
}

#[test]
fn every_node_is_leaf_or_has_four_children() {
    let bodies = cluster(200, 3);
    let universe = Region::new(NVec2::zeros(), 4.0);
    let index = SpatialIndex::build(universe, &bodies, 64).unwrap();

    let mut leaves_with_bodies = 0;
    for node in index.nodes() {
        match node.children() {
            None => {
                assert!(node.is_leaf());
                if matches!(node.kind, NodeKind::Leaf(_)) {
                    leaves_with_bodies += 1;
                }
            }
            Some(children) => {
                assert!(!node.is_leaf());
                for q in Quadrant::ALL {
                    let child = index.node(children[q.index()]).expect("child index in arena");
                    assert_eq!(child.region, node.region.quadrant(q));
                    assert_eq!(child.depth, node.depth + 1);
                }
            }
        }
    }

    // each inserted body sits in exactly one leaf
    assert_eq!(leaves_with_bodies, index.len());
}

#[test]
fn tree_skips_bodies_outside_universe() {
    let bodies = vec![
        Body::new(1.0, NVec2::new(0.5, 0.5), NVec2::zeros()),
        Body::new(1.0, NVec2::new(100.0, 0.0), NVec2::zeros()),
        Body::new(1.0, NVec2::new(-0.5, 0.5), NVec2::zeros()),
    ];
    let index = SpatialIndex::build(Region::new(NVec2::zeros(), 2.0), &bodies, 64).unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(index.root().body(&bodies).unwrap().m, 2.0);
}

#[test]
fn sole_body_has_no_self_force() {
    let mut bodies = vec![Body::new(3.0, NVec2::new(1.0, -2.0), NVec2::zeros())];
    let p = test_params();
    let index = SpatialIndex::build(test_universe(), &bodies, p.max_depth).unwrap();

    let interactions = index.apply_forces(0, &mut bodies, &p);

    assert_eq!(interactions, 0);
    assert_eq!(bodies[0].f, NVec2::zeros());
}

#[test]
fn smaller_theta_never_opens_fewer_nodes() {
    // two well separated clusters plus a probe between them
    let mut bodies = cluster(60, 5);
    for b in bodies.iter_mut() {
        b.x = b.x * 0.1 + NVec2::new(-3.0, 2.0);
    }
    let mut right = cluster(60, 6);
    for b in right.iter_mut() {
        b.x = b.x * 0.1 + NVec2::new(3.0, -2.0);
    }
    bodies.extend(right);
    bodies.push(Body::new(1.0, NVec2::new(0.1, 0.2), NVec2::zeros()));
    let probe = bodies.len() - 1;

    let index = SpatialIndex::build(test_universe(), &bodies, 64).unwrap();

    let thetas = [2.0, 1.5, 1.0, 0.7, 0.5, 0.3, 0.1, 0.01, 0.0];
    let mut previous = 0;
    for theta in thetas {
        let p = Parameters { theta, ..test_params() };
        bodies[probe].reset_force();
        let interactions = index.apply_forces(probe, &mut bodies, &p);
        assert!(
            interactions >= previous,
            "theta {theta}: {interactions} interactions, fewer than {previous}"
        );
        previous = interactions;
    }

    // theta = 0 opens everything: one exact interaction per other indexed body
    assert_eq!(previous, index.len() - 1);
}

#[test]
fn tiny_theta_matches_direct_sum() {
    let mut bodies = cluster(150, 21);
    let universe = Region::new(NVec2::zeros(), 4.0);
    bodies.retain(|b| universe.contains(&b.x));

    let p = Parameters {
        theta: 1e-12,
        eps: 1e-3,
        ..test_params()
    };
    let index = SpatialIndex::build(universe, &bodies, p.max_depth).unwrap();

    let exact = direct_forces(&bodies, &p);
    let approx = tree_forces(&index, &mut bodies, &p);

    // only the summation order differs
    for (e, a) in exact.iter().zip(approx.iter()) {
        assert!((e - a).norm() <= 1e-9 * e.norm().max(1.0), "exact {:?} vs tree {:?}", e, a);
    }
}

#[test]
fn moderate_theta_approximates_direct_sum() {
    let mut bodies = cluster(400, 8);
    let universe = Region::new(NVec2::zeros(), 4.0);
    bodies.retain(|b| universe.contains(&b.x));

    let p = Parameters {
        theta: 0.5,
        eps: 1e-2,
        ..test_params()
    };
    let index = SpatialIndex::build(universe, &bodies, p.max_depth).unwrap();

    let exact = direct_forces(&bodies, &p);
    let approx = tree_forces(&index, &mut bodies, &p);

    let err: f64 = exact.iter().zip(approx.iter()).map(|(e, a)| (e - a).norm()).sum();
    let total: f64 = exact.iter().map(|e| e.norm()).sum();
    assert!(err / total < 0.05, "relative force error {}", err / total);
}

#[test]
fn leaves_see_live_positions_aggregates_do_not() {
    let mut bodies = vec![
        Body::new(1.0, NVec2::new(-1.0, 0.0), NVec2::zeros()),
        Body::new(1.0, NVec2::new(1.0, 0.0), NVec2::zeros()),
    ];
    let p = Parameters { theta: 0.0, ..test_params() };
    let index = SpatialIndex::build(test_universe(), &bodies, p.max_depth).unwrap();

    bodies[1].x = NVec2::new(2.0, 0.0);

    let f = index.force_on(0, &bodies, &p);
    let expected = pairwise_force(p.G, p.eps, 1.0, bodies[0].x, 1.0, bodies[1].x);
    assert_eq!(f, expected);

    // the root aggregate was taken before the move
    assert_eq!(index.root().body(&bodies).unwrap().x, NVec2::zeros());
}

#[test]
fn coincident_bodies_abort_instead_of_recursing_forever() {
    let mut sys = System::new(vec![
        Body::new(1.0, NVec2::new(0.25, 0.25), NVec2::zeros()),
        Body::new(2.0, NVec2::new(0.25, 0.25), NVec2::zeros()),
    ]);
    let p = Parameters { max_depth: 20, ..test_params() };

    let err = leapfrog_step(&mut sys, test_universe(), &p).unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Index(IndexError::MaxDepthExceeded { depth: 21, .. })
    ));
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn two_bodies_fall_symmetrically_along_x() {
    let d = 1.0;
    let m = 1.0;
    let mut sys = two_body_system(d, m, m);
    let p = test_params();

    for _ in 0..200 {
        leapfrog_step(&mut sys, test_universe(), &p).unwrap();
        assert_eq!(sys.bodies[0].x.y, 0.0);
        assert_eq!(sys.bodies[1].x.y, 0.0);
        assert_eq!(sys.bodies[0].x.x, -sys.bodies[1].x.x);
        assert_eq!(sys.bodies[0].v.x, -sys.bodies[1].v.x);
    }

    assert!(sys.bodies[0].x.x > -d / 2.0);
    assert!(sys.bodies[0].v.x > 0.0);
    assert_relative_eq!(sys.t, 200.0 * p.dt, max_relative = 1e-12);
}

#[test]
fn first_frame_displacement_matches_closed_form() {
    let d = 1.0;
    let m = 2.0;
    let p = test_params();

    for eps in [0.0, 0.2] {
        let p = Parameters { eps, ..p.clone() };
        let mut sys = two_body_system(d, m, m);
        leapfrog_step(&mut sys, test_universe(), &p).unwrap();

        let a = p.G * m * d / (d * d + eps * eps).powf(1.5);
        let expected = 0.5 * a * p.dt * p.dt;

        assert_relative_eq!(sys.bodies[0].x.x - (-d / 2.0), expected, max_relative = 1e-9);
        assert_relative_eq!(d / 2.0 - sys.bodies[1].x.x, expected, max_relative = 1e-9);
    }
}

#[test]
fn leapfrog_second_kick_starts_from_initial_velocity() {
    let m = 1.5;
    let mut sys = two_body_system(1.0, m, m);
    sys.bodies[0].v = NVec2::new(0.0, 0.3);
    sys.bodies[1].v = NVec2::new(0.0, -0.3);
    let v0 = sys.bodies[0].v;
    let p = test_params();

    leapfrog_step(&mut sys, test_universe(), &p).unwrap();

    // force at the drifted positions only, kicked from v0
    let f2 = pairwise_force(p.G, p.eps, m, sys.bodies[0].x, m, sys.bodies[1].x);
    let expected = v0 + (f2 / m) * p.dt * 0.5;

    assert_relative_eq!(sys.bodies[0].v.x, expected.x, max_relative = 1e-12);
    assert_relative_eq!(sys.bodies[0].v.y, expected.y, max_relative = 1e-12);
    assert_eq!(sys.bodies[0].f, f2);
}

#[test]
fn kdk_kicks_from_half_step_velocity() {
    let m = 1.0;
    let p = test_params();
    let mut literal = two_body_system(1.0, m, m);
    let mut kdk = literal.clone();

    let f1 = pairwise_force(p.G, p.eps, m, literal.bodies[0].x, m, literal.bodies[1].x);

    leapfrog_step(&mut literal, test_universe(), &p).unwrap();
    kick_drift_kick_step(&mut kdk, test_universe(), &p).unwrap();

    // same drift, the kdk velocity carries the extra first half kick
    assert_eq!(literal.bodies[0].x, kdk.bodies[0].x);
    let extra = kdk.bodies[0].v - literal.bodies[0].v;
    assert_relative_eq!(extra.x, (f1.x / m) * p.dt * 0.5, max_relative = 1e-9);
}

#[test]
fn kdk_keeps_circular_orbit_radius() {
    // light body on a circular orbit around a heavy one
    let big = 1000.0;
    let r = 1.0;
    let p = Parameters {
        G: 1.0,
        dt: 1e-4,
        theta: 0.5,
        ..test_params()
    };
    let speed = (p.G * big / r).sqrt();
    let mut sys = System::new(vec![
        Body::new(big, NVec2::zeros(), NVec2::zeros()),
        Body::new(1.0, NVec2::new(r, 0.0), NVec2::new(0.0, speed)),
    ]);
    let engine = Engine {
        integrator: IntegratorConfig::KickDriftKick,
        universe: Region::new(NVec2::zeros(), 8.0),
    };

    let radius = |s: &System| (s.bodies[1].x - s.bodies[0].x).norm();
    for _ in 0..2000 {
        advance(&mut sys, &engine, &p).unwrap();
    }

    assert_relative_eq!(radius(&sys), r, max_relative = 1e-2);
}

#[test]
fn momentum_of_isolated_pair_is_conserved() {
    let mut sys = two_body_system(1.0, 1.0, 4.0);
    sys.bodies[0].v = NVec2::new(0.0, 0.5);
    sys.bodies[1].v = NVec2::new(0.0, -0.125);
    let p = test_params();

    for _ in 0..100 {
        leapfrog_step(&mut sys, test_universe(), &p).unwrap();
    }

    let momentum = sys.total_momentum();
    assert!(momentum.norm() < 1e-12, "momentum drifted: {:?}", momentum);
}

// ==================================================================================
// Scenario tests
// ==================================================================================

#[test]
fn scenario_from_yaml_runs() {
    let text = r#"
engine:
  integrator: "leapfrog"
  theta: 1.25
parameters:
  dt: 0.25
  steps: 20
  eps: 25000.0
  G: 6.6743e-11
population:
  count: 120
  radius: 2.5e5
  min_mass: 1.5e14
  max_mass: 1.5e16
  min_velocity: -1500.0
  max_velocity: 1500.0
  seed: 500000
"#;
    let cfg = ScenarioConfig::from_yaml(text).unwrap();
    let mut scenario = Scenario::build_scenario(cfg).unwrap();
    let mass = scenario.system.total_mass();

    for _ in 0..scenario.parameters.steps {
        let stats = advance(&mut scenario.system, &scenario.engine, &scenario.parameters).unwrap();
        assert_eq!(stats.indexed + stats.excluded, 120);
    }

    assert_relative_eq!(scenario.system.t, 5.0);
    assert_eq!(scenario.system.total_mass(), mass);
    for b in &scenario.system.bodies {
        assert!(b.x.x.is_finite() && b.x.y.is_finite());
    }
}
