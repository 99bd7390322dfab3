//! # Barnes–Hut Quadtree (2D)
//!
//! This module implements the **2D Barnes–Hut quadtree** used to approximate
//! the gravitational force on every body of an `N`-body system in roughly
//! `O(N log N)` instead of the `O(N²)` all-pairs sum.
//!
//! ## Core Concepts
//!
//! - The universe square is recursively split into four quadrants
//!   (north-east, north-west, south-east, south-west).
//! - Each square is a node of the tree. A node is one of
//!   - `Empty`: nothing has been inserted here yet,
//!   - `Leaf`: exactly one real body lives here,
//!   - `Internal`: four children plus an *aggregate* body holding the total
//!     mass, center of mass and mass-weighted velocity of its subtree.
//! - Far-away internal nodes stand in for all of their bodies during force
//!   evaluation; the opening angle `theta` decides what "far" means.
//!
//! ## Storage
//!
//! Nodes live in a flat arena (`Vec<IndexNode>`) and refer to their children
//! by index. Leaves refer to bodies by their index in the live body slice, so
//! a leaf always sees the body's *current* position even if the body moved
//! after the tree was built. Aggregates are snapshots taken at insertion
//! time. A tree is built for a single frame and then dropped or reset.

use log::debug;

use crate::simulation::error::IndexError;
use crate::simulation::params::Parameters;
use crate::simulation::region::{Quadrant, Region};
use crate::simulation::states::{Body, NVec2};

/// What a node currently holds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// No body inserted yet
    Empty,
    /// A single real body, by index into the body slice
    Leaf(usize),
    /// Aggregate of the subtree and one child per quadrant, indexed by
    /// [`Quadrant::index`]
    Internal { aggregate: Body, children: [usize; 4] },
}

/// One square of the quadtree
#[derive(Debug, Clone)]
pub struct IndexNode {
    pub region: Region,
    pub kind: NodeKind,
    pub depth: usize, // root is 0
}

impl IndexNode {
    fn new(region: Region, depth: usize) -> Self {
        Self {
            region,
            kind: NodeKind::Empty,
            depth,
        }
    }

    /// A node is a leaf iff it has no children
    pub fn is_leaf(&self) -> bool {
        !matches!(self.kind, NodeKind::Internal { .. })
    }

    pub fn children(&self) -> Option<[usize; 4]> {
        match self.kind {
            NodeKind::Internal { children, .. } => Some(children),
            NodeKind::Empty | NodeKind::Leaf(_) => None,
        }
    }

    pub fn child(&self, quadrant: Quadrant) -> Option<usize> {
        self.children().map(|c| c[quadrant.index()])
    }

    /// The body occupying this node: the real body for a leaf (resolved
    /// through `bodies`), the aggregate for an internal node
    pub fn body<'a>(&'a self, bodies: &'a [Body]) -> Option<&'a Body> {
        match &self.kind {
            NodeKind::Empty => None,
            NodeKind::Leaf(i) => bodies.get(*i),
            NodeKind::Internal { aggregate, .. } => Some(aggregate),
        }
    }

    /// Fold `body` into this node's aggregate; no-op unless internal
    fn absorb(&mut self, body: &Body) {
        if let NodeKind::Internal { aggregate, .. } = &mut self.kind {
            *aggregate = aggregate.combine_as_center_of_mass(Some(body));
        }
    }
}

/// A complete quadtree built over the universe region for one frame.
///
/// This structure owns:
/// - the node arena (`nodes`), whose first entry is the root
/// - the number of insertions performed (`size`)
/// - the depth bound past which insertion fails (`max_depth`)
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    nodes: Vec<IndexNode>,
    root: usize,
    size: usize,
    max_depth: usize,
}

impl SpatialIndex {
    /// An empty index whose root covers `universe`.
    pub fn new(universe: Region, max_depth: usize) -> Self {
        Self {
            nodes: vec![IndexNode::new(universe, 0)],
            root: 0,
            size: 0,
            max_depth,
        }
    }

    /// Build a quadtree over `universe` from the current state of `bodies`.
    ///
    /// Every body whose position lies inside `universe` is inserted in slice
    /// order; bodies outside it are skipped and take no part in this tree.
    ///
    /// # Errors
    /// [`IndexError::MaxDepthExceeded`] if two bodies are too close to be
    /// separated within `max_depth` subdivisions.
    pub fn build(universe: Region, bodies: &[Body], max_depth: usize) -> Result<Self, IndexError> {
        let mut index = Self::new(universe, max_depth);
        index.populate(bodies)?;
        Ok(index)
    }

    /// Drop every node but a fresh root and insert `bodies` again.
    ///
    /// The arena keeps its allocation, so rebuilding each frame does not
    /// free and reallocate nodes one by one.
    pub fn rebuild(&mut self, bodies: &[Body]) -> Result<(), IndexError> {
        let universe = self.universe();
        self.nodes.clear();
        self.nodes.push(IndexNode::new(universe, 0));
        self.root = 0;
        self.size = 0;
        self.populate(bodies)
    }

    fn populate(&mut self, bodies: &[Body]) -> Result<(), IndexError> {
        let universe = self.universe();
        let mut excluded = 0;

        for (i, b) in bodies.iter().enumerate() {
            if universe.contains(&b.x) {
                self.insert(i, bodies)?;
            } else {
                excluded += 1;
            }
        }

        debug!(
            "quadtree built: {} bodies, {} excluded, {} nodes, depth {}",
            self.size,
            excluded,
            self.nodes.len(),
            self.depth()
        );
        Ok(())
    }

    /// Insert body `body_idx` of `bodies` into the tree.
    ///
    /// Callers must only insert bodies inside the universe region; see
    /// [`SpatialIndex::build`], which filters for them.
    pub fn insert(&mut self, body_idx: usize, bodies: &[Body]) -> Result<(), IndexError> {
        self.insert_at(self.root, body_idx, bodies)?;
        self.size += 1;
        Ok(())
    }

    /// Compute the approximate force on body `target` and add it to that
    /// body's accumulator.
    ///
    /// The tree itself is not modified. The accumulator is *added to*, so it
    /// must be reset before a fresh evaluation pass.
    ///
    /// # Returns
    /// The number of force-law evaluations (exact leaf interactions plus
    /// accepted aggregates) this traversal performed.
    pub fn apply_forces(&self, target: usize, bodies: &mut [Body], params: &Parameters) -> usize {
        let mut probe = bodies[target].clone();
        let interactions = self.apply_forces_at(self.root, target, &mut probe, bodies, params);
        bodies[target].f = probe.f;
        interactions
    }

    /// Net approximate force on body `target`, without touching any accumulator.
    pub fn force_on(&self, target: usize, bodies: &[Body], params: &Parameters) -> NVec2 {
        let mut probe = bodies[target].clone();
        probe.reset_force();
        self.apply_forces_at(self.root, target, &mut probe, bodies, params);
        probe.f
    }

    /// Number of insertions performed
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest node (0 for a lone root)
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn root(&self) -> &IndexNode {
        &self.nodes[self.root]
    }

    pub fn node(&self, idx: usize) -> Option<&IndexNode> {
        self.nodes.get(idx)
    }

    pub fn nodes(&self) -> &[IndexNode] {
        &self.nodes
    }

    pub fn universe(&self) -> Region {
        self.nodes[self.root].region
    }

    /// Every node's square, root first; what a region-outline renderer draws
    pub fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.nodes.iter().map(|n| &n.region)
    }

    // helpers ==============================================================================

    /// Insert a body into the subtree rooted at `node_idx`.
    ///
    /// - `Empty` node: the body is stored here and becomes a leaf.
    /// - `Leaf` holding body `b`: the square is split into four empty
    ///   children, the node's body becomes `b` combined with the new body,
    ///   and both `b` and the new body are pushed down into the child whose
    ///   square contains them.
    /// - `Internal` node: the new body is folded into the aggregate and
    ///   pushed down into the matching child.
    fn insert_at(&mut self, node_idx: usize, body_idx: usize, bodies: &[Body]) -> Result<(), IndexError> {
        let body = &bodies[body_idx];

        match self.nodes[node_idx].kind {
            NodeKind::Empty => {
                self.nodes[node_idx].kind = NodeKind::Leaf(body_idx);
                Ok(())
            }
            NodeKind::Leaf(existing) => {
                let depth = self.nodes[node_idx].depth;
                if depth >= self.max_depth {
                    return Err(IndexError::MaxDepthExceeded {
                        depth: depth + 1,
                        position: body.x,
                    });
                }

                let aggregate = bodies[existing].combine_as_center_of_mass(Some(body));
                let children = self.subdivide(node_idx);
                self.nodes[node_idx].kind = NodeKind::Internal { aggregate, children };

                self.insert_in_quadrant(node_idx, children, existing, bodies)?;
                self.insert_in_quadrant(node_idx, children, body_idx, bodies)
            }
            NodeKind::Internal { children, .. } => {
                self.nodes[node_idx].absorb(body);
                self.insert_in_quadrant(node_idx, children, body_idx, bodies)
            }
        }
    }

    /// Recurse into the child whose quadrant holds the body.
    ///
    /// The quadrant is chosen against the parent's center (see
    /// [`Region::quadrant_of`]), so every body inside the parent lands in
    /// exactly one child.
    fn insert_in_quadrant(&mut self, node_idx: usize, children: [usize; 4], body_idx: usize, bodies: &[Body]) -> Result<(), IndexError> {
        let quadrant = self.nodes[node_idx].region.quadrant_of(&bodies[body_idx].x);
        self.insert_at(children[quadrant.index()], body_idx, bodies)
    }

    /// Push four empty children covering the quadrants of `node_idx` and
    /// return their arena indices in [`Quadrant::index`] order.
    fn subdivide(&mut self, node_idx: usize) -> [usize; 4] {
        let region = self.nodes[node_idx].region;
        let depth = self.nodes[node_idx].depth + 1;
        let mut children = [0; 4];

        for (quadrant, sub) in region.subdivide() {
            children[quadrant.index()] = self.nodes.len();
            self.nodes.push(IndexNode::new(sub, depth));
        }

        children
    }

    /// Recursively accumulate the force on `target` from the subtree at
    /// `node_idx` into `acc`, a working copy of the target body.
    ///
    /// - `Empty` node, or a leaf holding `target` itself: no contribution.
    /// - `Leaf`: exact pairwise force with the stored body.
    /// - `Internal`: with `s` the square's side and `d` the distance from the
    ///   target to the aggregate, if `s / d < theta` the aggregate is used as a
    ///   single mass; otherwise each child is visited.
    fn apply_forces_at(&self, node_idx: usize, target: usize, acc: &mut Body, bodies: &[Body], params: &Parameters) -> usize {
        let node = &self.nodes[node_idx];

        match &node.kind {
            NodeKind::Empty => 0,
            NodeKind::Leaf(i) => {
                if *i == target {
                    return 0; // don't self-interact
                }
                acc.apply_force(&bodies[*i], params);
                1
            }
            NodeKind::Internal { aggregate, children } => {
                let length = node.region.length();
                let distance = acc.distance_to(aggregate);

                if length / distance < params.theta {
                    acc.apply_force(aggregate, params);
                    1
                } else {
                    let mut interactions = 0;
                    for quadrant in Quadrant::ALL {
                        interactions += self.apply_forces_at(children[quadrant.index()], target, acc, bodies, params);
                    }
                    interactions
                }
            }
        }
    }
}
