//! Square regions of the plane and their four quadrants.
//!
//! A [`Region`] is an axis-aligned square given by its center and side
//! length. Subdividing it yields four half-size squares, one per
//! [`Quadrant`], that tile the parent exactly.

use serde::Deserialize;

use crate::simulation::states::NVec2;

/// Quadrant identity of a sub-region
///
/// The declaration order is the order children are searched when a point
/// sits on a shared edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthEast,
        Quadrant::NorthWest,
        Quadrant::SouthEast,
        Quadrant::SouthWest,
    ];

    /// Slot of this quadrant in a node's child array
    pub fn index(self) -> usize {
        match self {
            Quadrant::NorthEast => 0,
            Quadrant::NorthWest => 1,
            Quadrant::SouthEast => 2,
            Quadrant::SouthWest => 3,
        }
    }

    /// Unit offset of the sub-region center from the parent center
    fn direction(self) -> (f64, f64) {
        match self {
            Quadrant::NorthEast => (1.0, 1.0),
            Quadrant::NorthWest => (-1.0, 1.0),
            Quadrant::SouthEast => (1.0, -1.0),
            Quadrant::SouthWest => (-1.0, -1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RegionConfig")]
pub struct Region {
    center: NVec2,
    length: f64, // side length
}

/// YAML shape of a region: `{ center: [x, y], length: l }`
#[derive(Deserialize)]
struct RegionConfig {
    center: [f64; 2],
    length: f64,
}

impl TryFrom<RegionConfig> for Region {
    type Error = String;

    fn try_from(cfg: RegionConfig) -> Result<Self, Self::Error> {
        if !(cfg.length > 0.0) || !cfg.length.is_finite() {
            return Err(format!("region length must be positive, got {}", cfg.length));
        }
        Ok(Region::new(NVec2::new(cfg.center[0], cfg.center[1]), cfg.length))
    }
}

impl Region {
    pub fn new(center: NVec2, length: f64) -> Self {
        Self { center, length }
    }

    pub fn center(&self) -> NVec2 {
        self.center
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// True iff `point` lies in the closed square `[center - l/2, center + l/2]²`
    pub fn contains(&self, point: &NVec2) -> bool {
        let (lower, upper) = self.bounds();

        lower.x <= point.x && point.x <= upper.x && lower.y <= point.y && point.y <= upper.y
    }

    /// The sub-region covering `quadrant`: half the side length, center moved
    /// a quarter of the side length along each axis
    pub fn quadrant(&self, quadrant: Quadrant) -> Region {
        let half = self.length / 2.0;
        let quarter = half / 2.0;
        let (dx, dy) = quadrant.direction();

        Region {
            center: NVec2::new(self.center.x + dx * quarter, self.center.y + dy * quarter),
            length: half,
        }
    }

    /// The quadrant a point belongs to, decided against the center only.
    ///
    /// `x >= center.x` is east and `y >= center.y` is north, so a point on a
    /// shared edge goes to the first candidate in [`Quadrant::ALL`] order.
    /// Every point of the parent maps to some quadrant, even where the
    /// rounded child squares leave a sliver at the parent's border.
    pub fn quadrant_of(&self, point: &NVec2) -> Quadrant {
        match (point.x >= self.center.x, point.y >= self.center.y) {
            (true, true) => Quadrant::NorthEast,
            (false, true) => Quadrant::NorthWest,
            (true, false) => Quadrant::SouthEast,
            (false, false) => Quadrant::SouthWest,
        }
    }

    /// All four sub-regions, in [`Quadrant::ALL`] order
    pub fn subdivide(&self) -> [(Quadrant, Region); 4] {
        Quadrant::ALL.map(|q| (q, self.quadrant(q)))
    }

    /// Corners `(min, max)` of the square
    pub fn bounds(&self) -> (NVec2, NVec2) {
        let half = NVec2::new(self.length / 2.0, self.length / 2.0);
        (self.center - half, self.center + half)
    }
}
