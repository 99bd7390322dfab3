//! High-level runtime engine settings
//!
//! Selects the integration scheme and the universe region the spatial
//! index is built over each frame

use crate::configuration::config::IntegratorConfig;
use crate::simulation::region::Region;

#[derive(Debug, Clone)]
pub struct Engine {
    pub integrator: IntegratorConfig, // leapfrog or kdk
    pub universe: Region, // bodies outside are excluded from the tree
}
