pub mod states;
pub mod params;
pub mod engine;
pub mod error;
pub mod region;
pub mod forces;
pub mod barnes_hut;
pub mod integrator;
pub mod scenario;
