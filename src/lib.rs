pub mod constants;
pub mod engine;
pub mod navigation;
pub mod powerups;
pub mod rng;
pub mod types;
pub mod world;
