pub mod assistant;
pub mod candidate;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod index;
pub mod logging;
pub mod normalize;
pub mod ranking;
pub mod tables;
pub mod tags;
