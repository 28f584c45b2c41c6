//! Chunk planning and manifest loading module

pub mod manifest;
pub mod strategy;

pub use manifest::load_manifest;
pub use strategy::ChunkPlanner;
