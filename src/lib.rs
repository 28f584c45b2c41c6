//! splitvault library
//!
//! Splits a video into time-bounded segments with an external transcoder and
//! keeps an encrypted-at-rest copy of every segment.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod output;
pub mod planner;
pub mod ports;
pub mod probe;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{ChunkPlan, ChunkStrategy, MediaMeta, Password, Segment, SplitRequest};
