//! Paginates a gallery API, filters items against user thresholds and saves the
//! matching images/videos with their prompts, skipping URLs saved by earlier runs.

pub mod config;
pub mod engine;
pub mod network;
pub mod ops;
pub mod persistence;
pub mod refinery;
